//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
pub(crate) mod config_file_credentials;
pub mod credentials;
pub(crate) mod file_utils;
