//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use std::path::PathBuf;

/// Expands a leading `~/` in `file_path` to the user's home directory.
///
/// Paths without a leading `~`, or on systems where no home directory can be
/// determined, are returned unchanged.
pub(crate) fn expand_user_home(file_path: &str) -> String {
    if file_path.starts_with("~/") || file_path.starts_with("~\\") {
        if let Some(home_dir) = dirs::home_dir() {
            let full_path = home_dir.join(PathBuf::from(correct_path(&file_path[2..])));
            return format!("{}", full_path.display());
        }
    }
    file_path.to_string()
}

fn correct_path(file_path: &str) -> String {
    if cfg!(target_os = "windows") {
        file_path.replace('/', "\\")
    } else {
        file_path.to_string()
    }
}
