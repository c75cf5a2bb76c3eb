//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use base64::prelude::{Engine as _, BASE64_STANDARD};
use std::fmt;

/// Username and password sent with every request using HTTP basic authentication.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    // value for the Authorization header
    pub(crate) fn basic_auth_header(&self) -> String {
        let up = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64_STANDARD.encode(up))
    }
}

// Keep passwords out of debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}
