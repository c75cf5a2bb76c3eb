//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use serde_derive::Serialize;
use std::fmt;

/// HTTP method of a single API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequestMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one API operation: method, API-relative path and optional JSON body.
///
/// The body is encoded when the descriptor is built, so a queued descriptor
/// captures the caller's data at call time. Descriptors are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDescriptor {
    #[serde(rename = "url")]
    target_path: String,
    #[serde(rename = "requestType")]
    method: RequestMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl RequestDescriptor {
    pub fn new(method: RequestMethod, target_path: &str) -> RequestDescriptor {
        RequestDescriptor {
            target_path: target_path.to_string(),
            method,
            body: None,
        }
    }

    /// Create a descriptor whose body is the JSON encoding of `body`.
    pub fn with_json(
        method: RequestMethod,
        target_path: &str,
        body: &serde_json::Value,
    ) -> RequestDescriptor {
        RequestDescriptor {
            target_path: target_path.to_string(),
            method,
            body: Some(body.to_string()),
        }
    }

    pub fn get(target_path: &str) -> RequestDescriptor {
        Self::new(RequestMethod::Get, target_path)
    }

    pub fn post(target_path: &str, body: &serde_json::Value) -> RequestDescriptor {
        Self::with_json(RequestMethod::Post, target_path, body)
    }

    pub fn put(target_path: &str, body: &serde_json::Value) -> RequestDescriptor {
        Self::with_json(RequestMethod::Put, target_path, body)
    }

    pub fn delete(target_path: &str) -> RequestDescriptor {
        Self::new(RequestMethod::Delete, target_path)
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The already-encoded JSON body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Percent-encode `s` for use as a single path segment.
pub(crate) fn path_segment(s: &str) -> String {
    // byte_serialize writes a space as '+' and a literal '+' as %2B
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
