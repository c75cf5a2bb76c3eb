//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::dataset::Dataset;
use crate::error::{ia_err, SocrataError, SocrataErrorCode};
use crate::handle::Handle;
use crate::request_descriptor::{path_segment, RequestDescriptor};
use crate::types::{Record, Submitted, View};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::result::Result;
use tracing::debug;

fn view_from(v: Value) -> Result<View, SocrataError> {
    Ok(View::from_record(Record::from_json_object(v)?))
}

/// Struct used for creating a new, empty dataset.
///
/// The dataset is public unless [`public(false)`](CreateDatasetRequest::public()) is given.
#[derive(Debug, Clone)]
pub struct CreateDatasetRequest {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) tags: Vec<String>,
    pub(crate) public: bool,
}

impl CreateDatasetRequest {
    /// Create a new `CreateDatasetRequest`.
    ///
    /// `name` is required and must be non-empty.
    pub fn new(name: &str) -> CreateDatasetRequest {
        CreateDatasetRequest {
            name: name.to_string(),
            description: String::new(),
            tags: Vec::new(),
            public: true,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub(crate) fn body(&self) -> Value {
        let mut v = json!({
            "name": self.name,
            "description": self.description,
        });
        if !self.tags.is_empty() {
            v["tags"] = json!(self.tags);
        }
        // no flags means private
        if self.public {
            v["flags"] = json!(["dataPublic"]);
        }
        v
    }

    /// Execute the request.
    ///
    /// Run directly, this returns a [`Dataset`] attached to the new dataset.
    /// Inside a batch, the request is queued, and the new dataset's metadata is
    /// found in the [`BatchResult`](crate::BatchResult) at the returned index.
    pub async fn execute(&self, h: &Handle) -> Result<Submitted<Dataset>, SocrataError> {
        if self.name.is_empty() {
            return ia_err!("dataset name must not be empty");
        }
        let s = h
            .dispatch(RequestDescriptor::post("/views.json", &self.body()))
            .await?;
        s.try_map(|v| -> Result<Dataset, SocrataError> {
            let ds = Dataset::from_view(view_from(v)?)?;
            debug!("Created dataset '{}': {:?}", self.name, ds.id());
            Ok(ds)
        })
    }
}

/// Struct used for creating a new dataset by importing a file.
///
/// Imports upload the file, so they cannot be part of a batch.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub(crate) file: PathBuf,
}

impl ImportRequest {
    pub fn new(file: &Path) -> ImportRequest {
        ImportRequest {
            file: file.to_path_buf(),
        }
    }

    /// Execute the request, returning a [`Dataset`] attached to the imported dataset.
    pub async fn execute(&self, h: &Handle) -> Result<Dataset, SocrataError> {
        let v = h
            .post_file("import a file", "/imports", &self.file, None)
            .await?;
        let view = view_from(v)?;
        let ds = Dataset::from_view(view).map_err(|e| {
            SocrataError::new(
                SocrataErrorCode::InvalidResponse,
                &format!("import did not return a valid dataset id: {}", e.message),
            )
        })?;
        debug!(
            "Imported dataset: '{}' ({:?})",
            ds.view().and_then(|v| v.name()).unwrap_or_default(),
            ds.id()
        );
        Ok(ds)
    }
}

/// Struct used for listing the datasets owned by a user.
///
/// Results can be filtered by tag on the client side.
#[derive(Debug, Clone, Default)]
pub struct FindViewsRequest {
    pub(crate) user: String,
    pub(crate) tag: Option<String>,
    pub(crate) ignore_tag: Option<String>,
}

impl FindViewsRequest {
    /// Create a new `FindViewsRequest` for the user with ID or login `user`.
    pub fn new(user: &str) -> FindViewsRequest {
        FindViewsRequest {
            user: user.to_string(),
            ..Default::default()
        }
    }

    /// Only return views carrying this tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Leave out views carrying this tag.
    pub fn ignore_tag(mut self, tag: &str) -> Self {
        self.ignore_tag = Some(tag.to_string());
        self
    }

    pub(crate) fn keep(&self, v: &View) -> bool {
        if let Some(t) = &self.tag {
            if !v.has_tag(t) {
                return false;
            }
        }
        if let Some(t) = &self.ignore_tag {
            if v.has_tag(t) {
                return false;
            }
        }
        true
    }

    pub async fn execute(&self, h: &Handle) -> Result<Vec<View>, SocrataError> {
        if self.user.is_empty() {
            return ia_err!("user must not be empty");
        }
        let path = format!("/users/{}/views.json", path_segment(&self.user));
        let views = match h.execute(&RequestDescriptor::get(&path)).await? {
            Value::Array(a) => a,
            other => {
                return Err(SocrataError::new(
                    SocrataErrorCode::InvalidResponse,
                    &format!("expected an array of views, got: {}", other),
                ))
            }
        };
        let mut results = Vec::new();
        for v in views {
            let view = view_from(v)?;
            if self.keep(&view) {
                results.push(view);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_body() {
        let r = CreateDatasetRequest::new("Nominations");
        assert_eq!(
            r.body(),
            json!({"name": "Nominations", "description": "", "flags": ["dataPublic"]})
        );
        let r = CreateDatasetRequest::new("Private")
            .description("not for you")
            .tags(&["a", "b"])
            .public(false);
        assert_eq!(
            r.body(),
            json!({"name": "Private", "description": "not for you", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_find_filters() {
        let tagged = |tags: Value| View::from_record(Record::new().column("tags", tags));
        let r = FindViewsRequest::new("someone").tag("twitter").ignore_tag("old");
        assert!(r.keep(&tagged(json!(["twitter"]))));
        assert!(!r.keep(&tagged(json!(["twitter", "old"]))));
        assert!(!r.keep(&tagged(json!(["other"]))));
        assert!(!r.keep(&View::default()));
        assert!(FindViewsRequest::new("someone").keep(&View::default()));
    }
}
