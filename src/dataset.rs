//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::column::ColumnSpec;
use crate::error::{ia_err, SocrataError, SocrataErrorCode};
use crate::handle::Handle;
use crate::request_descriptor::{RequestDescriptor, RequestMethod};
use crate::row_query::{map_rows, RowQuery};
use crate::types::{Attachment, FourFour, Record, Submitted, View};
use serde_json::{json, Value};
use std::path::Path;
use std::result::Result;
use tracing::debug;

pub(crate) const DEFAULT_LINK_NAME: &str = "Socrata-Dataset";
pub(crate) const DEFAULT_EMBED_WIDTH: u32 = 500;
pub(crate) const DEFAULT_EMBED_HEIGHT: u32 = 425;
const EMPTY_FILE_NAME: &str = "empty_file.csv";

/// A local reference to a remote dataset.
///
/// A `Dataset` is plain data: it holds the dataset's ID and, once fetched, its
/// metadata. Every operation takes the [`Handle`] to run on, so operations issued
/// inside [`Handle::with_batch()`] are queued into that handle's batch.
///
/// Operations that need a dataset ID fail with
/// [`SocrataErrorCode::NotAttached`] on a dataset that is not attached, before
/// anything is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub(crate) attachment: Attachment,
    pub(crate) view: Option<View>,
}

fn record(v: Value) -> Result<Record, SocrataError> {
    Record::from_json_object(v)
}

fn records(v: Value, what: &str) -> Result<Vec<Record>, SocrataError> {
    match v {
        Value::Array(a) => a.into_iter().map(record).collect(),
        other => Err(SocrataError::new(
            SocrataErrorCode::InvalidResponse,
            &format!("expected an array of {}, got: {}", what, other),
        )),
    }
}

fn check_row_id(row_id: &str) -> Result<(), SocrataError> {
    if row_id.is_empty() || row_id.contains('/') || row_id.contains('?') {
        return ia_err!("invalid row id '{}'", row_id);
    }
    Ok(())
}

impl Dataset {
    /// Create a dataset that is not attached to any remote dataset.
    pub fn new() -> Dataset {
        Default::default()
    }

    /// Create a dataset attached to the remote dataset `id`, without fetching anything.
    pub fn attached(id: FourFour) -> Dataset {
        Dataset {
            attachment: Attachment::Attached(id),
            view: None,
        }
    }

    /// Create a dataset from fetched metadata. The view must carry a valid ID.
    pub fn from_view(view: View) -> Result<Dataset, SocrataError> {
        let id = match view.id() {
            Some(id) => FourFour::parse(id)?,
            None => {
                return Err(SocrataError::new(
                    SocrataErrorCode::InvalidResponse,
                    "view metadata has no id",
                ))
            }
        };
        Ok(Dataset {
            attachment: Attachment::Attached(id),
            view: Some(view),
        })
    }

    /// Fetch the metadata of dataset `id` and return a dataset attached to it.
    pub async fn open(h: &Handle, id: &str) -> Result<Dataset, SocrataError> {
        let id = FourFour::parse(id)?;
        let view = h.view(&id).await?;
        debug!("Working on existing dataset: id {}", id);
        Ok(Dataset {
            attachment: Attachment::Attached(id),
            view: Some(view),
        })
    }

    /// Attach to the remote dataset `id`. Any previously fetched metadata is dropped.
    pub fn attach(&mut self, id: &str) -> Result<(), SocrataError> {
        let id = FourFour::parse(id)?;
        debug!("Working on existing dataset: id {}", id);
        self.attachment = Attachment::Attached(id);
        self.view = None;
        Ok(())
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_attached()
    }

    pub fn id(&self) -> Option<&FourFour> {
        self.attachment.id()
    }

    /// Metadata from the last [`open()`](Dataset::open()) or
    /// [`refresh()`](Dataset::refresh()), if any.
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    /// Re-read the dataset's metadata from the service.
    pub async fn refresh(&mut self, h: &Handle) -> Result<&View, SocrataError> {
        let id = self.attachment.require("refresh dataset")?;
        let view = h.view(id).await?;
        Ok(self.view.insert(view))
    }

    /// Get the rows of the dataset as the service returns them: the view's
    /// metadata under `meta` and rows as arrays of values under `data`.
    pub async fn raw_rows(&self, h: &Handle, query: &RowQuery) -> Result<Value, SocrataError> {
        let id = self.attachment.require("get rows")?;
        h.execute(&RequestDescriptor::get(&query.path(id.as_str())))
            .await
    }

    /// Get the rows of the dataset, one [`Record`] per row.
    ///
    /// Fields are named by the column property selected with
    /// [`RowQuery::key_by()`], and every row also carries its ID in the
    /// [`ROW_ID_FIELD`](crate::ROW_ID_FIELD) field.
    pub async fn rows(&self, h: &Handle, query: &RowQuery) -> Result<Vec<Record>, SocrataError> {
        let raw = self.raw_rows(h, query).await?;
        map_rows(&raw, &query.key)
    }

    pub async fn get_row(&self, h: &Handle, row_id: &str) -> Result<Record, SocrataError> {
        let id = self.attachment.require("get row")?;
        check_row_id(row_id)?;
        let path = format!("/views/{}/rows/{}.json", id, row_id);
        record(h.execute(&RequestDescriptor::get(&path)).await?)
    }

    /// Get the column definitions of the dataset.
    pub async fn columns(&self, h: &Handle) -> Result<Vec<Record>, SocrataError> {
        let id = self.attachment.require("get columns")?;
        let path = format!("/views/{}/columns.json", id);
        records(h.execute(&RequestDescriptor::get(&path)).await?, "columns")
    }

    /// Whether the dataset has any user-visible columns.
    ///
    /// Every dataset has a hidden tags column, so this is true only if there is
    /// more than one column.
    pub async fn has_columns(&self, h: &Handle) -> Result<bool, SocrataError> {
        Ok(self.columns(h).await?.len() > 1)
    }

    /// Add a row. Fields are keyed by column name.
    pub async fn add_row(
        &self,
        h: &Handle,
        row: &Record,
    ) -> Result<Submitted<Record>, SocrataError> {
        let id = self.attachment.require("add row")?;
        let path = format!("/views/{}/rows.json", id);
        h.dispatch(RequestDescriptor::post(&path, &row.to_json()))
            .await?
            .try_map(record)
    }

    pub async fn update_row(
        &self,
        h: &Handle,
        row_id: &str,
        row: &Record,
    ) -> Result<Submitted<Record>, SocrataError> {
        let id = self.attachment.require("update row")?;
        check_row_id(row_id)?;
        let path = format!("/views/{}/rows/{}.json", id, row_id);
        h.dispatch(RequestDescriptor::put(&path, &row.to_json()))
            .await?
            .try_map(record)
    }

    pub async fn delete_row(
        &self,
        h: &Handle,
        row_id: &str,
    ) -> Result<Submitted<()>, SocrataError> {
        let id = self.attachment.require("delete row")?;
        check_row_id(row_id)?;
        let path = format!("/views/{}/rows/{}.json", id, row_id);
        Ok(h.dispatch(RequestDescriptor::delete(&path)).await?.map(|_| ()))
    }

    /// Add a column. Returns the created column definition.
    pub async fn add_column(
        &self,
        h: &Handle,
        column: &ColumnSpec,
    ) -> Result<Submitted<Record>, SocrataError> {
        let id = self.attachment.require("add column")?;
        let body = column.to_json()?;
        debug!(
            "Creating column '{}' of type '{}'",
            column.name,
            column.column_type.type_name()
        );
        let path = format!("/views/{}/columns.json", id);
        h.dispatch(RequestDescriptor::post(&path, &body))
            .await?
            .try_map(record)
    }

    /// Make the dataset publicly readable, or private.
    pub async fn set_public(
        &self,
        h: &Handle,
        public: bool,
    ) -> Result<Submitted<()>, SocrataError> {
        let id = self.attachment.require("set permission")?;
        let value = if public { "public.read" } else { "private" };
        let path = format!("/views/{}?method=setPermission&value={}", id, value);
        // a GET that changes state, so it is queued like any other write
        let desc = RequestDescriptor::new(RequestMethod::Get, &path);
        Ok(h.dispatch(desc).await?.map(|_| ()))
    }

    async fn put_metadata(
        &self,
        h: &Handle,
        operation: &str,
        body: Value,
    ) -> Result<Submitted<View>, SocrataError> {
        let id = self.attachment.require(operation)?;
        let path = format!("/views/{}", id);
        h.dispatch(RequestDescriptor::put(&path, &body))
            .await?
            .try_map(|v| record(v).map(View::from_record))
    }

    pub async fn set_description(
        &self,
        h: &Handle,
        description: &str,
    ) -> Result<Submitted<View>, SocrataError> {
        self.put_metadata(h, "set description", json!({ "description": description }))
            .await
    }

    pub async fn set_tags(
        &self,
        h: &Handle,
        tags: &[&str],
    ) -> Result<Submitted<View>, SocrataError> {
        self.put_metadata(h, "set tags", json!({ "tags": tags })).await
    }

    /// Set the attribution text and link of the dataset.
    pub async fn set_attribution(
        &self,
        h: &Handle,
        attribution: &str,
        link: &str,
    ) -> Result<Submitted<View>, SocrataError> {
        self.put_metadata(
            h,
            "set attribution",
            json!({ "attributionLink": link, "attribution": attribution }),
        )
        .await
    }

    /// Delete the remote dataset.
    ///
    /// When the delete runs immediately, this dataset becomes
    /// [`NotAttached`](Attachment::NotAttached). A delete queued in a batch leaves
    /// it attached, as the batch may still fail.
    pub async fn delete(&mut self, h: &Handle) -> Result<Submitted<()>, SocrataError> {
        let id = self.attachment.require("delete dataset")?;
        let path = format!("/views/{}", id);
        let s = h.dispatch(RequestDescriptor::delete(&path)).await?;
        if !s.is_queued() {
            debug!("Deleted dataset {}", id);
            self.attachment = Attachment::NotAttached;
            self.view = None;
        }
        Ok(s.map(|_| ()))
    }

    /// Upload a file, such as an image, for use in the dataset's rows.
    ///
    /// Returns the ID the service assigned to the file. Not available inside a batch.
    pub async fn upload_file(&self, h: &Handle, file: &Path) -> Result<String, SocrataError> {
        let id = self.attachment.require("upload file")?;
        let path = format!("/views/{}/files.txt", id);
        let v = h.post_file("upload a file", &path, file, None).await?;
        match v.get("file").and_then(|f| f.as_str()) {
            Some(f) => Ok(f.to_string()),
            None => Err(SocrataError::new(
                SocrataErrorCode::InvalidResponse,
                &format!("file upload response has no file id: {}", v),
            )),
        }
    }

    async fn bulk_rows(
        &self,
        h: &Handle,
        method: &str,
        file: &Path,
        skip_headers: bool,
    ) -> Result<Value, SocrataError> {
        let id = self.attachment.require(method)?;
        let path = format!(
            "/views/{}/rows?method={}&skip_headers={}",
            id, method, skip_headers
        );
        h.post_file(&format!("{} rows", method), &path, file, None)
            .await
    }

    /// Append the rows of a CSV file to the dataset. Not available inside a batch.
    pub async fn append(
        &self,
        h: &Handle,
        file: &Path,
        skip_headers: bool,
    ) -> Result<Value, SocrataError> {
        self.bulk_rows(h, "append", file, skip_headers).await
    }

    /// Replace all rows of the dataset with the rows of a CSV file. Not available
    /// inside a batch.
    pub async fn replace(
        &self,
        h: &Handle,
        file: &Path,
        skip_headers: bool,
    ) -> Result<Value, SocrataError> {
        self.bulk_rows(h, "replace", file, skip_headers).await
    }

    /// Delete all rows of the dataset. Not available inside a batch.
    pub async fn truncate(&self, h: &Handle) -> Result<Value, SocrataError> {
        let id = self.attachment.require("truncate")?;
        h.ensure_not_batching("truncate")?;
        let path = format!("/views/{}/rows?method=replace", id);
        h.post_multipart(&path, EMPTY_FILE_NAME, Vec::new()).await
    }

    /// Link to the dataset on the public site.
    ///
    /// `name` is the readable part of the link, `Socrata-Dataset` if not given.
    pub fn link_url(
        &self,
        h: &Handle,
        category: &str,
        name: Option<&str>,
    ) -> Result<String, SocrataError> {
        let id = self.attachment.require("build link")?;
        Ok(format!(
            "{}/{}/{}/{}",
            h.public_host(),
            category,
            name.unwrap_or(DEFAULT_LINK_NAME),
            id
        ))
    }

    pub fn short_url(&self, h: &Handle) -> Result<String, SocrataError> {
        let id = self.attachment.require("build link")?;
        Ok(format!("{}/d/{}", h.public_host(), id))
    }

    /// HTML to embed a widget showing the dataset. Sizes are in pixels; the
    /// defaults are 500 by 425.
    pub fn embed_code(
        &self,
        h: &Handle,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<String, SocrataError> {
        let id = self.attachment.require("build embed code")?;
        Ok(format!(
            "<iframe width=\"{}px\" height=\"{}px\" src=\"{}/widgets/{}\" frameborder=\"0\" scrolling=\"no\"></iframe>",
            width.unwrap_or(DEFAULT_EMBED_WIDTH),
            height.unwrap_or(DEFAULT_EMBED_HEIGHT),
            h.public_host(),
            id
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    async fn handle() -> Handle {
        Handle::builder()
            .public_host("https://data.example.com")
            .unwrap()
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_not_attached_fails_up_front() {
        let h = handle().await;
        let ds = Dataset::new();
        let err = ds.add_row(&h, &Record::new()).await.unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::NotAttached);
        assert!(err.message.contains("add row"));
        let err = ds.short_url(&h).unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::NotAttached);
        let err = ds.truncate(&h).await.unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::NotAttached);
    }

    #[tokio::test]
    async fn test_urls() {
        let h = handle().await;
        let ds = Dataset::attached(FourFour::parse("n5m4-mism").unwrap());
        assert_eq!(
            ds.link_url(&h, "Government", None).unwrap(),
            "https://data.example.com/Government/Socrata-Dataset/n5m4-mism"
        );
        assert_eq!(
            ds.link_url(&h, "Fun", Some("Tweets")).unwrap(),
            "https://data.example.com/Fun/Tweets/n5m4-mism"
        );
        assert_eq!(ds.short_url(&h).unwrap(), "https://data.example.com/d/n5m4-mism");
        assert_eq!(
            ds.embed_code(&h, None, Some(300)).unwrap(),
            "<iframe width=\"500px\" height=\"300px\" src=\"https://data.example.com/widgets/n5m4-mism\" frameborder=\"0\" scrolling=\"no\"></iframe>"
        );
    }

    #[test]
    fn test_attach() {
        let mut ds = Dataset::new();
        assert!(!ds.is_attached());
        assert!(ds.attach("not an id").is_err());
        assert!(!ds.is_attached());
        ds.attach("abcd-1234").unwrap();
        assert_eq!(ds.id().map(|i| i.as_str()), Some("abcd-1234"));

        let v = View::from_record(Record::new().column("name", "no id"));
        assert_eq!(
            Dataset::from_view(v).unwrap_err().code,
            SocrataErrorCode::InvalidResponse
        );
    }

    #[test]
    fn test_row_id_checked() {
        assert!(check_row_id("42").is_ok());
        assert!(check_row_id("").is_err());
        assert!(check_row_id("1/2").is_err());
    }
}
