//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::auth_common::credentials::Credentials;
use crate::batch_response::{correlate, is_error_entry, member_string, BatchResult};
use crate::batch_session::{lock_session, BatchEnvelope, BatchMode, BatchScope, BatchSession};
use crate::error::user_agent;
use crate::error::{SocrataError, SocrataErrorCode};
use crate::handle_builder::HandleBuilder;
use crate::request_descriptor::{path_segment, RequestDescriptor};
use crate::types::{FourFour, Record, Submitted, User, View};
use reqwest::header::{HeaderMap, HeaderValue};

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::fmt::Write as _;
use std::future::Future;
use std::path::Path;
use std::result::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace, warn};

pub(crate) const BATCH_PATH: &str = "/batches";

/// **The main Socrata API handle**.
///
/// This should be created once and used throughout the application lifetime.
///
/// Each `Handle` carries its own batching state, see
/// [`with_batch()`](Handle::with_batch()). Calling `.clone()` returns a handle
/// that shares the same underlying connection pool and credentials, but has
/// a new, independent batch session. To run batches concurrently, give each
/// task its own clone.
pub struct Handle {
    // Use an inner Arc so cloning keeps the same connection and settings
    pub(crate) inner: Arc<HandleRef>,
    // never held across awaits, so a std Mutex is enough
    batch: Mutex<BatchSession>,
}

#[derive(Debug)]
pub(crate) struct HandleRef {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: String,
    pub(crate) public_host: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) date_input_format: String,
    pub(crate) date_output_format: String,
    timeout: Duration,
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        Handle {
            inner: self.inner.clone(),
            batch: Mutex::new(BatchSession::new()),
        }
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (mode, queued) = {
            let session = lock_session(&self.batch);
            (session.mode(), session.queue_len())
        };
        f.debug_struct("Handle")
            .field("inner", &self.inner)
            .field("batch_mode", &mode)
            .field("queued", &queued)
            .finish()
    }
}

impl Handle {
    /// Create a new [`HandleBuilder`].
    pub fn builder() -> HandleBuilder {
        HandleBuilder::new()
    }

    // Create the new Handle based on builder configuration
    pub(crate) async fn new(b: &HandleBuilder) -> Result<Handle, SocrataError> {
        // default timeout to 30 seconds
        let timeout = b.timeout.unwrap_or(Duration::new(30, 0));
        let c = {
            if let Some(c) = &b.client {
                c.clone()
            } else {
                reqwest::Client::builder()
                    .timeout(timeout)
                    .connect_timeout(timeout)
                    .build()?
            }
        };
        let public_host = b.resolved_public_host()?;
        debug!(
            "Creating new Handle: endpoint={}, public_host={}, credentials={:?}",
            b.endpoint, public_host, b.credentials
        );
        Ok(Handle {
            inner: Arc::new(HandleRef {
                client: c,
                endpoint: b.endpoint.clone(),
                public_host,
                credentials: b.credentials.clone(),
                date_input_format: b.date_input_format.clone(),
                date_output_format: b.date_output_format.clone(),
                timeout,
            }),
            batch: Mutex::new(BatchSession::new()),
        })
    }

    /// The API endpoint all request paths are relative to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// The public site used to build dataset links.
    pub fn public_host(&self) -> &str {
        &self.inner.public_host
    }

    /// Whether mutating calls on this handle currently execute or are queued.
    pub fn batch_mode(&self) -> BatchMode {
        lock_session(&self.batch).mode()
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.inner.endpoint, path)
    }

    fn headers(&self, json_body: bool) -> Result<HeaderMap, SocrataError> {
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_str(user_agent())?);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        if json_body {
            headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        }
        if let Some(c) = &self.inner.credentials {
            headers.insert("Authorization", HeaderValue::from_str(&c.basic_auth_header())?);
        }
        Ok(headers)
    }

    // Check resp status for 2xx, then parse the body. An empty body is null.
    async fn read_response(resp: reqwest::Response) -> Result<Value, SocrataError> {
        let status = resp.status();
        let content = resp.text().await?;
        if !status.is_success() {
            return Err(SocrataError::new(
                SocrataErrorCode::ServerError,
                &format!(
                    "got unexpected http status: {}, response text: {}",
                    status, content
                ),
            ));
        }
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        let v: Value = serde_json::from_str(&content)?;
        if v.is_object() && is_error_entry(&v) {
            return Err(SocrataError::new(
                SocrataErrorCode::ServerError,
                &format!(
                    "got error from server: code: {}, message: {}",
                    member_string(&v, "code"),
                    member_string(&v, "message")
                ),
            ));
        }
        Ok(v)
    }

    /// Execute one request immediately, regardless of the batch mode.
    pub(crate) async fn execute(&self, desc: &RequestDescriptor) -> Result<Value, SocrataError> {
        trace!("{} {}", desc.method(), desc.target_path());
        let mut rb = self
            .inner
            .client
            .request(desc.method().to_reqwest(), self.url_for(desc.target_path()))
            .timeout(self.inner.timeout)
            .headers(self.headers(desc.body().is_some())?);
        if let Some(body) = desc.body() {
            rb = rb.body(body.to_string());
        }
        let resp = rb.send().await?;
        Self::read_response(resp).await
    }

    /// Run a mutating request: queue it if a batch is open on this handle,
    /// otherwise execute it now.
    pub(crate) async fn dispatch(
        &self,
        desc: RequestDescriptor,
    ) -> Result<Submitted<Value>, SocrataError> {
        {
            // lock released before any await below
            let mut session = lock_session(&self.batch);
            if session.is_capturing() {
                let index = session.enqueue(desc)?;
                return Ok(Submitted::Queued(index));
            }
        }
        Ok(Submitted::Completed(self.execute(&desc).await?))
    }

    pub(crate) fn ensure_not_batching(&self, operation: &str) -> Result<(), SocrataError> {
        if lock_session(&self.batch).is_capturing() {
            return Err(SocrataError::new(
                SocrataErrorCode::UnsupportedInBatch,
                &format!("cannot {} as part of a batch", operation),
            ));
        }
        Ok(())
    }

    /// Send a local file as a multipart form POST, in a part named `file`.
    ///
    /// `remote_name` overrides the file name sent to the service.
    pub(crate) async fn post_file(
        &self,
        operation: &str,
        path: &str,
        file: &Path,
        remote_name: Option<&str>,
    ) -> Result<Value, SocrataError> {
        self.ensure_not_batching(operation)?;
        let contents = tokio::fs::read(file).await.map_err(|e| {
            SocrataError::new(
                SocrataErrorCode::IoError,
                &format!("error reading '{}': {}", file.display(), e),
            )
        })?;
        let name = match remote_name {
            Some(n) => n.to_string(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string()),
        };
        self.post_multipart(path, &name, contents).await
    }

    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Value, SocrataError> {
        trace!(
            "POST {} (multipart, {} bytes as '{}')",
            path,
            contents.len(),
            file_name
        );
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .inner
            .client
            .post(self.url_for(path))
            .timeout(self.inner.timeout)
            .headers(self.headers(false)?)
            .multipart(form)
            .send()
            .await?;
        Self::read_response(resp).await
    }

    /// Run `work` as one batch.
    ///
    /// While `work` runs, every mutating operation issued through this handle is
    /// queued instead of executed, and returns [`Submitted::Queued`] with its
    /// position in the batch. Reads still execute immediately. When `work`
    /// completes successfully, the queue is sent as one request to the
    /// service, and the per-operation results are returned in call order.
    ///
    /// If no operation was queued, nothing is sent. If `work` returns an error,
    /// the operations queued before it are still sent as one request, and the
    /// error from `work` is returned. A failure of that request is only logged.
    /// If the service rejects any operation, the error describes the first
    /// rejected one (see [`SocrataError::failed_operation()`]); the service does not
    /// roll back the others.
    ///
    /// Batches do not nest: calling `with_batch` on a handle that already has an
    /// open batch fails with [`SocrataErrorCode::AlreadyBatching`]. While a batch is
    /// open, mutating calls on this handle from other tasks are captured into it,
    /// so concurrent work should use a separate [`clone()`](Handle::clone()).
    ///
    /// Whatever the outcome, the handle is back in [`BatchMode::Direct`] with an
    /// empty queue when this returns, or if the returned future is dropped.
    ///
    ///```no_run
    /// # use socrata_rust_sdk::{Dataset, Handle, Record};
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let handle = Handle::builder().from_environment()?.build().await?;
    /// let ds = Dataset::open(&handle, "n5m4-mism").await?;
    /// let (h, d) = (&handle, &ds);
    /// let results = handle
    ///     .with_batch(|| async move {
    ///         for i in 0..10 {
    ///             d.add_row(h, &Record::new().column("Count", i)).await?;
    ///         }
    ///         Ok(())
    ///     })
    ///     .await?;
    /// assert_eq!(results.len(), 10);
    /// # Ok(())
    /// # }
    ///```
    pub async fn with_batch<F, Fut>(&self, work: F) -> Result<BatchResult, SocrataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), SocrataError>>,
    {
        let scope = BatchScope::begin(&self.batch)?;
        let outcome = work().await;
        let queue = scope.close();
        match outcome {
            Ok(()) => self.flush_batch(queue).await,
            Err(e) => {
                if !queue.is_empty() {
                    warn!(
                        "batch work failed: submitting the {} operations queued before the failure",
                        queue.len()
                    );
                    if let Err(fe) = self.flush_batch(queue).await {
                        warn!("batch submitted after a work failure also failed: {}", fe);
                    }
                }
                Err(e)
            }
        }
    }

    async fn flush_batch(
        &self,
        queue: Vec<RequestDescriptor>,
    ) -> Result<BatchResult, SocrataError> {
        if queue.is_empty() {
            trace!("empty batch: nothing to submit");
            return Ok(BatchResult::default());
        }
        let body = serde_json::to_string(&BatchEnvelope { requests: &queue })?;
        debug!("submitting batch of {} operations", queue.len());
        let resp = self
            .inner
            .client
            .post(self.url_for(BATCH_PATH))
            .timeout(self.inner.timeout)
            .headers(self.headers(true)?)
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let content = resp.text().await?;
        if !status.is_success() {
            warn!("batch of {} operations failed with status {}", queue.len(), status);
            return Err(SocrataError::new(
                SocrataErrorCode::ServerError,
                &format!(
                    "got unexpected http status for batch request: {}, response text: {}",
                    status, content
                ),
            ));
        }
        let result = correlate(&content, &queue);
        if let Err(e) = &result {
            warn!("batch of {} operations failed: {}", queue.len(), e);
        }
        result
    }

    /// Get the profile of a user, by user ID or login name.
    pub async fn user(&self, uid_or_login: &str) -> Result<User, SocrataError> {
        if uid_or_login.is_empty() {
            return Err(SocrataError::new(
                SocrataErrorCode::IllegalArgument,
                "user id or login must not be empty",
            ));
        }
        let path = format!("/users/{}.json", path_segment(uid_or_login));
        let desc = RequestDescriptor::get(&path);
        let v = self.execute(&desc).await?;
        Ok(User::from_record(Record::from_json_object(v)?))
    }

    /// Get the metadata of a view.
    pub async fn view(&self, id: &FourFour) -> Result<View, SocrataError> {
        let desc = RequestDescriptor::get(&format!("/views/{}.json", id));
        let v = self.execute(&desc).await?;
        Ok(View::from_record(Record::from_json_object(v)?))
    }

    /// Convert a date string into the form the service expects.
    ///
    /// `date` is parsed with the input format configured by
    /// [`HandleBuilder::date_format()`], and written with the output format
    /// followed by ` GMT`. If the input format carries a UTC offset (`%z`), the
    /// time is converted to UTC first.
    pub fn format_date(&self, date: &str) -> Result<String, SocrataError> {
        let input = &self.inner.date_input_format;
        let utc = if input.contains("%z") || input.contains("%:z") || input.contains("%#z") {
            DateTime::parse_from_str(date, input)?.naive_utc()
        } else {
            NaiveDateTime::parse_from_str(date, input)?
        };
        let mut out = String::new();
        if write!(out, "{}", utc.format(&self.inner.date_output_format)).is_err() {
            return Err(SocrataError::new(
                SocrataErrorCode::IllegalArgument,
                &format!(
                    "invalid date output format '{}'",
                    self.inner.date_output_format
                ),
            ));
        }
        out.push_str(" GMT");
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_clone_has_independent_session() {
        let h = Handle::builder().build().await.unwrap();
        let h2 = h.clone();
        let _scope = BatchScope::begin(&h.batch).unwrap();
        assert_eq!(h.batch_mode(), BatchMode::Capturing);
        assert_eq!(h2.batch_mode(), BatchMode::Direct);
        assert!(Arc::ptr_eq(&h.inner, &h2.inner));
        assert!(h2.ensure_not_batching("upload a file").is_ok());
        let err = h.ensure_not_batching("upload a file").unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::UnsupportedInBatch);
    }

    #[tokio::test]
    async fn test_dispatch_queues_while_capturing() {
        let h = Handle::builder().build().await.unwrap();
        let scope = BatchScope::begin(&h.batch).unwrap();
        let s = h
            .dispatch(RequestDescriptor::delete("/views/abcd-1234"))
            .await
            .unwrap();
        assert_eq!(s, Submitted::Queued(0));
        let s = h
            .dispatch(RequestDescriptor::delete("/views/efgh-5678"))
            .await
            .unwrap();
        assert_eq!(s, Submitted::Queued(1));
        let queue = scope.close();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[1].target_path(), "/views/efgh-5678");
        assert_eq!(h.batch_mode(), BatchMode::Direct);
    }

    #[tokio::test]
    async fn test_format_date() {
        let h = Handle::builder().build().await.unwrap();
        assert_eq!(
            h.format_date("2010-03-04 15:16:17").unwrap(),
            "03/04/2010 15:16:17 GMT"
        );
        let err = h.format_date("yesterday").unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::IllegalArgument);

        let h = Handle::builder()
            .date_format("%a %b %d %H:%M:%S %z %Y", "%Y-%m-%d %H:%M")
            .unwrap()
            .build()
            .await
            .unwrap();
        assert_eq!(
            h.format_date("Thu Mar 04 15:16:17 +0200 2010").unwrap(),
            "2010-03-04 13:16 GMT"
        );
    }
}
