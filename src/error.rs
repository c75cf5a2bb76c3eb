//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::request_descriptor::RequestMethod;

include!(concat!(env!("OUT_DIR"), "/ua.rs"));

pub(crate) fn sdk_version() -> &'static str {
    SDK_VERSION
}

pub(crate) fn user_agent() -> &'static str {
    USER_AGENT
}

/// Enumeration of all possible errors returned by this library.
#[derive(Debug, Clone)]
pub struct SocrataError {
    pub code: SocrataErrorCode,
    pub message: String,
    pub(crate) failed_operation: Option<FailedOperation>,
}

/// Details of the first failing sub-operation of a batch.
///
/// This is attached to errors with code [`SocrataErrorCode::BatchOperationFailed`].
/// The method and path are those of the request queued at `index`, so the
/// caller can tell which of its calls the service rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedOperation {
    pub(crate) index: usize,
    pub(crate) method: RequestMethod,
    pub(crate) path: String,
    pub(crate) error_code: String,
    pub(crate) error_message: String,
}

impl FailedOperation {
    /// 0-based position of the failing operation in the batch.
    pub fn index(&self) -> usize {
        self.index
    }
    /// HTTP method of the failing operation.
    pub fn method(&self) -> RequestMethod {
        self.method
    }
    /// API-relative path of the failing operation.
    pub fn path(&self) -> &str {
        &self.path
    }
    /// Error code reported by the service for this operation.
    pub fn error_code(&self) -> &str {
        &self.error_code
    }
    /// Error message reported by the service for this operation.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

impl std::error::Error for SocrataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for SocrataError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "code={:?} message=\"{}\"", self.code, self.message)
    }
}

impl SocrataError {
    pub fn new(code: SocrataErrorCode, msg: &str) -> SocrataError {
        SocrataError {
            code,
            message: msg.to_string(),
            failed_operation: None,
        }
    }

    pub(crate) fn batch_operation_failed(op: FailedOperation) -> SocrataError {
        SocrataError {
            code: SocrataErrorCode::BatchOperationFailed,
            message: format!(
                "received error in batch response for operation {} {} (index {}): {} - {}. \
                 Other operations in the batch may have been applied",
                op.method, op.path, op.index, op.error_code, op.error_message
            ),
            failed_operation: Some(op),
        }
    }

    /// For [`SocrataErrorCode::BatchOperationFailed`] errors, get the details of the
    /// first failing operation. For all other errors this is `None`.
    pub fn failed_operation(&self) -> Option<&FailedOperation> {
        self.failed_operation.as_ref()
    }
}

macro_rules! ia_error {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        crate::error::SocrataError::new(
            crate::error::SocrataErrorCode::IllegalArgument,
            &format!("{} ({})", m, crate::error::sdk_version()),
        )
    }};
}

pub(crate) use ia_error;

macro_rules! ia_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(crate::error::SocrataError::new(
            crate::error::SocrataErrorCode::IllegalArgument,
            &format!("{} ({})", m, crate::error::sdk_version()),
        ))
    }};
}

pub(crate) use ia_err;

impl From<reqwest::Error> for SocrataError {
    fn from(e: reqwest::Error) -> Self {
        let mut code = SocrataErrorCode::TransportError;
        if e.is_timeout() {
            code = SocrataErrorCode::RequestTimeout;
        }
        SocrataError::new(
            code,
            &format!("reqwest error: {} ({})", e, crate::error::sdk_version()),
        )
    }
}

impl From<reqwest::header::InvalidHeaderValue> for SocrataError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        ia_error!("invalid header value: {}", e)
    }
}

impl From<url::ParseError> for SocrataError {
    fn from(e: url::ParseError) -> Self {
        ia_error!("error parsing url: {}", e)
    }
}

impl From<chrono::ParseError> for SocrataError {
    fn from(e: chrono::ParseError) -> Self {
        ia_error!("invalid datetime value: {}", e)
    }
}

impl From<serde_json::Error> for SocrataError {
    fn from(e: serde_json::Error) -> Self {
        SocrataError::new(
            SocrataErrorCode::InvalidResponse,
            &format!("invalid json: {}", e),
        )
    }
}

impl From<std::io::Error> for SocrataError {
    fn from(e: std::io::Error) -> Self {
        SocrataError::new(SocrataErrorCode::IoError, &e.to_string())
    }
}

/// SocrataErrorCode represents the error code.
///
/// Codes for errors detected locally (bad arguments, batching misuse) come first,
/// followed by errors reported by, or in communication with, the service.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SocrataErrorCode {
    /// IllegalArgument error represents the application provided an illegal
    /// argument for the operation.
    IllegalArgument,

    /// IllegalState error represents an internal operation attempted in a state
    /// that does not allow it, such as queueing a request with no open batch.
    IllegalState,

    /// NotAttached error represents an operation that requires a dataset ID was
    /// attempted on a [`Dataset`](crate::Dataset) not attached to a remote dataset.
    NotAttached,

    /// AlreadyBatching error represents an attempt to open a batch on a
    /// [`Handle`](crate::Handle) that already has an open batch. Batches do not nest.
    AlreadyBatching,

    /// UnsupportedInBatch error represents an operation that cannot be queued in a
    /// batch, such as a multipart file upload, was attempted inside a batch.
    UnsupportedInBatch,

    /// MalformedBatchResponse error represents the response to a batch submission
    /// was not an array with one entry per submitted operation.
    MalformedBatchResponse,

    /// BatchOperationFailed error represents that one of the operations in a batch
    /// was rejected by the service. See [`SocrataError::failed_operation()`].
    ///
    /// The service is not transactional: operations before and after the failing
    /// one may have been applied.
    BatchOperationFailed,

    /// ServerError represents the service returned an error for a direct request,
    /// either as an http error status or as an error payload.
    ServerError,

    /// InvalidResponse error represents a response body that could not be parsed.
    InvalidResponse,

    /// TransportError represents a failure in the underlying http client, such as
    /// a connection failure.
    TransportError,

    /// RequestTimeout error represents the request did not complete before the
    /// configured timeout elapsed.
    RequestTimeout,

    /// IoError represents a local file could not be read.
    IoError,
}
