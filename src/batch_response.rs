//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::error::{FailedOperation, SocrataError, SocrataErrorCode};
use crate::request_descriptor::RequestDescriptor;
use serde_json::Value;
use tracing::warn;

/// Struct representing the combined results of a successful batch.
///
/// This struct is returned from [`Handle::with_batch()`](crate::Handle::with_batch()).
/// Results are in the same order the operations were queued; the index carried by
/// [`Submitted::Queued`](crate::Submitted::Queued) addresses the result of that call.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub(crate) results: Vec<Value>,
}

impl BatchResult {
    /// Get the success payloads, one per queued operation.
    pub fn results(&self) -> &Vec<Value> {
        &self.results
    }
    /// Get the success payload of the operation queued at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.results.get(index)
    }
    pub fn len(&self) -> usize {
        self.results.len()
    }
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.results.iter()
    }
    pub fn into_results(self) -> Vec<Value> {
        self.results
    }
}

impl IntoIterator for BatchResult {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

fn malformed(msg: String) -> SocrataError {
    SocrataError::new(SocrataErrorCode::MalformedBatchResponse, &msg)
}

// An entry is a failure if it is an object whose "error" member is set to
// anything but false or null.
pub(crate) fn is_error_entry(entry: &Value) -> bool {
    match entry.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    }
}

pub(crate) fn member_string(entry: &Value, name: &str) -> String {
    match entry.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Match the raw response of a batch submission against the queue that produced it.
///
/// The response must be a JSON array with exactly one entry per queued
/// operation. The first entry carrying an error fails the whole batch.
pub(crate) fn correlate(
    body: &str,
    queue: &[RequestDescriptor],
) -> Result<BatchResult, SocrataError> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        malformed(format!(
            "expected an array response from a batch request, got unparseable body: {}",
            e
        ))
    })?;
    let entries = match parsed {
        Value::Array(a) => a,
        other => {
            return Err(malformed(format!(
                "expected an array response from a batch request, got: {}",
                other
            )));
        }
    };
    if entries.len() != queue.len() {
        return Err(malformed(format!(
            "batch response has {} entries for {} submitted operations",
            entries.len(),
            queue.len()
        )));
    }

    let mut failed = entries.iter().enumerate().filter(|(_, e)| is_error_entry(e));
    if let Some((index, entry)) = failed.next() {
        let others = failed.count();
        if others > 0 {
            warn!(
                "batch operation {} failed; {} later operations also reported errors",
                index, others
            );
        }
        let descriptor = &queue[index];
        return Err(SocrataError::batch_operation_failed(FailedOperation {
            index,
            method: descriptor.method(),
            path: descriptor.target_path().to_string(),
            error_code: member_string(entry, "errorCode"),
            error_message: member_string(entry, "errorMessage"),
        }));
    }

    Ok(BatchResult { results: entries })
}
