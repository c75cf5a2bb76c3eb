//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::error::{SocrataError, SocrataErrorCode};
use crate::request_descriptor::RequestDescriptor;
use serde_derive::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

/// Whether mutating calls on a [`Handle`](crate::Handle) execute immediately or are
/// queued into an open batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    #[default]
    Direct,
    Capturing,
}

// Per-handle batching state. Never shared between handles.
#[derive(Debug, Default)]
pub(crate) struct BatchSession {
    mode: BatchMode,
    queue: Vec<RequestDescriptor>,
}

// Body of a composite submission: {"requests": [...]}
#[derive(Debug, Serialize)]
pub(crate) struct BatchEnvelope<'a> {
    pub(crate) requests: &'a [RequestDescriptor],
}

impl BatchSession {
    pub(crate) fn new() -> BatchSession {
        BatchSession::default()
    }

    pub(crate) fn mode(&self) -> BatchMode {
        self.mode
    }

    pub(crate) fn is_capturing(&self) -> bool {
        self.mode == BatchMode::Capturing
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn begin_batch(&mut self) -> Result<(), SocrataError> {
        if self.is_capturing() {
            return Err(SocrataError::new(
                SocrataErrorCode::AlreadyBatching,
                "cannot begin a batch: a batch is already open on this handle",
            ));
        }
        self.queue.clear();
        self.mode = BatchMode::Capturing;
        debug!("batch started");
        Ok(())
    }

    // Returns the position of the descriptor in the batch.
    pub(crate) fn enqueue(&mut self, descriptor: RequestDescriptor) -> Result<usize, SocrataError> {
        if !self.is_capturing() {
            return Err(SocrataError::new(
                SocrataErrorCode::IllegalState,
                "cannot queue a request: no batch is open",
            ));
        }
        trace!(
            "queueing batch operation {}: {} {}",
            self.queue.len(),
            descriptor.method(),
            descriptor.target_path()
        );
        self.queue.push(descriptor);
        Ok(self.queue.len() - 1)
    }

    // Switches back to Direct before handing out the queue, so the session is
    // usable again no matter how the flush of the returned queue turns out.
    pub(crate) fn end_batch(&mut self) -> Result<Vec<RequestDescriptor>, SocrataError> {
        if !self.is_capturing() {
            return Err(SocrataError::new(
                SocrataErrorCode::IllegalState,
                "cannot end a batch: no batch is open",
            ));
        }
        self.mode = BatchMode::Direct;
        let queue = std::mem::take(&mut self.queue);
        debug!("batch ended with {} queued operations", queue.len());
        Ok(queue)
    }
}

pub(crate) fn lock_session(session: &Mutex<BatchSession>) -> MutexGuard<'_, BatchSession> {
    // the lock is never held across an await or a user callback, so a poisoned
    // lock still holds a consistent session
    session.lock().unwrap_or_else(|e| e.into_inner())
}

/// Open batch scope on a session.
///
/// Dropping a scope that was not [`close`](BatchScope::close)d ends the batch and
/// discards the queue. This covers panics in user code and a `with_batch` future
/// dropped before completion.
pub(crate) struct BatchScope<'a> {
    session: &'a Mutex<BatchSession>,
    open: bool,
}

impl<'a> BatchScope<'a> {
    pub(crate) fn begin(session: &'a Mutex<BatchSession>) -> Result<BatchScope<'a>, SocrataError> {
        lock_session(session).begin_batch()?;
        Ok(BatchScope {
            session,
            open: true,
        })
    }

    pub(crate) fn close(mut self) -> Vec<RequestDescriptor> {
        self.open = false;
        lock_session(self.session).end_batch().unwrap_or_default()
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Ok(queue) = lock_session(self.session).end_batch() {
            if !queue.is_empty() {
                warn!(
                    "batch abandoned: discarding {} queued operations without submitting",
                    queue.len()
                );
            }
        }
    }
}
