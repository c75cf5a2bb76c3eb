//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
//! Value types used by the Socrata SDK.
//!
//! Data returned by the service is held in [`Record`]s, which are plain JSON
//! objects with explicit accessors: asking for a field that is not present gives
//! `None`, never an empty value.
use crate::error::{ia_err, SocrataError, SocrataErrorCode};
use serde_json::{Map, Value};
use std::fmt;

/// A validated "four-four" identifier of a dataset, view or user, such as `n5m4-mism`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourFour(String);

impl FourFour {
    /// Parse a four-four identifier: two groups of four lowercase letters or digits
    /// separated by a dash.
    pub fn parse(id: &str) -> Result<FourFour, SocrataError> {
        if !FourFour::is_valid(id) {
            return ia_err!("invalid four-four id '{}'", id);
        }
        Ok(FourFour(id.to_string()))
    }

    pub fn is_valid(id: &str) -> bool {
        let b = id.as_bytes();
        if b.len() != 9 || b[4] != b'-' {
            return false;
        }
        b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || c.is_ascii_digit() || c.is_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FourFour {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for FourFour {
    type Err = SocrataError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FourFour::parse(s)
    }
}

/// Whether a local [`Dataset`](crate::Dataset) refers to a remote dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attachment {
    #[default]
    NotAttached,
    Attached(FourFour),
}

impl Attachment {
    pub fn is_attached(&self) -> bool {
        matches!(self, Attachment::Attached(_))
    }

    pub fn id(&self) -> Option<&FourFour> {
        match self {
            Attachment::Attached(id) => Some(id),
            Attachment::NotAttached => None,
        }
    }

    /// Get the attached ID, or a `NotAttached` error naming `operation`.
    pub fn require(&self, operation: &str) -> Result<&FourFour, SocrataError> {
        match self {
            Attachment::Attached(id) => Ok(id),
            Attachment::NotAttached => Err(SocrataError::new(
                SocrataErrorCode::NotAttached,
                &format!("cannot {}: dataset is not attached to a remote dataset", operation),
            )),
        }
    }
}

/// A JSON object returned by, or sent to, the service.
///
/// Used for dataset metadata, user profiles, columns and rows. Field lookups are
/// explicit: [`get()`](Record::get()) returns `None` for absent fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub(crate) m: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_json_map(json: Map<String, Value>) -> Self {
        Record { m: json }
    }

    pub fn from_json_object(json: Value) -> Result<Self, SocrataError> {
        match json {
            Value::Object(o) => Ok(Record { m: o }),
            other => Err(SocrataError::new(
                SocrataErrorCode::InvalidResponse,
                &format!("expected a json object, got: {}", other),
            )),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.m.get(field)
    }

    /// Get a string field. `None` if absent or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.m.get(field).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.m.get(field).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.m.get(field).and_then(|v| v.as_bool())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.m.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.m.iter()
    }

    pub fn put(&mut self, field: &str, val: impl Into<Value>) {
        self.m.insert(field.to_string(), val.into());
    }

    pub fn column(mut self, field: &str, val: impl Into<Value>) -> Record {
        self.put(field, val);
        self
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.m.clone())
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.m)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(m: Map<String, Value>) -> Self {
        Record { m }
    }
}

/// A user profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub(crate) record: Record,
}

impl User {
    pub fn from_record(record: Record) -> Self {
        User { record }
    }
    pub fn id(&self) -> Option<&str> {
        self.record.get_str("id")
    }
    pub fn display_name(&self) -> Option<&str> {
        self.record.get_str("displayName")
    }
    /// Get any profile field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }
    pub fn record(&self) -> &Record {
        &self.record
    }
}

/// Metadata of a view (dataset).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub(crate) record: Record,
}

impl View {
    pub fn from_record(record: Record) -> Self {
        View { record }
    }
    pub fn id(&self) -> Option<&str> {
        self.record.get_str("id")
    }
    pub fn name(&self) -> Option<&str> {
        self.record.get_str("name")
    }
    pub fn description(&self) -> Option<&str> {
        self.record.get_str("description")
    }
    /// Tags of the view. Empty if the view has none.
    pub fn tags(&self) -> Vec<&str> {
        match self.record.get("tags") {
            Some(Value::Array(a)) => a.iter().filter_map(|t| t.as_str()).collect(),
            _ => Vec::new(),
        }
    }
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }
    /// Get any metadata field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }
    pub fn record(&self) -> &Record {
        &self.record
    }
}

/// Outcome of a mutating operation.
///
/// Outside a batch the operation runs immediately and its result is
/// `Completed`. Inside [`Handle::with_batch()`](crate::Handle::with_batch()) the
/// operation is only queued: no result exists yet, and `Queued` carries the
/// operation's position, which indexes into the
/// [`BatchResult`](crate::BatchResult) once the batch has been submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Submitted<T> {
    Completed(T),
    Queued(usize),
}

impl<T> Submitted<T> {
    pub fn is_queued(&self) -> bool {
        matches!(self, Submitted::Queued(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Submitted::Completed(t) => Some(t),
            Submitted::Queued(_) => None,
        }
    }

    pub fn queued_index(&self) -> Option<usize> {
        match self {
            Submitted::Queued(i) => Some(*i),
            Submitted::Completed(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Submitted<U> {
        match self {
            Submitted::Completed(t) => Submitted::Completed(f(t)),
            Submitted::Queued(i) => Submitted::Queued(i),
        }
    }

    pub fn try_map<U, E, F: FnOnce(T) -> Result<U, E>>(self, f: F) -> Result<Submitted<U>, E> {
        match self {
            Submitted::Completed(t) => Ok(Submitted::Completed(f(t)?)),
            Submitted::Queued(i) => Ok(Submitted::Queued(i)),
        }
    }
}
