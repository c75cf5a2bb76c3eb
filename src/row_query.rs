//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::error::{SocrataError, SocrataErrorCode};
use crate::types::Record;
use serde_json::Value;
use tracing::trace;

/// Name of the meta field holding a row's ID in rows returned by
/// [`Dataset::rows()`](crate::Dataset::rows()).
pub const ROW_ID_FIELD: &str = "_id";

/// Which column property names the fields of mapped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnKey {
    /// The column's display name.
    #[default]
    Name,
    /// The column's numeric ID.
    Id,
    /// Any other column property, such as `fieldName`.
    Property(String),
}

impl ColumnKey {
    fn property(&self) -> &str {
        match self {
            ColumnKey::Name => "name",
            ColumnKey::Id => "id",
            ColumnKey::Property(p) => p,
        }
    }
}

/// Query parameters for reading the rows of a dataset.
///
/// Parameters are passed to the service unchanged, for example `max_rows`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub(crate) params: Vec<(String, String)>,
    pub(crate) key: ColumnKey,
}

impl RowQuery {
    pub fn new() -> RowQuery {
        Default::default()
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Name the fields of returned rows by this column property. The default is
    /// [`ColumnKey::Name`].
    pub fn key_by(mut self, key: ColumnKey) -> Self {
        self.key = key;
        self
    }

    pub(crate) fn path(&self, view_id: &str) -> String {
        let mut path = format!("/views/{}/rows.json", view_id);
        if !self.params.is_empty() {
            let q = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter())
                .finish();
            path.push('?');
            path.push_str(&q);
        }
        path
    }
}

fn invalid(msg: &str) -> SocrataError {
    SocrataError::new(
        SocrataErrorCode::InvalidResponse,
        &format!("unexpected rows response: {}", msg),
    )
}

fn key_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert a raw rows response into one [`Record`] per row.
///
/// The raw response holds the view's columns under `meta.view.columns` and the
/// rows as arrays of values under `data`. Each value is keyed by the
/// corresponding column's property named by `key`, and the first value of each
/// row is also stored under [`ROW_ID_FIELD`].
pub(crate) fn map_rows(raw: &Value, key: &ColumnKey) -> Result<Vec<Record>, SocrataError> {
    let columns = raw
        .pointer("/meta/view/columns")
        .and_then(|c| c.as_array())
        .ok_or_else(|| invalid("missing meta.view.columns"))?;
    let data = raw
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| invalid("missing data"))?;

    let mapping: Vec<Option<String>> = columns
        .iter()
        .map(|c| c.get(key.property()).and_then(key_string))
        .collect();
    if mapping.iter().any(|m| m.is_none()) {
        trace!(
            "some columns have no '{}' property; their values are left out",
            key.property()
        );
    }

    let mut rows = Vec::with_capacity(data.len());
    for row in data {
        let values = row.as_array().ok_or_else(|| invalid("row is not an array"))?;
        let mut r = Record::new();
        for (value, name) in values.iter().zip(mapping.iter()) {
            if let Some(name) = name {
                r.put(name, value.clone());
            }
        }
        if let Some(id) = values.first() {
            r.put(ROW_ID_FIELD, id.clone());
        }
        rows.push(r);
    }
    Ok(rows)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn raw() -> Value {
        json!({
            "meta": {"view": {"columns": [
                {"id": -1, "name": "sid", "fieldName": ":sid"},
                {"id": 1001, "name": "Column 1", "fieldName": "column_1"},
                {"id": 1002, "name": "Column 2", "fieldName": "column_2"}
            ]}},
            "data": [
                [7, "a", 1],
                [8, "b", 2]
            ]
        })
    }

    #[test]
    fn test_map_rows_by_name() {
        let rows = map_rows(&raw(), &ColumnKey::Name).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("Column 1"), Some("a"));
        assert_eq!(rows[1].get_i64("Column 2"), Some(2));
        assert_eq!(rows[1].get_i64(ROW_ID_FIELD), Some(8));
    }

    #[test]
    fn test_map_rows_by_id_and_property() {
        let rows = map_rows(&raw(), &ColumnKey::Id).unwrap();
        assert_eq!(rows[0].get_str("1001"), Some("a"));
        let rows = map_rows(&raw(), &ColumnKey::Property("fieldName".into())).unwrap();
        assert_eq!(rows[0].get_str("column_1"), Some("a"));
        assert_eq!(rows[0].get_i64(":sid"), Some(7));
    }

    #[test]
    fn test_map_rows_invalid() {
        let err = map_rows(&json!({"data": []}), &ColumnKey::Name).unwrap_err();
        assert_eq!(err.code, SocrataErrorCode::InvalidResponse);
    }

    #[test]
    fn test_query_path() {
        assert_eq!(RowQuery::new().path("abcd-1234"), "/views/abcd-1234/rows.json");
        let q = RowQuery::new().param("max_rows", "10").param("search", "a b");
        assert_eq!(
            q.path("abcd-1234"),
            "/views/abcd-1234/rows.json?max_rows=10&search=a+b"
        );
    }
}
