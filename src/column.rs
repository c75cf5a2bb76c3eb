//
// Copyright (c) 2010, 2025 Socrata and contributors.
//
// Licensed under the Apache License, Version 2.0
//  http://www.apache.org/licenses/LICENSE-2.0
//
use crate::error::{ia_err, SocrataError};
use serde_json::{json, Value};

pub(crate) const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Data type of a dataset column, as named by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Money,
    Percent,
    Date,
    Checkbox,
    Url,
    Email,
    Phone,
    Photo,
    Document,
    Location,
    /// Any type name not listed above, passed to the service unchanged.
    Other(String),
}

impl ColumnType {
    /// The `dataTypeName` sent to the service.
    pub fn type_name(&self) -> &str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Money => "money",
            ColumnType::Percent => "percent",
            ColumnType::Date => "date",
            ColumnType::Checkbox => "checkbox",
            ColumnType::Url => "url",
            ColumnType::Email => "email",
            ColumnType::Phone => "phone",
            ColumnType::Photo => "photo",
            ColumnType::Document => "document",
            ColumnType::Location => "location",
            ColumnType::Other(s) => s,
        }
    }
}

impl From<&str> for ColumnType {
    fn from(s: &str) -> Self {
        match s {
            "text" => ColumnType::Text,
            "number" => ColumnType::Number,
            "money" => ColumnType::Money,
            "percent" => ColumnType::Percent,
            "date" => ColumnType::Date,
            "checkbox" => ColumnType::Checkbox,
            "url" => ColumnType::Url,
            "email" => ColumnType::Email,
            "phone" => ColumnType::Phone,
            "photo" => ColumnType::Photo,
            "document" => ColumnType::Document,
            "location" => ColumnType::Location,
            other => ColumnType::Other(other.to_string()),
        }
    }
}

/// Definition of a new column, used with [`Dataset::add_column()`](crate::Dataset::add_column()).
///
/// Only the name is required. Columns are `text`, visible, plain-formatted and
/// 100 pixels wide unless set otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) column_type: ColumnType,
    pub(crate) hidden: bool,
    pub(crate) rich: bool,
    pub(crate) width: u32,
}

impl ColumnSpec {
    pub fn new(name: &str) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            description: None,
            column_type: ColumnType::Text,
            hidden: false,
            rich: false,
            width: DEFAULT_COLUMN_WIDTH,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Use rich text formatting for the column values.
    pub fn rich(mut self, rich: bool) -> Self {
        self.rich = rich;
        self
    }

    /// Display width, in pixels.
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub(crate) fn to_json(&self) -> Result<Value, SocrataError> {
        if self.name.is_empty() {
            return ia_err!("column name must not be empty");
        }
        let mut v = json!({
            "name": self.name,
            "dataTypeName": self.column_type.type_name(),
            "description": self.description,
            "hidden": self.hidden,
            "width": self.width,
        });
        if self.rich {
            v["format"] = json!({"formatting_option": "Rich"});
        }
        Ok(v)
    }
}
