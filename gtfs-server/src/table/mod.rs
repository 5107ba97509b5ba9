//! Tables parsed from GTFS text files.
//!
//! A [`Table`] is an immutable snapshot: a shared header plus rows of
//! [`FieldValue`]s, one value per header column. Tables are rebuilt
//! wholesale on every refresh and never mutated afterwards.

mod error;
mod name;
mod parse;
mod value;

use std::sync::Arc;

use serde_json::{Map, Value};

pub use error::ParseError;
pub use name::{TableName, UnknownTable};
pub use parse::parse_table;
pub use value::{ColumnKind, FieldValue};

/// A single row of a table, with one value per header column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<FieldValue>,
}

impl Row {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Value at a column index, as returned by [`Table::column_index`].
    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }
}

/// An ordered sequence of rows sharing one header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table, padding or truncating rows to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.values.resize(width, FieldValue::Empty);
                row
            })
            .collect();

        Self {
            columns: columns.into(),
            rows,
        }
    }

    /// Create a table from raw text records, inferring column types.
    pub fn from_records(columns: Vec<String>, records: Vec<Vec<String>>) -> Self {
        parse::build_table(columns, records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Render one row as a JSON object keyed by column name.
    ///
    /// Missing and non-finite values become `""`.
    pub fn row_to_json(&self, row: &Row) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(row.values.iter())
            .map(|(column, value)| (column.clone(), field_to_json(value)))
            .collect()
    }
}

fn field_to_json(value: &FieldValue) -> Value {
    // FieldValue's Serialize impl cannot fail for serde_json::Value
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(String::new()))
}
