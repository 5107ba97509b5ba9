//! Raw field values and column type inference.

use std::fmt;

use serde::{Serialize, Serializer};

/// A single field of a table row.
///
/// Serializes to JSON with a stable empty representation: missing values and
/// non-finite floats become `""` rather than `null` or `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Compare against a textual key such as a path parameter.
    ///
    /// Numbers compare by their display form, so a `route_id` column that
    /// was inferred as numeric still matches `"12"`.
    pub fn matches_str(&self, key: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == key,
            FieldValue::Empty => key.is_empty(),
            other => other.to_string() == key,
        }
    }

    /// Interpret the value as an integer, for ordering columns.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Float(x) if !x.is_finite() => Ok(()),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_str(""),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            FieldValue::Float(_) => serializer.serialize_str(""),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    /// Infer the kind of a column from its raw fields.
    ///
    /// Identifier columns (`*_id`) are always text. Otherwise a column is
    /// integer if every non-empty field parses as `i64`, float if every
    /// non-empty field parses as `f64`, and text in all other cases. A column
    /// with no non-empty fields is text.
    pub fn infer<'a>(column: &str, fields: impl Iterator<Item = &'a str>) -> Self {
        if column.ends_with("_id") {
            return ColumnKind::Text;
        }

        let mut kind = None;
        for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
            let field_kind = if field.parse::<i64>().is_ok() {
                ColumnKind::Integer
            } else if field.parse::<f64>().is_ok() {
                ColumnKind::Float
            } else {
                return ColumnKind::Text;
            };
            kind = Some(match (kind, field_kind) {
                (None, k) => k,
                (Some(ColumnKind::Integer), ColumnKind::Integer) => ColumnKind::Integer,
                _ => ColumnKind::Float,
            });
        }
        kind.unwrap_or(ColumnKind::Text)
    }

    /// Convert one raw field according to this column kind.
    pub fn convert(&self, raw: &str) -> FieldValue {
        if raw.trim().is_empty() {
            return FieldValue::Empty;
        }
        match self {
            ColumnKind::Integer => raw
                .trim()
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnKind::Float => raw
                .trim()
                .parse()
                .map(FieldValue::Float)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnKind::Text => FieldValue::Text(raw.to_string()),
        }
    }
}
