//! Query error types.

use crate::table::TableName;

/// Errors returned by the query engine.
///
/// The web layer maps the not-found kinds to 404 and everything else to 500.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The table has never been loaded successfully
    #[error("table {0} is not loaded")]
    TableNotFound(TableName),

    /// No trip serves the route
    #[error("no trips found for route {0}")]
    RouteNotFound(String),

    /// A column the query needs is absent from the table header
    #[error("table {table} has no column {column}")]
    MissingColumn {
        table: TableName,
        column: &'static str,
    },

    /// A field could not be interpreted as the query requires
    #[error("invalid {column} in {table}: {value:?}")]
    InvalidField {
        table: TableName,
        column: &'static str,
        value: String,
    },

    /// A stop time references a stop that does not exist
    #[error("trip {trip_id} references unknown stop {stop_id}")]
    ReferentialIntegrity { trip_id: String, stop_id: String },
}

impl QueryError {
    /// Whether the error means "nothing to return" rather than a data fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QueryError::TableNotFound(_) | QueryError::RouteNotFound(_)
        )
    }
}
