//! Names of the GTFS tables served by the API.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Error returned when parsing an unknown table name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table name: {0}")]
pub struct UnknownTable(String);

/// One of the GTFS tables kept in the store.
///
/// # Examples
///
/// ```
/// use gtfs_server::table::TableName;
///
/// let name = TableName::parse("stop_times").unwrap();
/// assert_eq!(name.file_name(), "stop_times.txt");
///
/// // Names are case-sensitive
/// assert!(TableName::parse("Stops").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Routes,
    Stops,
    Trips,
    StopTimes,
}

impl TableName {
    /// Every table the refresh worker loads, in archive order.
    pub const ALL: [TableName; 4] = [
        TableName::Routes,
        TableName::Stops,
        TableName::Trips,
        TableName::StopTimes,
    ];

    /// Parse a table name such as `"routes"` or `"stop_times"`.
    pub fn parse(s: &str) -> Result<Self, UnknownTable> {
        match s {
            "routes" => Ok(TableName::Routes),
            "stops" => Ok(TableName::Stops),
            "trips" => Ok(TableName::Trips),
            "stop_times" => Ok(TableName::StopTimes),
            other => Err(UnknownTable(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Routes => "routes",
            TableName::Stops => "stops",
            TableName::Trips => "trips",
            TableName::StopTimes => "stop_times",
        }
    }

    /// File name of this table inside a GTFS archive.
    pub fn file_name(&self) -> &'static str {
        match self {
            TableName::Routes => "routes.txt",
            TableName::Stops => "stops.txt",
            TableName::Trips => "trips.txt",
            TableName::StopTimes => "stop_times.txt",
        }
    }
}

impl FromStr for TableName {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
