//! Permissive CSV parsing into tables.

use std::io::Read;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use super::error::ParseError;
use super::{ColumnKind, Row, Table};

const BOM: char = '\u{feff}';

/// Parse a GTFS text file into a [`Table`].
///
/// Malformed records are dropped instead of failing the file: rows the CSV
/// reader rejects and rows with more fields than the header are skipped,
/// rows with fewer fields are padded with empty values. Only a missing or
/// unreadable header row, or an I/O error from `reader`, fails the whole file.
pub fn parse_table<R: Read>(file: &str, reader: R) -> Result<Table, ParseError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers().map_err(|source| ParseError::Csv {
        file: file.to_string(),
        source,
    })?;
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(BOM).to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if columns.iter().all(|c| c.trim().is_empty()) {
        return Err(ParseError::MissingHeader(file.to_string()));
    }

    let width = columns.len();
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        match result {
            Ok(record) if record.len() <= width => {
                records.push(record.iter().map(str::to_string).collect());
            }
            Ok(record) => {
                debug!(file, fields = record.len(), width, "dropping over-long row");
                skipped += 1;
            }
            // The underlying reader is broken, so no further rows can be read
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(ParseError::Csv {
                    file: file.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                debug!(file, error = %e, "dropping malformed row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(file, skipped, kept = records.len(), "dropped malformed rows");
    }

    Ok(build_table(columns, records))
}

/// Build a typed table from raw string records.
///
/// Records shorter than the header are padded with empty fields.
pub(crate) fn build_table(columns: Vec<String>, records: Vec<Vec<String>>) -> Table {
    let kinds: Vec<ColumnKind> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            ColumnKind::infer(
                column,
                records.iter().filter_map(|r| r.get(i).map(String::as_str)),
            )
        })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            let values = kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| kind.convert(record.get(i).map(String::as_str).unwrap_or("")))
                .collect();
            Row::new(values)
        })
        .collect();

    Table::new(columns, rows)
}
