//! Decoding a fetched GTFS archive into tables.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};

use bytes::Bytes;
use tracing::debug;
use zip::ZipArchive;

use crate::table::{ParseError, Table, TableName, parse_table};

use super::error::FeedError;

/// Result of decoding one archive.
#[derive(Debug)]
pub struct DecodedFeed {
    /// Names of every entry in the archive, in archive order.
    pub entries: Vec<String>,
    /// Tables that parsed successfully.
    pub tables: Vec<(TableName, Table)>,
    /// Tables that could not be parsed.
    pub errors: BTreeMap<TableName, ParseError>,
}

/// An opened archive whose tables have not been parsed yet.
pub struct FeedArchive {
    archive: ZipArchive<Cursor<Bytes>>,
    entries: Vec<String>,
}

impl FeedArchive {
    /// Open `bytes` as a ZIP archive.
    pub fn open(bytes: Bytes) -> Result<Self, FeedError> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let entries = archive.file_names().map(str::to_string).collect();
        Ok(Self { archive, entries })
    }

    /// Names of every entry in the archive.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Parse every required table.
    ///
    /// A missing or broken file is recorded in [`DecodedFeed::errors`] and
    /// the other files are still parsed.
    pub fn parse_tables(mut self) -> DecodedFeed {
        let mut tables = Vec::new();
        let mut errors = BTreeMap::new();

        for name in TableName::ALL {
            match parse_entry(&mut self.archive, &self.entries, name) {
                Ok(table) => tables.push((name, table)),
                Err(e) => {
                    errors.insert(name, e);
                }
            }
        }

        DecodedFeed {
            entries: self.entries,
            tables,
            errors,
        }
    }
}

/// Open `bytes` as a ZIP archive and parse every required table.
///
/// Fails only if the archive itself is unreadable.
pub fn decode_archive(bytes: Bytes) -> Result<DecodedFeed, FeedError> {
    let archive = FeedArchive::open(bytes)?;
    debug!(phase = "parsing", entries = archive.entries().len(), "archive opened");
    Ok(archive.parse_tables())
}

fn parse_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entries: &[String],
    name: TableName,
) -> Result<Table, ParseError> {
    let file_name = name.file_name();
    let entry = find_entry(entries, file_name)
        .ok_or_else(|| ParseError::MissingFile(file_name.to_string()))?;
    let file = archive.by_name(entry).map_err(|source| ParseError::Zip {
        file: file_name.to_string(),
        source,
    })?;
    parse_table(file_name, file)
}

/// Find an entry by file name, at the root or one directory deep.
///
/// Some publishers zip the feed directory rather than its contents.
fn find_entry<'a>(entries: &'a [String], file_name: &str) -> Option<&'a str> {
    if let Some(exact) = entries.iter().find(|e| e.as_str() == file_name) {
        return Some(exact.as_str());
    }
    entries
        .iter()
        .find(|e| {
            e.split_once('/')
                .is_some_and(|(dir, rest)| !dir.is_empty() && rest == file_name)
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::build_archive;

    const ROUTES: &str = "route_id,route_short_name,route_type\nR1,6,0\n";
    const STOPS: &str = "stop_id,stop_name,stop_lat,stop_lon\nS1,Trg,45.81,15.97\n";
    const TRIPS: &str = "route_id,service_id,trip_id\nR1,WD,T1\n";
    const STOP_TIMES: &str =
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:00:00,S1,1\n";

    #[test]
    fn decodes_all_four_tables() {
        let bytes = build_archive(&[
            ("routes.txt", ROUTES),
            ("stops.txt", STOPS),
            ("trips.txt", TRIPS),
            ("stop_times.txt", STOP_TIMES),
            ("agency.txt", "agency_id\nZET\n"),
        ])
        .unwrap();

        let decoded = decode_archive(bytes).unwrap();
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.tables.len(), 4);
        assert_eq!(decoded.entries.len(), 5);
        assert!(decoded.tables.iter().all(|(_, t)| !t.is_empty()));
    }

    #[test]
    fn missing_file_does_not_abort_others() {
        let bytes = build_archive(&[
            ("routes.txt", ROUTES),
            ("trips.txt", TRIPS),
            ("stop_times.txt", STOP_TIMES),
        ])
        .unwrap();

        let decoded = decode_archive(bytes).unwrap();
        assert_eq!(decoded.tables.len(), 3);
        assert!(matches!(
            decoded.errors.get(&TableName::Stops),
            Some(ParseError::MissingFile(f)) if f == "stops.txt"
        ));
    }

    #[test]
    fn empty_file_is_per_file_error() {
        let bytes = build_archive(&[
            ("routes.txt", ""),
            ("stops.txt", STOPS),
            ("trips.txt", TRIPS),
            ("stop_times.txt", STOP_TIMES),
        ])
        .unwrap();

        let decoded = decode_archive(bytes).unwrap();
        assert_eq!(decoded.tables.len(), 3);
        assert!(matches!(
            decoded.errors.get(&TableName::Routes),
            Some(ParseError::MissingHeader(_))
        ));
    }

    #[test]
    fn finds_files_in_single_directory() {
        let bytes = build_archive(&[("gtfs/stops.txt", STOPS)]).unwrap();
        let decoded = decode_archive(bytes).unwrap();
        assert_eq!(decoded.tables.len(), 1);
        assert_eq!(decoded.tables[0].0, TableName::Stops);
    }

    #[test]
    fn corrupt_archive_is_decode_error() {
        let bytes = Bytes::from_static(b"<html>not a zip</html>");
        assert!(matches!(decode_archive(bytes), Err(FeedError::Decode(_))));
    }

    #[test]
    fn find_entry_prefers_root() {
        let entries = vec!["a/stops.txt".to_string(), "stops.txt".to_string()];
        assert_eq!(find_entry(&entries, "stops.txt"), Some("stops.txt"));
        assert_eq!(find_entry(&entries, "trips.txt"), None);

        let nested = vec!["a/b/stops.txt".to_string()];
        assert_eq!(find_entry(&nested, "stops.txt"), None);
    }
}
