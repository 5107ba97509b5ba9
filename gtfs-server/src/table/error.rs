//! Per-file parse errors.

/// Errors that prevent a single GTFS file from becoming a table.
///
/// These never abort a refresh cycle: the other files are still parsed and
/// installed, and the failed table keeps its previous contents.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The archive does not contain the file.
    #[error("{0} not found in archive")]
    MissingFile(String),

    /// The file has no header row.
    #[error("{0} is missing a header row")]
    MissingHeader(String),

    /// The header row or the underlying reader failed.
    #[error("failed to read {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// The archive entry could not be opened.
    #[error("failed to open {file} in archive: {source}")]
    Zip {
        file: String,
        #[source]
        source: zip::result::ZipError,
    },
}
