//! Feed error types.

/// Errors that fail a whole refresh cycle.
///
/// Per-file problems are reported separately as
/// [`ParseError`](crate::table::ParseError) and do not fail the cycle.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed server returned a non-success status
    #[error("feed returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Fetched bytes are not a readable ZIP archive
    #[error("failed to decode archive: {0}")]
    Decode(#[from] zip::result::ZipError),

    /// The blocking decode task panicked or was cancelled
    #[error("decode task failed: {0}")]
    Task(String),

    /// The HTTP client could not be built
    #[error("invalid feed configuration: {0}")]
    Config(String),
}
