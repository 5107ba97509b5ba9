//! Remote GTFS archive access.
//!
//! The feed is a ZIP of comma-separated text files published at a fixed URL.
//! Fetching is network I/O; decoding and parsing are CPU-bound and are run on
//! a blocking thread by the refresh worker.

mod archive;
mod client;
mod error;
mod mock;

use std::future::Future;

use bytes::Bytes;

pub use archive::{DecodedFeed, FeedArchive, decode_archive};
pub use client::{DEFAULT_FEED_URL, FeedClient, FeedConfig};
pub use error::FeedError;
pub use mock::{MockFeed, build_archive};

/// A source of GTFS archive bytes.
///
/// Implemented by [`FeedClient`] for the real feed and by [`MockFeed`] for
/// tests.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch the complete archive.
    fn fetch(&self) -> impl Future<Output = Result<Bytes, FeedError>> + Send;
}
