//! In-memory feed source for testing without network access.
//!
//! Serves queued archives or HTTP failures as if they came from the remote
//! server.

use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::FeedSource;
use super::error::FeedError;

/// Build a ZIP archive from `(entry name, contents)` pairs.
pub fn build_archive(files: &[(&str, &str)]) -> Result<Bytes, FeedError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer
            .write_all(contents.as_bytes())
            .map_err(|e| FeedError::Decode(e.into()))?;
    }
    let cursor = writer.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}

#[derive(Debug, Clone)]
enum MockResponse {
    Archive(Bytes),
    Status(u16),
}

/// Feed source that replays queued responses.
///
/// Once the queue holds a single response, that response is repeated for
/// every later fetch. An empty queue answers with status 503.
#[derive(Debug, Clone, Default)]
pub struct MockFeed {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an archive to be served.
    pub fn push_archive(&self, bytes: Bytes) {
        self.push(MockResponse::Archive(bytes));
    }

    /// Queue an HTTP failure with the given status code.
    pub fn push_status(&self, status: u16) {
        self.push(MockResponse::Status(status));
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn push(&self, response: MockResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    fn next_response(&self) -> Option<MockResponse> {
        let mut queue = self.responses.lock().ok()?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl FeedSource for MockFeed {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.next_response() {
            Some(MockResponse::Archive(bytes)) => Ok(bytes),
            Some(MockResponse::Status(status)) => Err(FeedError::Status {
                status,
                message: "mock failure".to_string(),
            }),
            None => Err(FeedError::Status {
                status: 503,
                message: "no mock response queued".to_string(),
            }),
        }
    }
}
