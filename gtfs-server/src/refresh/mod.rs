//! Background refresh of the table store.
//!
//! One task owns the refresh loop: fetch the archive, decode and parse it on
//! a blocking thread, install the parsed tables, then wait a fixed interval.
//! There is no backoff; a failed cycle is simply retried on the next tick
//! while the store keeps serving the last good tables.

mod worker;

pub use worker::{
    CycleOutcome, DEFAULT_REFRESH_INTERVAL, RefreshHandle, RefreshPhase, RefreshWorker,
};
