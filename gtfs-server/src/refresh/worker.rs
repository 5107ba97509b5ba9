//! The background refresh loop.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::feed::{DecodedFeed, FeedError, FeedSource, decode_archive};
use crate::store::TableStore;
use crate::table::TableName;

/// Default delay between the end of one cycle and the start of the next.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Phases of a refresh cycle, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Decoding,
    Parsing,
    Installing,
    Failed,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::Fetching => "fetching",
            RefreshPhase::Decoding => "decoding",
            RefreshPhase::Parsing => "parsing",
            RefreshPhase::Installing => "installing",
            RefreshPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one call to [`RefreshWorker::refresh_once`].
#[derive(Debug)]
pub enum CycleOutcome {
    /// The archive was decoded and the listed tables were installed.
    /// `errors` holds the files that failed and kept their old contents.
    Installed {
        tables: Vec<TableName>,
        errors: BTreeMap<TableName, String>,
    },
    /// Fetch or decode failed; the store's tables are unchanged.
    Failed(FeedError),
    /// Another cycle was already in flight.
    Skipped,
}

/// Periodically fetches the feed and installs its tables into the store.
pub struct RefreshWorker<S> {
    source: Arc<S>,
    store: TableStore,
    interval: Duration,
    cycle_lock: Mutex<()>,
}

impl<S: FeedSource> RefreshWorker<S> {
    /// Create a worker with the default interval.
    pub fn new(source: S, store: TableStore) -> Self {
        Self {
            source: Arc::new(source),
            store,
            interval: DEFAULT_REFRESH_INTERVAL,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Set the delay between cycles.
    ///
    /// A zero interval is ignored and the current one kept.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(
                interval_secs = self.interval.as_secs(),
                "ignoring zero refresh interval"
            );
        } else {
            self.interval = interval;
        }
        self
    }

    /// Run a single refresh cycle.
    ///
    /// Returns [`CycleOutcome::Skipped`] without doing anything if another
    /// cycle is running. Failures are recorded in the store and returned,
    /// never propagated as panics.
    pub async fn refresh_once(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            debug!("refresh already in flight, skipping");
            return CycleOutcome::Skipped;
        };

        match self.run_cycle().await {
            Ok(outcome) => {
                debug!(phase = %RefreshPhase::Idle, "refresh cycle complete");
                outcome
            }
            Err(e) => {
                error!(phase = %RefreshPhase::Failed, error = %e, "refresh cycle failed");
                self.store.record_failure(e.to_string()).await;
                CycleOutcome::Failed(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<CycleOutcome, FeedError> {
        debug!(phase = %RefreshPhase::Fetching, "refresh cycle started");
        let bytes = self.source.fetch().await?;

        debug!(phase = %RefreshPhase::Decoding, bytes = bytes.len(), "archive fetched");
        let decoded = tokio::task::spawn_blocking(move || decode_archive(bytes))
            .await
            .map_err(|e| FeedError::Task(e.to_string()))??;

        debug!(phase = %RefreshPhase::Installing, tables = decoded.tables.len(), "tables parsed");
        Ok(self.install(decoded).await)
    }

    async fn install(&self, decoded: DecodedFeed) -> CycleOutcome {
        let DecodedFeed {
            entries,
            tables,
            errors,
        } = decoded;

        let errors: BTreeMap<TableName, String> = errors
            .into_iter()
            .map(|(name, e)| {
                warn!(table = %name, error = %e, "keeping previous table");
                (name, e.to_string())
            })
            .collect();

        let names: Vec<TableName> = tables.iter().map(|(name, _)| *name).collect();
        for (name, table) in &tables {
            info!(table = %name, rows = table.len(), "installing table");
        }

        self.store
            .install(tables, errors.clone(), entries, Utc::now())
            .await;

        CycleOutcome::Installed {
            tables: names,
            errors,
        }
    }

    /// Start the refresh loop on the tokio runtime.
    ///
    /// The first cycle runs immediately. Each later cycle starts one interval
    /// after the previous one finished, whatever its outcome.
    pub fn spawn(self) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        RefreshHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "refresh worker started");
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh_once().await;
                    interval.reset();
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("refresh worker stopped");
    }
}

/// Handle to a running refresh loop.
///
/// Dropping the handle also stops the loop after its current cycle.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the loop and wait for it to exit.
    ///
    /// A cycle that is already running completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "refresh worker task failed");
        }
    }
}
