//! In-memory store of the latest GTFS tables.
//!
//! Each table is held behind an `Arc` and replaced wholesale, so a reader
//! holding a table never sees it change. A refresh cycle installs all of its
//! tables under a single write lock; a [`StoreSnapshot`] taken under the read
//! lock therefore never straddles two installs.
//!
//! Tables that failed to parse in the latest cycle keep the contents of
//! their own last successful refresh, so a snapshot may mix tables from
//! different cycles.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::table::{Table, TableName};

/// A consistent view of the store for the duration of one request.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    tables: HashMap<TableName, Arc<Table>>,
}

impl StoreSnapshot {
    /// Build a snapshot directly from tables (for tests and tools).
    pub fn from_tables(tables: impl IntoIterator<Item = (TableName, Table)>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(name, table)| (name, Arc::new(table)))
                .collect(),
        }
    }

    pub fn get(&self, name: TableName) -> Option<&Arc<Table>> {
        self.tables.get(&name)
    }

    /// Names of the tables present, in a stable order.
    pub fn table_names(&self) -> Vec<TableName> {
        let mut names: Vec<_> = self.tables.keys().copied().collect();
        names.sort();
        names
    }
}

/// Refresh metadata reported by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    /// Row counts of the loaded tables.
    pub tables: BTreeMap<TableName, usize>,
    /// When a cycle last installed at least one table.
    pub last_refresh_time: Option<DateTime<Utc>>,
    /// Error of the last cycle, cleared by a cycle without errors.
    pub last_error: Option<String>,
    /// Per-file errors of the last cycle that reached the parsing phase.
    pub file_errors: BTreeMap<TableName, String>,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: HashMap<TableName, Arc<Table>>,
    last_refresh_time: Option<DateTime<Utc>>,
    last_error: Option<String>,
    file_errors: BTreeMap<TableName, String>,
    archive_entries: Option<Vec<String>>,
}

/// Thread-safe store of the most recent successfully parsed tables.
///
/// Cloning is cheap and shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current version of a table.
    ///
    /// Returns `None` if the table has never been loaded.
    pub async fn get(&self, name: TableName) -> Option<Arc<Table>> {
        let guard = self.inner.read().await;
        guard.tables.get(&name).cloned()
    }

    /// Replace a single table.
    pub async fn replace(&self, name: TableName, table: Table) {
        let mut guard = self.inner.write().await;
        guard.tables.insert(name, Arc::new(table));
    }

    /// Install the results of one refresh cycle.
    ///
    /// Every table in `tables` replaces its previous version; tables not
    /// listed are left untouched. `file_errors` describes the files that
    /// failed this cycle. `last_error` is cleared only when no file failed.
    pub async fn install(
        &self,
        tables: Vec<(TableName, Table)>,
        file_errors: BTreeMap<TableName, String>,
        archive_entries: Vec<String>,
        at: DateTime<Utc>,
    ) {
        let mut guard = self.inner.write().await;
        let installed_any = !tables.is_empty();

        for (name, table) in tables {
            guard.tables.insert(name, Arc::new(table));
        }

        if installed_any {
            guard.last_refresh_time = Some(at);
        }
        guard.last_error = summarize_file_errors(&file_errors);
        guard.file_errors = file_errors;
        guard.archive_entries = Some(archive_entries);
    }

    /// Record a failed cycle. Tables are untouched.
    pub async fn record_failure(&self, message: impl Into<String>) {
        let mut guard = self.inner.write().await;
        guard.last_error = Some(message.into());
    }

    /// Take a snapshot of every loaded table.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let guard = self.inner.read().await;
        StoreSnapshot {
            tables: guard.tables.clone(),
        }
    }

    /// Current refresh metadata.
    pub async fn status(&self) -> RefreshStatus {
        let guard = self.inner.read().await;
        RefreshStatus {
            tables: guard
                .tables
                .iter()
                .map(|(name, table)| (*name, table.len()))
                .collect(),
            last_refresh_time: guard.last_refresh_time,
            last_error: guard.last_error.clone(),
            file_errors: guard.file_errors.clone(),
        }
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Entry names of the last successfully decoded archive.
    pub async fn archive_entries(&self) -> Option<Vec<String>> {
        self.inner.read().await.archive_entries.clone()
    }
}

fn summarize_file_errors(errors: &BTreeMap<TableName, String>) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let parts: Vec<String> = errors
        .iter()
        .map(|(name, message)| format!("{name}: {message}"))
        .collect();
    Some(parts.join("; "))
}
