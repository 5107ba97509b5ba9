//! Application state for the web layer.

use crate::store::TableStore;

/// Shared application state.
///
/// Handlers read from the store; only the refresh worker writes to it.
#[derive(Clone)]
pub struct AppState {
    /// Latest successfully loaded tables
    pub store: TableStore,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: TableStore) -> Self {
        Self { store }
    }
}
