//! Web layer for the GTFS schedule server.
//!
//! Provides read-only JSON endpoints over the table store.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
