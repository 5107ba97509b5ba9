//! Read-only queries over a store snapshot.
//!
//! Every function here takes a [`StoreSnapshot`](crate::store::StoreSnapshot)
//! so that a request works against one consistent set of tables, even if a
//! refresh installs new tables while the request is running.

mod engine;
mod error;

pub use engine::{JsonRow, RouteStop, list_table, stops_for_route};
pub use error::QueryError;
