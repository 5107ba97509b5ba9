//! GTFS schedule server.
//!
//! Serves the routes, stops and trips of a public transit feed as read-only
//! JSON, and answers "which stops, in order, does route X visit". The feed
//! archive is re-fetched on a fixed interval and kept in memory.

pub mod config;
pub mod feed;
pub mod query;
pub mod refresh;
pub mod store;
pub mod table;
pub mod web;
