//! Service configuration.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

use crate::feed::FeedConfig;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;

/// Environment variable holding the feed URL.
pub const ENV_URL: &str = "GTFS_URL";
/// Environment variable holding the refresh interval in seconds.
pub const ENV_REFRESH_SECS: &str = "GTFS_REFRESH_SECS";
/// Environment variable holding the fetch timeout in seconds.
pub const ENV_FETCH_TIMEOUT_SECS: &str = "GTFS_FETCH_TIMEOUT_SECS";
/// Environment variable holding the listen address.
pub const ENV_BIND_ADDR: &str = "GTFS_BIND_ADDR";

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Top-level configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Where and how to fetch the archive.
    pub feed: FeedConfig,

    /// Delay between the end of one refresh cycle and the next.
    pub refresh_interval: Duration,

    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
        }
    }
}

impl ServiceConfig {
    /// Set the feed configuration.
    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the listen address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// Unset variables keep their defaults. Malformed values are logged and
    /// ignored. Durations must be whole, non-zero seconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL).filter(|u| !u.trim().is_empty()) {
            config.feed.source_url = url.trim().to_string();
        }

        if let Some(interval) = parse_secs(&lookup, ENV_REFRESH_SECS) {
            config.refresh_interval = interval;
        }

        if let Some(timeout) = parse_secs(&lookup, ENV_FETCH_TIMEOUT_SECS) {
            config.feed.timeout = timeout;
        }

        if let Some(raw) = lookup(ENV_BIND_ADDR) {
            match raw.trim().parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(var = ENV_BIND_ADDR, value = %raw, error = %e, "ignoring invalid address"),
            }
        }

        config
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!(var = key, "ignoring zero duration");
            None
        }
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!(var = key, value = %raw, error = %e, "ignoring invalid duration");
            None
        }
    }
}
