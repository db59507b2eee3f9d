//! Startup configuration read from the `HOSTS_*` environment namespace.

use std::net::SocketAddr;

use hydrophone_core::defaults::LISTEN_ADDRESS;
use hydrophone_core::{Error, Result};

pub const ENV_DB_READER_URI: &str = "HOSTS_DB_READER_URI";
pub const ENV_DB_WRITER_URI: &str = "HOSTS_DB_WRITER_URI";
pub const ENV_LISTEN_ADDRESS: &str = "HOSTS_LISTEN_ADDRESS";

/// Where the service listens and which stores it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsConfig {
    pub db_reader_uri: String,
    pub db_writer_uri: String,
    pub listen_address: SocketAddr,
}

impl HostsConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, so callers can supply values without touching
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} must be set and non-empty")))
        };

        let db_reader_uri = required(ENV_DB_READER_URI)?;
        let db_writer_uri = required(ENV_DB_WRITER_URI)?;

        let listen = lookup(ENV_LISTEN_ADDRESS)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| LISTEN_ADDRESS.to_string());
        let listen_address = listen
            .parse()
            .map_err(|e| Error::Config(format!("{ENV_LISTEN_ADDRESS} {listen:?}: {e}")))?;

        Ok(Self {
            db_reader_uri,
            db_writer_uri,
            listen_address,
        })
    }
}
