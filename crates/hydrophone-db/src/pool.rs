//! Database connection management.
//!
//! The service talks to the store through two handles, a reader and a writer,
//! each backed by its own connection pool. Handles dial lazily on first use
//! and redial when a ping fails. A failed dial leaves the handle empty, reported
//! as `NilDatabaseClient`, so the next caller tries again. A ping that times out
//! is `DatabaseUnavailable`. Every dial, ping and close is bounded by its own
//! fresh timeout.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use hydrophone_core::defaults::{DB_MAX_CONNECTIONS, DIAL_TIMEOUT};
use hydrophone_core::{Error, Result};

/// Default idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Pool configuration options.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Bound on each dial, ping and close.
    pub dial_timeout: Duration,
    /// Idle connection timeout duration.
    pub idle_timeout: Duration,
    /// Maximum connection lifetime.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            min_connections: 1,
            dial_timeout: DIAL_TIMEOUT,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }
}

/// Run `fut` under a fresh `limit`; elapsing maps to `DatabaseUnavailable`.
async fn bounded<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::DatabaseUnavailable)?
}

/// Dial a PostgreSQL connection pool.
pub async fn create_pool_with_config(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.dial_timeout)
        .idle_timeout(config.idle_timeout);

    if let Some(max_lifetime) = config.max_lifetime {
        options = options.max_lifetime(max_lifetime);
    }

    let pool = bounded(config.dial_timeout, async {
        options.connect(database_url).await.map_err(Error::Database)
    })
    .await?;

    debug!(
        subsystem = "db",
        component = "pool",
        op = "dial",
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Which side of the store a handle talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRole {
    Reader,
    Writer,
}

impl fmt::Display for HandleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => write!(f, "reader"),
            Self::Writer => write!(f, "writer"),
        }
    }
}

/// A dialed pool tagged with the dial that produced it.
#[derive(Clone)]
struct Dialed {
    generation: u64,
    pool: PgPool,
}

/// One lazily dialed, self-refreshing connection pool.
pub struct DbHandle {
    role: HandleRole,
    uri: String,
    config: PoolConfig,
    slot: RwLock<Option<Dialed>>,
    // Serializes redials; holds the last generation handed out.
    redial: Mutex<u64>,
}

impl DbHandle {
    pub fn new(role: HandleRole, uri: impl Into<String>, config: PoolConfig) -> Self {
        Self {
            role,
            uri: uri.into(),
            config,
            slot: RwLock::new(None),
            redial: Mutex::new(0),
        }
    }

    pub fn role(&self) -> HandleRole {
        self.role
    }

    /// True once a dial has succeeded and not been dropped since.
    pub async fn is_connected(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// A live pool, dialing or redialing as needed.
    pub async fn pool(&self) -> Result<PgPool> {
        let current = self.slot.read().await.clone();
        match current {
            Some(dialed) => match self.ping_pool(&dialed.pool).await {
                Ok(()) => Ok(dialed.pool),
                Err(e) => {
                    warn!(
                        subsystem = "db",
                        component = "pool",
                        handle = %self.role,
                        error = %e,
                        "Ping failed, redialing"
                    );
                    self.redial(Some(dialed.generation)).await
                }
            },
            None => self.redial(None).await,
        }
    }

    /// Ping the store through this handle, redialing on failure.
    pub async fn ping(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    async fn ping_pool(&self, pool: &PgPool) -> Result<()> {
        bounded(self.config.dial_timeout, async {
            sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(Error::Database)
        })
        .await
    }

    /// Dial a new pool unless another caller already replaced the one that
    /// failed (`stale`).
    async fn redial(&self, stale: Option<u64>) -> Result<PgPool> {
        let mut generation = self.redial.lock().await;

        if let Some(dialed) = self.slot.read().await.as_ref() {
            if stale != Some(dialed.generation) {
                return Ok(dialed.pool.clone());
            }
        }

        match create_pool_with_config(&self.uri, &self.config).await {
            Ok(pool) => {
                *generation += 1;
                let fresh = Dialed {
                    generation: *generation,
                    pool: pool.clone(),
                };
                let previous = self.slot.write().await.replace(fresh);
                if let Some(old) = previous {
                    let _ = tokio::time::timeout(self.config.dial_timeout, old.pool.close()).await;
                }
                info!(
                    subsystem = "db",
                    component = "pool",
                    handle = %self.role,
                    "Database handle connected"
                );
                Ok(pool)
            }
            Err(e) => {
                self.slot.write().await.take();
                warn!(
                    subsystem = "db",
                    component = "pool",
                    handle = %self.role,
                    error = %e,
                    "Database dial failed"
                );
                Err(Error::NilDatabaseClient)
            }
        }
    }

    /// Close the pool, if any, within a fresh timeout.
    pub async fn close(&self) {
        let taken = self.slot.write().await.take();
        if let Some(dialed) = taken {
            let closed = tokio::time::timeout(self.config.dial_timeout, dialed.pool.close()).await;
            if closed.is_err() {
                warn!(subsystem = "db", component = "pool", handle = %self.role, "Close timed out");
            }
        }
    }
}

/// The reader and writer handles shared by the whole process.
pub struct DatabaseHandles {
    reader: DbHandle,
    writer: DbHandle,
}

impl DatabaseHandles {
    pub fn new(reader_uri: &str, writer_uri: &str, config: PoolConfig) -> Self {
        Self {
            reader: DbHandle::new(HandleRole::Reader, reader_uri, config.clone()),
            writer: DbHandle::new(HandleRole::Writer, writer_uri, config),
        }
    }

    pub fn reader(&self) -> &DbHandle {
        &self.reader
    }

    pub fn writer(&self) -> &DbHandle {
        &self.writer
    }

    /// Ping both handles; the first failure wins.
    pub async fn ping(&self) -> Result<()> {
        self.reader.ping().await?;
        self.writer.ping().await
    }

    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
        info!(subsystem = "db", component = "pool", "Database handles closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_builder() {
        let config = PoolConfig::new()
            .max_connections(20)
            .min_connections(0)
            .dial_timeout(Duration::from_secs(2));

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 0);
        assert_eq!(config.dial_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_default_dial_timeout_is_five_seconds() {
        assert_eq!(PoolConfig::default().dial_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_bounded_maps_elapsed_to_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, Error>(())
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, Error::DatabaseUnavailable));
    }

    #[tokio::test]
    async fn test_failed_dial_leaves_handle_empty() {
        // Nothing listens on port 1; the dial fails fast.
        let config = PoolConfig::new().dial_timeout(Duration::from_millis(500));
        let handle = DbHandle::new(HandleRole::Reader, "postgres://user:pw@127.0.0.1:1/db", config);

        let err = handle.pool().await.unwrap_err();
        assert!(matches!(err, Error::NilDatabaseClient));
        assert!(!handle.is_connected().await);

        // A second attempt dials again rather than reusing a broken pool.
        assert!(handle.ping().await.is_err());
        assert!(!handle.is_connected().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failed_dials_leave_no_generation() {
        let config = PoolConfig::new().dial_timeout(Duration::from_millis(500));
        let handle = std::sync::Arc::new(DbHandle::new(
            HandleRole::Writer,
            "postgres://user:pw@127.0.0.1:1/db",
            config,
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.pool().await })
            })
            .collect();
        for task in tasks {
            let result = task.await.unwrap();
            assert!(matches!(result, Err(Error::NilDatabaseClient)));
        }
        assert_eq!(*handle.redial.lock().await, 0);
        assert!(!handle.is_connected().await);
    }

    async fn generation(handle: &DbHandle) -> Option<u64> {
        handle.slot.read().await.as_ref().map(|d| d.generation)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_redials_replace_a_stale_pool_once() {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let handle = std::sync::Arc::new(DbHandle::new(HandleRole::Reader, url, PoolConfig::new()));

        // First use: many callers, one dial.
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.pool().await.map(|_| ()) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(generation(&handle).await, Some(1));

        // Every caller saw generation 1 fail; only the first redial replaces it.
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.redial(Some(1)).await.map(|_| ()) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(generation(&handle).await, Some(2));
        assert_eq!(*handle.redial.lock().await, 2);

        handle.close().await;
    }

    #[tokio::test]
    async fn test_close_without_dial_is_noop() {
        let handles = DatabaseHandles::new("postgres://a", "postgres://b", PoolConfig::default());
        handles.close().await;
        assert!(!handles.reader().is_connected().await);
        assert_eq!(handles.writer().role(), HandleRole::Writer);
    }
}
