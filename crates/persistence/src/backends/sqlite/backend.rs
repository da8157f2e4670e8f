//! SQLite backend implementation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, InterruptHandle};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::invalid;
use crate::context::RequestContext;
use crate::core::{Backend, BackendKind};
use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;

/// SQLite backend for node/property storage.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    is_memory: bool,
    /// Type name to type id, filled lazily by `ensure_type`.
    pub(super) type_cache: Arc<RwLock<HashMap<String, i64>>>,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .field("cached_types", &self.type_cache.read().len())
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool. In-memory databases always
    /// use a single connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteBackendConfig {
    /// Checks that the pool settings are usable.
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_connections == 0 {
            return Err(invalid("max_connections must be at least 1"));
        }
        if self.min_connections > self.max_connections {
            return Err(invalid("min_connections must not exceed max_connections"));
        }
        Ok(())
    }
}

/// Waits for a pooled connection, no longer than the request's deadline.
fn acquire(
    pool: &Pool<SqliteConnectionManager>,
    ctx: &RequestContext,
    limit: Duration,
) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
    let wait = match ctx.deadline() {
        Some(deadline) => limit.min(deadline.saturating_duration_since(Instant::now())),
        None => limit,
    };
    pool.get_timeout(wait)
        .map_err(|e| ctx.check().err().unwrap_or_else(|| e.into()))
}

fn internal(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

impl SqliteBackend {
    /// Creates a new in-memory SQLite backend with its schema initialised.
    pub fn in_memory() -> StorageResult<Self> {
        let backend = Self::with_config(":memory:", SqliteBackendConfig::default())?;
        backend.init_schema()?;
        Ok(backend)
    }

    /// Opens or creates a file-based SQLite database with its schema initialised.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let backend = Self::with_config(path, SqliteBackendConfig::default())?;
        backend.init_schema()?;
        Ok(backend)
    }

    /// Creates a backend with custom configuration.
    ///
    /// The schema is not touched; call [`SqliteBackend::init_schema`] or
    /// [`Backend::initialize`] before use.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        config.validate()?;

        let path_str = path.as_ref().to_string_lossy();
        let is_memory = path_str == ":memory:";

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms as u64);
        let foreign_keys = config.enable_foreign_keys;
        let wal = config.enable_wal && !is_memory;

        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };
        let manager = manager.with_init(move |conn: &mut Connection| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", foreign_keys)?;
            conn.pragma_update(None, "case_sensitive_like", true)?;
            if wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            Ok(())
        });

        // Every in-memory connection is a separate database, so the pool
        // holds exactly one connection for the backend's lifetime.
        let builder = if is_memory {
            Pool::builder()
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            Pool::builder()
                .max_size(config.max_connections)
                .min_idle(Some(config.min_connections))
        };

        let pool = builder
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    backend_name: "sqlite".to_string(),
                    message: e.to_string(),
                })
            })?;

        tracing::debug!(path = %path_str, is_memory, "Opened SQLite pool");

        Ok(Self {
            pool,
            config,
            is_memory,
            type_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    /// Get a connection from the pool.
    ///
    /// Blocks for up to the configured connection timeout; request paths go
    /// through [`SqliteBackend::run`] instead.
    pub(crate) fn get_connection(
        &self,
    ) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Runs blocking database work for one request.
    ///
    /// Both the wait for a pooled connection and the closure run on the
    /// blocking pool. If the request is cancelled or its deadline passes
    /// first, a statement already running is interrupted and the call waits
    /// for the closure to unwind, so any open transaction has been rolled back
    /// by the time the error is returned. A request still waiting for a
    /// connection returns at once; the connection it eventually gets is handed
    /// back untouched.
    pub(super) async fn run<T, F>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        work: F,
    ) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection, &RequestContext) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        ctx.check()?;
        let pool = self.pool.clone();
        let wait_limit = Duration::from_millis(self.config.connection_timeout_ms);
        let slot: Arc<Mutex<Option<InterruptHandle>>> = Arc::new(Mutex::new(None));
        let task_slot = Arc::clone(&slot);
        let task_ctx = ctx.clone();

        let mut task = tokio::task::spawn_blocking(move || {
            let mut conn = acquire(&pool, &task_ctx, wait_limit)?;
            {
                // A cancellation either finds the handle or is seen here.
                let mut slot = task_slot.lock();
                task_ctx.check()?;
                *slot = Some(conn.get_interrupt_handle());
            }
            work(&mut *conn, &task_ctx)
        });

        tokio::select! {
            joined = &mut task => {
                let result = joined.map_err(|e| internal(format!("sqlite task failed: {}", e)))?;
                // An interrupted statement or an abandoned pool wait surfaces
                // as a backend error; report it as the cancellation behind it.
                result.map_err(|e| ctx.check().err().unwrap_or(e))
            }
            reason = ctx.done() => {
                let Some(interrupt) = slot.lock().take() else {
                    tracing::warn!(
                        operation,
                        correlation_id = ctx.correlation_id().unwrap_or_default(),
                        reason = %reason,
                        "Abandoned wait for SQLite connection"
                    );
                    return Err(reason.into());
                };
                interrupt.interrupt();
                tracing::warn!(
                    operation,
                    correlation_id = ctx.correlation_id().unwrap_or_default(),
                    reason = %reason,
                    "Interrupting SQLite work"
                );
                match task.await {
                    // Finished before the interrupt took effect.
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(_)) => Err(reason.into()),
                    Err(e) => Err(internal(format!("sqlite task failed: {}", e))),
                }
            }
        }
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let conn = self
            .get_connection()
            .map_err(|_| BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: "Failed to get connection".to_string(),
            })?;

        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: format!("Health check failed: {}", e),
            })?;

        Ok(())
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.init_schema().map_err(|e| BackendError::SchemaError {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: SqliteBackendConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SqliteBackendConfig::default());
        assert_eq!(config.max_connections, 10);
        assert!(config.enable_wal);
    }

    #[test]
    fn test_config_validate() {
        let config = SqliteBackendConfig {
            max_connections: 2,
            min_connections: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SqliteBackend::with_config(":memory:", config).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_backend_is_healthy() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.is_memory());
        assert_eq!(backend.kind(), BackendKind::Sqlite);
        backend.health_check().await.unwrap();
        backend.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_rejects_cancelled_context() {
        let backend = SqliteBackend::in_memory().unwrap();
        let (ctx, handle) = RequestContext::cancellable();
        handle.cancel();

        let result = backend
            .run(&ctx, "noop", |_, _| Ok::<_, StorageError>(()))
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_run_returns_closure_value() {
        let backend = SqliteBackend::in_memory().unwrap();
        let value = backend
            .run(&RequestContext::new(), "select", |conn, _| {
                Ok(conn.query_row("SELECT 40 + 2", [], |row| row.get::<_, i64>(0))?)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    fn single_connection_backend() -> SqliteBackend {
        let config = SqliteBackendConfig {
            connection_timeout_ms: 3000,
            ..Default::default()
        };
        let backend = SqliteBackend::with_config(":memory:", config).unwrap();
        backend.init_schema().unwrap();
        backend
    }

    #[tokio::test]
    async fn test_deadline_honored_while_pool_is_busy() {
        let backend = single_connection_backend();
        let held = backend.get_connection().unwrap();

        let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = backend
            .run(&ctx, "select", |conn, _| {
                Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?)
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled(), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_millis(1500));
        drop(held);
    }

    #[tokio::test]
    async fn test_cancel_honored_while_pool_is_busy() {
        let backend = single_connection_backend();
        let held = backend.get_connection().unwrap();

        let (ctx, handle) = RequestContext::cancellable();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        let started = std::time::Instant::now();
        let err = backend
            .run(&ctx, "select", |conn, _| {
                Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?)
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled(), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_millis(1500));

        // The abandoned request hands its connection back once it gets one.
        drop(held);
        let value = backend
            .run(&RequestContext::new(), "select", |conn, _| {
                Ok(conn.query_row("SELECT 7", [], |row| row.get::<_, i64>(0))?)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_exhausted_pool_is_unavailable() {
        let config = SqliteBackendConfig {
            connection_timeout_ms: 50,
            ..Default::default()
        };
        let backend = SqliteBackend::with_config(":memory:", config).unwrap();
        let _held = backend.get_connection().unwrap();

        let err = backend.get_connection().unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::PoolExhausted { .. })
        ));
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_case_sensitive_like_enabled() {
        let backend = SqliteBackend::in_memory().unwrap();
        let conn = backend.get_connection().unwrap();
        let matched: bool = conn
            .query_row("SELECT 'ABC' LIKE 'abc'", [], |row| row.get(0))
            .unwrap();
        assert!(!matched);
    }
}
