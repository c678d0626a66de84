//! SQLite connection management
//!
//! Uses a simple Arc<Mutex<Connection>> pattern; the harness is single
//! threaded, the mutex only makes the pool `Sync` for callers that share it.

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Thread-safe SQLite connection wrapper
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl std::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("config", &self.config)
            .finish()
    }
}

impl SqlitePool {
    /// Open (or create) the database, configure pragmas and apply the schema
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, journal = ?config.journal_mode, "Opening SQLite database");

        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SqliteError::Connection(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(&config.path).map_err(|e| {
                SqliteError::Connection(format!(
                    "Failed to open {}: {}",
                    config.path.display(),
                    e
                ))
            })?
        };

        let sqlite_pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };

        // Configure and apply schema
        sqlite_pool.initialize()?;

        Ok(sqlite_pool)
    }

    /// Create an in-memory pool for testing
    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    /// Execute a closure with the connection
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access to the connection
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    /// Initialize the database (configure pragmas and apply schema)
    fn initialize(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;

            schema::apply_migrations(conn)?;

            info!("SQLite database initialized successfully");
            Ok(())
        })
    }

    /// Configure journal, durability and cache pragmas
    fn configure_pragmas(&self, conn: &Connection) -> SqliteResult<()> {
        debug!("Configuring SQLite pragmas");

        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;

        // journal_mode returns the mode actually in effect
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            self.config.journal_mode.pragma_value(),
            |row| row.get(0),
        )?;
        debug!(journal_mode = %mode, "Journal mode set");

        conn.pragma_update(None, "synchronous", self.config.journal_mode.synchronous())?;
        conn.pragma_update(None, "cache_size", self.config.cache_size)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        Ok(())
    }

    /// Run `PRAGMA integrity_check` and return its rows joined by newlines
    ///
    /// A healthy database yields exactly `ok`.
    pub fn integrity_check(&self) -> SqliteResult<String> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows.join("\n"))
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> SqliteResult<DbStats> {
        self.with_connection(|conn| {
            let page_count: i64 = conn.query_row("PRAGMA page_count;", [], |row| row.get(0))?;

            let page_size: i64 = conn.query_row("PRAGMA page_size;", [], |row| row.get(0))?;

            let freelist_count: i64 =
                conn.query_row("PRAGMA freelist_count;", [], |row| row.get(0))?;

            Ok(DbStats {
                page_count: page_count as u64,
                page_size: page_size as u64,
                freelist_count: freelist_count as u64,
                total_size_bytes: (page_count * page_size) as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub page_count: u64,
    pub page_size: u64,
    pub freelist_count: u64,
    pub total_size_bytes: u64,
}
