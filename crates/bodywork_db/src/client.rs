//! Database client for the schedule store
//!
//! Wraps a `sqlx::Any` pool so the repositories stay agnostic of the driver.

use crate::error::DbError;
use bodywork_config::DatabaseConfig;
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database client
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
    sqlite: bool,
}

impl DbClient {
    /// Create a new database client from a database configuration
    ///
    /// # Errors
    ///
    /// * The database URL is empty
    /// * The database connection fails
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        let db_url = db_config.url.trim();
        if db_url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        let max_connections = db_config
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
            .max(1);
        Self::connect(db_url, max_connections).await
    }

    /// Create a new database client from a database URL with the default pool size
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.trim().is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        Self::connect(db_url.trim(), DEFAULT_MAX_CONNECTIONS).await
    }

    async fn connect(db_url: &str, max_connections: u32) -> Result<Self, DbError> {
        debug!("Creating database pool");

        sqlx::any::install_default_drivers();

        let sqlite = db_url.starts_with("sqlite:");
        let in_memory = sqlite && is_memory_url(db_url);

        // Every connection to `sqlite::memory:` opens its own database, so the pool keeps
        // exactly one that is never closed.
        let pool_options = if in_memory {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        if sqlite && !in_memory {
            ensure_sqlite_file(db_url)?;
        }

        let options = sqlx::any::AnyConnectOptions::from_str(db_url).map_err(|e| {
            error!("Invalid database URL: {}", e);
            DbError::ConfigError(format!("Invalid database URL: {}", e))
        })?;

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            error!("Failed to create database pool: {}", e);
            DbError::PoolError(e.to_string())
        })?;

        info!(in_memory, "Database pool created successfully");
        Ok(Self { pool, sqlite })
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// `true` when the pool talks to SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.sqlite
    }

    /// Execute a statement that returns no rows, returning the number of rows affected
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(DbError::from_query)
    }

    /// Check if the database is healthy by executing a simple query.
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}

fn is_memory_url(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Strips the scheme and query of a SQLite URL, leaving the file path.
fn sqlite_path(db_url: &str) -> &str {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);
    path.split('?').next().unwrap_or(path)
}

/// Creates the parent directory and an empty database file, since `AnyConnectOptions`
/// can not set `create_if_missing`.
fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
    let db_path = sqlite_path(db_url);
    if db_path.is_empty() {
        return Err(DbError::ConfigError(
            "SQLite URL does not name a file".to_string(),
        ));
    }

    let path = Path::new(db_path);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("Creating directory for SQLite database: {:?}", dir);
            std::fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory for SQLite database: {}", e);
                DbError::PoolError(format!("Failed to create directory: {}", e))
            })?;
        }
    }

    if !path.exists() {
        debug!("Creating empty SQLite database file: {}", db_path);
        std::fs::File::create(path).map_err(|e| {
            error!("Failed to create SQLite database file: {}", e);
            DbError::PoolError(format!("Failed to create database file: {}", e))
        })?;
    }
    Ok(())
}
