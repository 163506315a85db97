//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Service Startup                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from_env() ← INVOICER_DB_* variables, or DbConfig::new()    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ One connection per repository call, released on every exit    │
//! │       ▼                                                                 │
//! │  Request 1 ──► db.documents().create(..)                               │
//! │  Request 2 ──► db.documents().list(..)                                 │
//! │  Request 3 ──► db.taxes().delete(..)                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers
//! - Better crash recovery

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::address::AddressRepository;
use crate::repository::client::ClientRepository;
use crate::repository::document::DocumentRepository;
use crate::repository::product::ProductRepository;
use crate::repository::tax::TaxRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Environment variable names read by [`DbConfig::from_env`].
pub const ENV_DB_PATH: &str = "INVOICER_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "INVOICER_DB_MAX_CONNECTIONS";
pub const ENV_MIN_CONNECTIONS: &str = "INVOICER_DB_MIN_CONNECTIONS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "INVOICER_DB_CONNECT_TIMEOUT_SECS";
pub const ENV_RUN_MIGRATIONS: &str = "INVOICER_DB_RUN_MIGRATIONS";

/// Configuration error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/invoicer.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Loads configuration from `INVOICER_DB_*` environment variables.
    ///
    /// Unset variables keep the defaults of [`DbConfig::new`]; the path
    /// defaults to `./invoicer.db`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`DbConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        fn parsed<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
            default: T,
        ) -> Result<T, ConfigError> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(name.to_string())),
                None => Ok(default),
            }
        }

        let defaults = DbConfig::new(
            lookup(ENV_DB_PATH).unwrap_or_else(|| "invoicer.db".to_string()),
        );

        let config = DbConfig {
            max_connections: parsed(&lookup, ENV_MAX_CONNECTIONS, defaults.max_connections)?,
            min_connections: parsed(&lookup, ENV_MIN_CONNECTIONS, defaults.min_connections)?,
            connect_timeout: Duration::from_secs(parsed(
                &lookup,
                ENV_CONNECT_TIMEOUT_SECS,
                defaults.connect_timeout.as_secs(),
            )?),
            run_migrations: parsed(&lookup, ENV_RUN_MIGRATIONS, defaults.run_migrations)?,
            ..defaults
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::PoolBounds {
                min: config.min_connections,
                max: config.max_connections,
            });
        }

        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap; every clone shares the same pool.
///
/// ## Usage in a Handler
/// ```rust,ignore
/// async fn create_invoice(
///     db: &Database,
///     tenant_id: &str,
///     body: CreateDocumentRequest,
/// ) -> Result<DocumentView, ApiError> {
///     let new = body.into_new_document(DocumentKind::Invoice)?;
///     let created = db.documents().create(tenant_id, new).await?;
///     Ok(DocumentView::from(&created))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // Build connection options
        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // WAL mode: list and dashboard reads don't block document writes
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: no corruption on crash, the last
            // committed transaction may be lost
            .synchronous(SqliteSynchronous::Normal)
            // Enable foreign key constraints (line items, products, clients)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            // Create file if it doesn't exist
            .create_if_missing(true);

        debug!("Connection options configured");

        // Build the pool
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        // Run migrations if enabled
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Called by `new()` when `run_migrations` is true. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the document repository (invoices, quotes, purchase invoices).
    ///
    /// ## Example
    /// ```rust,ignore
    /// let invoice = db.documents().convert_quote_to_invoice(tenant, &quote_id).await?;
    /// ```
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }

    /// Returns the tax repository.
    pub fn taxes(&self) -> TaxRepository {
        TaxRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the client repository.
    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    /// Returns the address repository.
    pub fn addresses(&self) -> AddressRepository {
        AddressRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }

    #[test]
    fn test_from_env_defaults() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("invoicer.db"));
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_from_env_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/invoicer/data.db"),
            (ENV_MAX_CONNECTIONS, "12"),
            (ENV_MIN_CONNECTIONS, "3"),
            (ENV_CONNECT_TIMEOUT_SECS, "7"),
            (ENV_RUN_MIGRATIONS, "false"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/invoicer/data.db"));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.min_connections, 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(7));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_from_env_rejects_bad_values() {
        let err = DbConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "many")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));

        let err = DbConfig::from_lookup(lookup(&[
            (ENV_MAX_CONNECTIONS, "2"),
            (ENV_MIN_CONNECTIONS, "4"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::PoolBounds { min: 4, max: 2 });
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);

        // An address for a client that does not exist
        let err = sqlx::query(
            "INSERT INTO addresses (id, tenant_id, client_id, street, city, state, country, post_code, created_at, updated_at) \
             VALUES ('a1', 't1', 'missing', 's', 'c', 'st', 'co', 'p', '2024-01-01', '2024-01-01')",
        )
        .execute(db.pool())
        .await
        .unwrap_err();
        assert!(matches!(DbError::from(err), DbError::ForeignKeyViolation { .. }));
        assert!(db.health_check().await);
    }
}
