//! Database connection and operations

pub mod authors;
pub mod books;
pub mod schema_sync;
pub mod sqlite_helpers;
pub mod users;
pub mod validation;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

pub use authors::{AuthorRecord, AuthorRepository};
pub use books::{BookFilter, BookRecord, BookRepository, CreateBook};
pub use schema_sync::SchemaSyncResult;
pub use users::{CreateUser, UserRecord, UsersRepository};
pub use validation::{Validate, ValidationError};

/// Errors returned by the persistence layer
#[derive(Debug, Error)]
pub enum DbError {
    /// A record failed its field rules before being written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A unique index rejected the write
    #[error("{field} must be unique")]
    Conflict { field: &'static str },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// True for failures caused by the caller's input rather than the store
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DbError::Validation(_) | DbError::Conflict { .. } | DbError::NotFound { .. }
        )
    }
}

/// Map a unique-index violation to [DbError::Conflict] on `field`
pub(crate) fn conflict_on(err: sqlx::Error, field: &'static str) -> DbError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DbError::Conflict { field }
        }
        _ => DbError::Sqlx(err),
    }
}

/// How long a writer waits for the SQLite write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool, creating the file if missing
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Connect to a private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get an authors repository
    pub fn authors(&self) -> AuthorRepository {
        AuthorRepository::new(self.pool.clone())
    }

    /// Get a books repository
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Start a write transaction; it rolls back when dropped without commit.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so concurrent
    /// writers wait on the busy timeout instead of failing on lock upgrade.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DbError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Create missing tables and indexes
    pub async fn migrate(&self) -> Result<SchemaSyncResult> {
        schema_sync::sync_schema(&self.pool)
            .await
            .context("Schema sync failed")
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
