//! Database module for persistent storage.
//!
//! Provides async SQLite access using SQLx for:
//! - Rooms and their membership rows (read markers included)
//! - Message, attachment, reaction and system events for room sync
//! - User profiles

mod rooms;
mod store;
mod users;

pub use rooms::RoomRepository;
pub use users::UserRepository;

use crate::store::StoreError;
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("member {user_id} not found in room {room_id}")]
    MemberNotFound { room_id: String, user_id: String },
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new database connection, running migrations if needed.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let (options, max_connections) = Self::connect_options(path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(Some(Self::IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(path = %path, max_connections, "Database connected");

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Per-connection options. Pragmas set here apply to every pooled
    /// connection, not just the first one.
    fn connect_options(path: &str) -> (SqliteConnectOptions, u32) {
        let base = SqliteConnectOptions::new()
            .create_if_missing(true)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal);

        if path == ":memory:" {
            // One named shared-cache database per call; a bare `:memory:`
            // would give every pooled connection its own empty database.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let uri = format!(
                "file:sputnikd-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );
            return (base.filename(uri).shared_cache(true), 1);
        }

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        // WAL lets room actors read while a read marker is being written.
        let options = base.filename(path).journal_mode(SqliteJournalMode::Wal);
        (options, 5)
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get room repository.
    pub fn rooms(&self) -> RoomRepository<'_> {
        RoomRepository::new(&self.pool)
    }

    /// Get user repository.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RoomNotFound(id) => StoreError::NotFound(format!("room {id}")),
            DbError::UserNotFound(id) => StoreError::NotFound(format!("user {id}")),
            DbError::MemberNotFound { room_id, user_id } => {
                StoreError::NotFound(format!("member {user_id} of room {room_id}"))
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}
