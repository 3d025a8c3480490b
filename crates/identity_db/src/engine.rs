//! Engine and session management
//!
//! An engine is a SQLx connection pool. `SqlSession` owns at most one engine
//! at a time: it is opened on first use and released by `cleanup`, after which
//! the next caller gets a freshly opened engine.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::DatabaseOptions;
use crate::error::DatabaseError;

/// Type alias for the SQLite connection pool
pub type Engine = SqlitePool;

/// Creates an engine for the given options
///
/// In-memory databases live only as long as their connection, so in-memory
/// engines are pinned to one connection that is never idled out or recycled.
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the database cannot be opened
pub async fn create_engine(options: &DatabaseOptions) -> Result<Engine, DatabaseError> {
    let connect_options = options.connect_options()?;

    let pool_options = if options.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(options.max_connections)
    };

    info!(
        connection = %options.connection,
        in_memory = options.is_in_memory(),
        "Creating database engine"
    );

    pool_options
        .acquire_timeout(options.acquire_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// Lazily created, cached engine
///
/// # Example
///
/// ```rust,ignore
/// use identity_db::{DatabaseOptions, SqlSession};
///
/// let session = SqlSession::new(DatabaseOptions::in_memory());
/// let engine = session.get_engine().await?;
/// sqlx::query("SELECT 1").execute(&engine).await?;
/// session.cleanup().await;
/// ```
#[derive(Debug)]
pub struct SqlSession {
    options: DatabaseOptions,
    engine: Mutex<Option<Engine>>,
}

impl SqlSession {
    /// Creates a session that will connect with the given options
    pub fn new(options: DatabaseOptions) -> Self {
        Self {
            options,
            engine: Mutex::new(None),
        }
    }

    /// Returns the options this session connects with
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Returns the cached engine, opening it on first use
    pub async fn get_engine(&self) -> Result<Engine, DatabaseError> {
        let mut guard = self.engine.lock().await;
        if let Some(engine) = guard.as_ref() {
            if !engine.is_closed() {
                return Ok(engine.clone());
            }
        }

        let engine = create_engine(&self.options).await?;
        *guard = Some(engine.clone());
        Ok(engine)
    }

    /// Returns true while an open engine is cached
    pub async fn is_active(&self) -> bool {
        self.engine
            .lock()
            .await
            .as_ref()
            .is_some_and(|engine| !engine.is_closed())
    }

    /// Closes the cached engine and forgets it
    ///
    /// Closing waits for checked-out connections to be returned, so callers
    /// must drop their engine clones' in-flight work first.
    pub async fn cleanup(&self) {
        let engine = self.engine.lock().await.take();
        if let Some(engine) = engine {
            engine.close().await;
            debug!(connection = %self.options.connection, "Database engine closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_engine_keeps_state_across_queries() {
        let engine = create_engine(&DatabaseOptions::in_memory()).await.unwrap();

        sqlx::query("CREATE TABLE probe (id INTEGER PRIMARY KEY)")
            .execute(&engine)
            .await
            .unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM probe")
            .fetch_one(&engine)
            .await
            .unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_session_caches_engine() {
        let session = SqlSession::new(DatabaseOptions::in_memory());
        assert!(!session.is_active().await);

        let first = session.get_engine().await.unwrap();
        sqlx::query("CREATE TABLE probe (id INTEGER)")
            .execute(&first)
            .await
            .unwrap();

        // Same engine, so the in-memory table is still visible.
        let second = session.get_engine().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM probe")
            .fetch_one(&second)
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert!(session.is_active().await);
    }

    #[tokio::test]
    async fn test_cleanup_releases_engine() {
        let session = SqlSession::new(DatabaseOptions::in_memory());
        let engine = session.get_engine().await.unwrap();
        sqlx::query("CREATE TABLE probe (id INTEGER)")
            .execute(&engine)
            .await
            .unwrap();

        session.cleanup().await;
        assert!(engine.is_closed());
        assert!(!session.is_active().await);

        // A fresh in-memory engine starts empty.
        let fresh = session.get_engine().await.unwrap();
        let missing = sqlx::query("SELECT COUNT(*) FROM probe")
            .execute(&fresh)
            .await;
        assert!(missing.is_err());

        session.cleanup().await;
        session.cleanup().await;
    }
}
