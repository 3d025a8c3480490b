//! Database connection options
//!
//! Connection strings follow the SQLAlchemy-style convention the identity
//! service has always used: `sqlite://` on its own means a private in-memory
//! database, `sqlite:///abs/path.db` a database file.

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DatabaseError;

/// Connection string that designates an in-memory database
pub const IN_MEMORY_CONNECTION: &str = "sqlite://";

/// Default SQLite file used when a file-backed database is requested
pub const DEFAULT_SQLITE_DB: &str = "identity.sqlite";

/// Connection options for the identity database
///
/// # Example
///
/// ```rust
/// use identity_db::DatabaseOptions;
///
/// let options = DatabaseOptions::file("/tmp/test.db");
/// assert!(!options.is_in_memory());
/// assert_eq!(options.connection, "sqlite:///tmp/test.db");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Connection string
    pub connection: String,
    /// SQLite file backing a file-based connection
    pub sqlite_db: PathBuf,
    /// Maximum number of pooled connections for file-backed databases
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    #[serde(with = "duration_secs")]
    pub acquire_timeout: Duration,
}

impl DatabaseOptions {
    /// Builds options from the given defaults
    ///
    /// # Arguments
    ///
    /// * `connection` - Default connection string
    /// * `sqlite_db` - Default SQLite file
    pub fn set_defaults(connection: impl Into<String>, sqlite_db: impl Into<PathBuf>) -> Self {
        Self {
            connection: connection.into(),
            sqlite_db: sqlite_db.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Builds options for a database file, keeping the connection string and
    /// `sqlite_db` pointing at the same path
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::set_defaults(format!("{}{}", IN_MEMORY_CONNECTION, path.display()), path)
    }

    /// Builds options for a connection string, deriving `sqlite_db` from it
    ///
    /// A file connection backs `sqlite_db` with the file it names; the
    /// in-memory marker keeps `default_sqlite_db`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidConnection` if the string cannot be parsed
    pub fn from_connection(
        connection: impl Into<String>,
        default_sqlite_db: impl Into<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let options = Self::set_defaults(connection, default_sqlite_db);
        if options.is_in_memory() {
            return Ok(options);
        }

        let sqlite_db = options.connect_options()?.get_filename().to_path_buf();
        Ok(Self { sqlite_db, ..options })
    }

    /// Builds options for a private in-memory database
    pub fn in_memory() -> Self {
        Self::set_defaults(IN_MEMORY_CONNECTION, DEFAULT_SQLITE_DB)
    }

    /// Sets the maximum number of pooled connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets how long to wait for a pooled connection
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Returns true when the connection is the in-memory marker
    pub fn is_in_memory(&self) -> bool {
        self.connection == IN_MEMORY_CONNECTION
    }

    /// Translates the connection string into SQLx connect options
    ///
    /// File databases use the `DELETE` rollback journal so that the main file
    /// alone holds every committed change and can be copied as a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidConnection` if the string cannot be parsed
    pub fn connect_options(&self) -> Result<SqliteConnectOptions, DatabaseError> {
        if self.is_in_memory() {
            return SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                DatabaseError::InvalidConnection {
                    connection: self.connection.clone(),
                    reason: e.to_string(),
                }
            });
        }

        let options = SqliteConnectOptions::from_str(&self.connection).map_err(|e| {
            DatabaseError::InvalidConnection {
                connection: self.connection.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(true))
    }

    /// Loads options from `IDENTITY_DB_*` environment variables
    ///
    /// Unset variables keep their in-memory defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("IDENTITY_DB"))
            .build()?
            .try_deserialize()
    }
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self::in_memory()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
