//! Database error types
//!
//! This module defines the errors raised by the SQL layer: connection and
//! query failures, schema migration failures, and lookups of migration
//! repositories that do not exist.

use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Connection string could not be parsed
    #[error("Invalid connection string '{connection}': {reason}")]
    InvalidConnection { connection: String, reason: String },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check or not-null constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// No migration repository is registered under the extension name
    #[error("Unknown extension: {0}")]
    UnknownExtension(String),

    /// Requested version is outside the repository's range
    #[error("Invalid version {version} for repository '{repository}' (latest is {latest})")]
    InvalidVersion {
        repository: String,
        version: i64,
        latest: i64,
    },

    /// Repository is already under version control
    #[error("Repository '{0}' is already under version control")]
    AlreadyVersionControlled(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a migration failure for a specific repository step
    ///
    /// # Arguments
    ///
    /// * `repository` - Identifier of the migration repository
    /// * `version` - The version whose script failed
    /// * `reason` - What went wrong
    ///
    /// # Example
    ///
    /// ```rust
    /// use identity_db::DatabaseError;
    ///
    /// let error = DatabaseError::migration("identity", 3, "no such table: user");
    /// assert!(error.to_string().contains("identity"));
    /// ```
    pub fn migration(repository: &str, version: i64, reason: impl std::fmt::Display) -> Self {
        DatabaseError::MigrationFailed(format!(
            "repository '{}' at version {}: {}",
            repository, version, reason
        ))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_)
                | DatabaseError::InvalidConnection { .. }
                | DatabaseError::PoolExhausted
        )
    }

    /// Checks if this error came out of the migration layer
    pub fn is_migration_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::MigrationFailed(_)
                | DatabaseError::UnknownExtension(_)
                | DatabaseError::InvalidVersion { .. }
                | DatabaseError::AlreadyVersionControlled(_)
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// The mapping relies on the driver-independent error kind SQLx derives from
/// the SQLite extended result code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => DatabaseError::DuplicateEntry(message),
                    sqlx::error::ErrorKind::ForeignKeyViolation => {
                        DatabaseError::ForeignKeyViolation(message)
                    }
                    sqlx::error::ErrorKind::CheckViolation
                    | sqlx::error::ErrorKind::NotNullViolation => {
                        DatabaseError::ConstraintViolation(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}
