//! Fixture errors
//!
//! Failures from the SQL layer, the filesystem and configuration pass
//! through unchanged; the fixture only adds the cases it detects itself.

use identity_db::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// An operation that needs a set-up fixture was called before `setup`
    #[error("Database fixture has not been set up")]
    NotSetUp,

    /// The test body panicked; the panic is resumed after teardown
    #[error("Test body failed: {0}")]
    BodyFailed(String),
}
