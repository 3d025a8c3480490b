//! Test suite configuration
//!
//! Values come from `IDENTITY_TEST_*` environment variables (a `.env` file is
//! honoured). Everything is optional.
//!
//! * `IDENTITY_TEST_TMP_DIR` - fixed directory for test databases instead of a
//!   per-process temporary one
//! * `IDENTITY_TEST_DATABASE_CONNECTION` - default connection string for
//!   fixtures (default: in-memory)
//! * `IDENTITY_TEST_LOG_FILTER` - log filter when `RUST_LOG` is unset

use serde::Deserialize;
use std::path::PathBuf;

/// Connection string that keeps the test database in memory
pub const IN_MEM_DB_CONN_STRING: &str = identity_db::IN_MEMORY_CONNECTION;

/// Working database file name inside the test directory
pub const DEFAULT_TEST_DB_FILE: &str = "test.db";

/// Appended to the working file name to name its pristine snapshot
pub const PRISTINE_SUFFIX: &str = ".pristine";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    pub tmp_dir: Option<PathBuf>,
    pub database_connection: Option<String>,
    pub log_filter: String,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            tmp_dir: None,
            database_connection: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl TestSettings {
    /// Loads settings from the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .add_source(config::Environment::with_prefix("IDENTITY_TEST"))
            .build()?
            .try_deserialize()
    }
}
