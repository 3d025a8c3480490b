//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the identity service test suite.
//!
//! # Modules
//!
//! - `once`: run-once guard for process-wide initialization
//! - `dirs`: scratch directories for test databases
//! - `settings`: test configuration loaded from the environment
//! - `context`: the shared test context every fixture is built from
//! - `database`: database provisioning and the `DatabaseFixture`
//! - `assertions`: schema assertion helpers
//! - `logging`: test log subscriber

pub mod assertions;
pub mod context;
pub mod database;
pub mod dirs;
pub mod error;
pub mod logging;
pub mod once;
pub mod settings;

pub use assertions::*;
pub use context::TestContext;
pub use database::{setup_database, DatabaseFixture, ProvisionOutcome};
pub use dirs::TestDirs;
pub use error::FixtureError;
pub use logging::init_test_logging;
pub use once::RunOnce;
pub use settings::{TestSettings, DEFAULT_TEST_DB_FILE, IN_MEM_DB_CONN_STRING, PRISTINE_SUFFIX};
