//! Shared Test Context
//!
//! Process-wide state for the test suite lives here instead of in module
//! level flags: the scratch directory, the default connection options, the
//! loaded model metadata and the lock that serializes file-backed fixtures.
//! Fixtures receive the context explicitly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use test_utils::{DatabaseFixture, TestContext};
//!
//! let context = TestContext::shared()?;
//! let mut fixture = DatabaseFixture::new(context, None);
//! fixture.setup().await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use identity_db::{DatabaseOptions, Metadata, MODEL_MODULES};
use once_cell::sync::OnceCell;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::dirs::TestDirs;
use crate::error::FixtureError;
use crate::logging::init_test_logging;
use crate::once::RunOnce;
use crate::settings::{TestSettings, DEFAULT_TEST_DB_FILE, IN_MEM_DB_CONN_STRING, PRISTINE_SUFFIX};

static SHARED_CONTEXT: OnceCell<Arc<TestContext>> = OnceCell::new();

/// State shared by every fixture of a test run
#[derive(Debug)]
pub struct TestContext {
    settings: TestSettings,
    dirs: TestDirs,
    configured: DatabaseOptions,
    session_defaults: RunOnce<DatabaseOptions>,
    models: RunOnce<Metadata>,
    file_lock: Arc<Mutex<()>>,
}

impl TestContext {
    /// Builds a context from explicit settings
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be created or the
    /// configured connection string cannot be parsed
    pub fn new(settings: TestSettings) -> Result<Self, FixtureError> {
        let dirs = match &settings.tmp_dir {
            Some(path) => TestDirs::at(path)?,
            None => TestDirs::temporary()?,
        };

        let connection = settings
            .database_connection
            .clone()
            .unwrap_or_else(|| IN_MEM_DB_CONN_STRING.to_string());
        let configured =
            DatabaseOptions::from_connection(connection, dirs.tmp(DEFAULT_TEST_DB_FILE))?;

        Ok(Self {
            settings,
            dirs,
            configured,
            session_defaults: RunOnce::new(),
            models: RunOnce::new(),
            file_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns the process-wide context, bootstrapping it on first use
    ///
    /// Bootstrap loads settings from the environment, installs the test log
    /// subscriber, sets the session defaults and loads all models.
    pub fn shared() -> Result<Arc<TestContext>, FixtureError> {
        SHARED_CONTEXT
            .get_or_try_init(|| -> Result<Arc<TestContext>, FixtureError> {
                let settings = TestSettings::from_env()?;
                init_test_logging(&settings.log_filter);

                let context = TestContext::new(settings)?;
                context.initialize_sql_session();
                context.load_models();

                info!(root = %context.dirs.root().display(), "Bootstrapped test context");
                Ok(Arc::new(context))
            })
            .cloned()
    }

    pub fn settings(&self) -> &TestSettings {
        &self.settings
    }

    pub fn dirs(&self) -> &TestDirs {
        &self.dirs
    }

    /// Sets the default connection options, once per context
    ///
    /// The defaults keep the database in memory unless the settings name
    /// another connection, in which case the working file is the one that
    /// connection opens. Individual fixtures may still override them.
    pub fn initialize_sql_session(&self) -> &DatabaseOptions {
        self.session_defaults.call(|| {
            let defaults = self.configured.clone();

            debug!(connection = %defaults.connection, "Initialized SQL session defaults");
            defaults
        })
    }

    /// Registers every model module, once per context
    pub fn load_models(&self) -> &Metadata {
        self.models.call(|| {
            let metadata = Metadata::load(MODEL_MODULES);
            debug!(modules = metadata.modules().len(), "Loaded SQL models");
            metadata
        })
    }

    /// Options for a database file in this context's scratch directory
    pub fn file_options(&self) -> DatabaseOptions {
        DatabaseOptions::file(self.dirs.tmp(DEFAULT_TEST_DB_FILE))
    }

    /// Working database file for the given options
    pub fn working_db_path(&self, options: &DatabaseOptions) -> PathBuf {
        if options.sqlite_db.as_os_str().is_empty() {
            self.dirs.tmp(DEFAULT_TEST_DB_FILE)
        } else {
            options.sqlite_db.clone()
        }
    }

    /// Pristine snapshot that belongs to the given options' working file
    pub fn pristine_db_path(&self, options: &DatabaseOptions) -> PathBuf {
        pristine_path_for(&self.working_db_path(options))
    }

    /// Waits for exclusive use of the database files
    pub async fn lock_files(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.file_lock).lock_owned().await
    }
}

fn pristine_path_for(working: &Path) -> PathBuf {
    let mut name = working.as_os_str().to_os_string();
    name.push(PRISTINE_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TestContext {
        TestContext::new(TestSettings::default()).unwrap()
    }

    #[test]
    fn test_session_defaults_are_in_memory() {
        let context = context();
        let defaults = context.initialize_sql_session();

        assert_eq!(defaults.connection, IN_MEM_DB_CONN_STRING);
        assert_eq!(defaults.sqlite_db, context.dirs().tmp(DEFAULT_TEST_DB_FILE));
    }

    #[test]
    fn test_settings_override_connection() {
        let settings = TestSettings {
            database_connection: Some("sqlite:///tmp/other.db".to_string()),
            ..TestSettings::default()
        };
        let context = TestContext::new(settings).unwrap();

        let defaults = context.initialize_sql_session();
        assert_eq!(defaults.connection, "sqlite:///tmp/other.db");
        assert_eq!(defaults.sqlite_db, PathBuf::from("/tmp/other.db"));
        assert_eq!(context.working_db_path(defaults), PathBuf::from("/tmp/other.db"));
        assert_eq!(
            context.pristine_db_path(defaults),
            PathBuf::from("/tmp/other.db.pristine")
        );
    }

    #[test]
    fn test_initializers_run_once() {
        let context = context();

        let first = context.load_models() as *const Metadata;
        let second = context.load_models() as *const Metadata;
        assert_eq!(first, second);

        let defaults = context.initialize_sql_session().clone();
        assert_eq!(context.initialize_sql_session(), &defaults);
    }

    #[test]
    fn test_pristine_path_sits_next_to_working_file() {
        let context = context();
        let options = context.file_options();

        assert_eq!(context.working_db_path(&options), context.dirs().tmp("test.db"));
        assert_eq!(
            context.pristine_db_path(&options),
            context.dirs().tmp("test.db.pristine")
        );
    }

    #[tokio::test]
    async fn test_file_lock_is_exclusive() {
        let context = context();
        let guard = context.lock_files().await;

        assert!(Arc::clone(&context.file_lock).try_lock_owned().is_err());
        drop(guard);
        assert!(Arc::clone(&context.file_lock).try_lock_owned().is_ok());
    }
}
