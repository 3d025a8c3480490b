//! Database Test Utilities
//!
//! Provides database provisioning and the `DatabaseFixture` used by tests
//! that need an identity schema.
//!
//! # Pristine snapshots
//!
//! Running every migration is by far the most expensive part of preparing a
//! file-backed database. The first provisioning in a context migrates the
//! working file and copies it to a pristine snapshot next to it; every later
//! provisioning deletes the working file and copies the snapshot back over
//! it. The snapshot itself is never opened.
//!
//! In-memory databases skip all of this: the fixture creates their tables
//! from the registered models.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use identity_db::migration::find_migrate_repo;
use identity_db::{DatabaseOptions, Engine, Metadata, SchemaMigrator, SqlMigrator, SqlSession};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::context::TestContext;
use crate::error::FixtureError;

/// What `setup_database` did to produce the working database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// In-memory connection; no files were touched
    InMemory,
    /// Migrations ran and a new pristine snapshot was written
    Migrated,
    /// The existing pristine snapshot was copied into place
    CopiedFromPristine,
}

/// Prepares the working database file for `options`
///
/// Deletes a stale working file, then either migrates a new one (base
/// repository first, then each extension in order) and snapshots it, or
/// copies the existing snapshot into place without running migrations.
///
/// The session's engine is closed before any file is copied, so that no
/// connection holds the working file open across the copy.
///
/// # Errors
///
/// Filesystem and migration errors are returned unchanged
pub async fn setup_database(
    context: &TestContext,
    options: &DatabaseOptions,
    session: &SqlSession,
    migrator: &dyn SchemaMigrator,
    extensions: &[String],
) -> Result<ProvisionOutcome, FixtureError> {
    if options.is_in_memory() {
        return Ok(ProvisionOutcome::InMemory);
    }

    let db = context.working_db_path(options);
    let pristine = context.pristine_db_path(options);

    session.cleanup().await;

    if tokio::fs::try_exists(&db).await? {
        tokio::fs::remove_file(&db).await?;
        debug!(path = %db.display(), "Removed stale working database");
    }

    if !tokio::fs::try_exists(&pristine).await? {
        info!(path = %db.display(), ?extensions, "Migrating new working database");

        let engine = session.get_engine().await?;
        migrator.db_sync(&engine, find_migrate_repo(None)?).await?;
        for extension in extensions {
            migrator.sync_extension(&engine, extension).await?;
        }
        session.cleanup().await;

        tokio::fs::copy(&db, &pristine).await?;
        info!(path = %pristine.display(), "Wrote pristine database snapshot");
        Ok(ProvisionOutcome::Migrated)
    } else {
        tokio::fs::copy(&pristine, &db).await?;
        debug!(path = %pristine.display(), "Copied pristine database snapshot");
        Ok(ProvisionOutcome::CopiedFromPristine)
    }
}

/// Cleanup steps registered during setup, run last-in first-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cleanup {
    /// Close the session's engine
    Session,
    /// Drop every registered table
    DropAll,
}

/// A fixture for setting up and tearing down a database
///
/// # Lifecycle
///
/// 1. `new` records the extensions and makes sure the context's session
///    defaults and models are initialized.
/// 2. `setup` provisions the database file, opens the engine, creates every
///    registered table and registers the cleanups.
/// 3. `teardown` drops the tables and closes the engine.
///
/// `run` wraps all three around a test body and tears down even when the
/// body fails.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::{DatabaseFixture, TestContext};
///
/// let fixture = DatabaseFixture::new(TestContext::shared()?, Some(vec!["oauth1".into()]))
///     .file_backed();
/// fixture
///     .run(|engine| async move {
///         sqlx::query("SELECT COUNT(*) FROM consumer").execute(&engine).await?;
///         Ok(())
///     })
///     .await?;
/// ```
pub struct DatabaseFixture {
    context: Arc<TestContext>,
    extensions: Vec<String>,
    options: DatabaseOptions,
    migrator: Arc<dyn SchemaMigrator>,
    session: SqlSession,
    engine: Option<Engine>,
    outcome: Option<ProvisionOutcome>,
    cleanups: Vec<Cleanup>,
    file_lease: Option<OwnedMutexGuard<()>>,
}

impl DatabaseFixture {
    /// Creates a fixture using the context's default connection options
    pub fn new(context: Arc<TestContext>, extensions: Option<Vec<String>>) -> Self {
        let options = context.initialize_sql_session().clone();
        context.load_models();

        Self {
            session: SqlSession::new(options.clone()),
            context,
            extensions: extensions.unwrap_or_default(),
            options,
            migrator: Arc::new(SqlMigrator),
            engine: None,
            outcome: None,
            cleanups: Vec::new(),
            file_lease: None,
        }
    }

    /// Overrides the connection options for this fixture
    pub fn with_options(mut self, options: DatabaseOptions) -> Self {
        self.session = SqlSession::new(options.clone());
        self.options = options;
        self
    }

    /// Uses the context's working database file instead of memory
    pub fn file_backed(self) -> Self {
        let options = self.context.file_options();
        self.with_options(options)
    }

    /// Replaces the migrator used when a pristine snapshot must be built
    pub fn with_migrator(mut self, migrator: Arc<dyn SchemaMigrator>) -> Self {
        self.migrator = migrator;
        self
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Model metadata the fixture creates and drops tables from
    pub fn metadata(&self) -> &Metadata {
        self.context.load_models()
    }

    /// How the database was provisioned, once set up
    pub fn outcome(&self) -> Option<ProvisionOutcome> {
        self.outcome
    }

    /// The engine opened by `setup`
    pub fn engine(&self) -> Result<&Engine, FixtureError> {
        self.engine.as_ref().ok_or(FixtureError::NotSetUp)
    }

    pub fn is_set_up(&self) -> bool {
        self.engine.is_some()
    }

    /// Provisions the database and creates all registered tables
    ///
    /// Calling `setup` on a fixture that is already set up tears it down
    /// first.
    pub async fn setup(&mut self) -> Result<(), FixtureError> {
        if self.is_set_up() || !self.cleanups.is_empty() {
            self.teardown().await?;
        }

        if !self.options.is_in_memory() {
            self.file_lease = Some(self.context.lock_files().await);
        }

        let result = self.provision().await;
        if result.is_err() {
            // Partial setup: release whatever was registered so far.
            let _ = self.teardown().await;
        }
        result
    }

    async fn provision(&mut self) -> Result<(), FixtureError> {
        let outcome = setup_database(
            &self.context,
            &self.options,
            &self.session,
            self.migrator.as_ref(),
            &self.extensions,
        )
        .await?;
        self.outcome = Some(outcome);

        let engine = self.session.get_engine().await?;
        self.cleanups.push(Cleanup::Session);
        self.engine = Some(engine.clone());

        self.context.load_models().create_all(&engine).await?;
        self.cleanups.push(Cleanup::DropAll);

        debug!(?outcome, extensions = ?self.extensions, "Database fixture set up");
        Ok(())
    }

    /// Runs the registered cleanups in reverse order
    ///
    /// Every cleanup runs even if an earlier one fails; the first failure is
    /// returned. Tearing down a fixture that is not set up does nothing.
    pub async fn teardown(&mut self) -> Result<(), FixtureError> {
        let mut first_error = None;

        while let Some(cleanup) = self.cleanups.pop() {
            let result = match cleanup {
                Cleanup::DropAll => match &self.engine {
                    Some(engine) => self
                        .context
                        .load_models()
                        .drop_all(engine)
                        .await
                        .map_err(FixtureError::from),
                    None => Ok(()),
                },
                Cleanup::Session => {
                    self.engine = None;
                    self.session.cleanup().await;
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!(error = %e, ?cleanup, "Database fixture cleanup failed");
                first_error.get_or_insert(e);
            }
        }

        // Cleanups are only registered once the engine is open; make sure a
        // failed setup does not leave one behind either.
        self.engine = None;
        self.session.cleanup().await;
        self.file_lease = None;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Sets up, runs `body` with the engine, and always tears down
    ///
    /// The body runs on its own task so that a panic inside it is caught,
    /// the fixture is torn down, and the panic is then resumed.
    pub async fn run<F, Fut, T>(mut self, body: F) -> Result<T, FixtureError>
    where
        F: FnOnce(Engine) -> Fut,
        Fut: Future<Output = Result<T, FixtureError>> + Send + 'static,
        T: Send + 'static,
    {
        self.setup().await?;
        let engine = self.engine()?.clone();

        let joined = tokio::spawn(body(engine)).await;
        let teardown = self.teardown().await;

        match joined {
            Ok(result) => {
                let value = result?;
                teardown?;
                Ok(value)
            }
            Err(e) if e.is_panic() => resume_panic(e.into_panic()),
            Err(e) => Err(FixtureError::BodyFailed(e.to_string())),
        }
    }
}

fn resume_panic(payload: Box<dyn Any + Send>) -> ! {
    std::panic::resume_unwind(payload)
}

impl std::fmt::Debug for DatabaseFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseFixture")
            .field("connection", &self.options.connection)
            .field("extensions", &self.extensions)
            .field("outcome", &self.outcome)
            .field("cleanups", &self.cleanups)
            .finish()
    }
}

/// Declares a `#[tokio::test]` that runs `$body` against a set-up database
///
/// The body sees `engine` (an `identity_db::Engine`) and must evaluate to
/// `Result<(), test_utils::FixtureError>`.
///
/// ```rust,ignore
/// db_test!(creates_user, |engine| {
///     sqlx::query("INSERT INTO user (id, name, domain_id) VALUES ('u', 'n', 'd')")
///         .execute(&engine)
///         .await?;
///     Ok(())
/// });
/// ```
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$engine:ident| $body:block) => {
        $crate::db_test!($name, [], |$engine| $body);
    };
    ($name:ident, [$($ext:expr),* $(,)?], |$engine:ident| $body:block) => {
        #[tokio::test]
        async fn $name() {
            let context = $crate::context::TestContext::shared()
                .expect("Failed to bootstrap test context");
            let extensions: Vec<String> = vec![$($ext.to_string()),*];
            $crate::database::DatabaseFixture::new(context, Some(extensions))
                .run(|$engine| async move $body)
                .await
                .expect("Database test failed");
        }
    };
}
