//! Integration tests for database provisioning and the database fixture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use identity_db::migration::find_migrate_repo;
use identity_db::{
    create_engine, DatabaseError, Engine, MigrationRepository, SchemaMigrator, SqlMigrator,
    MODEL_MODULES,
};
use test_utils::{
    assert_schema_matches, assert_tables_absent, assert_tables_exist, db_test, table_names,
    DatabaseFixture, DatabaseTestAssertions, FixtureError, ProvisionOutcome, TestContext,
    TestSettings,
};

/// Delegates to the real migrator and counts every call
#[derive(Default)]
struct CountingMigrator {
    base_syncs: AtomicUsize,
    extension_syncs: AtomicUsize,
    extensions: Mutex<Vec<String>>,
}

impl CountingMigrator {
    fn total(&self) -> usize {
        self.base_syncs.load(Ordering::SeqCst) + self.extension_syncs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaMigrator for CountingMigrator {
    async fn db_sync(
        &self,
        engine: &Engine,
        repo: &MigrationRepository,
    ) -> Result<i64, DatabaseError> {
        self.base_syncs.fetch_add(1, Ordering::SeqCst);
        SqlMigrator.db_sync(engine, repo).await
    }

    async fn sync_extension(
        &self,
        engine: &Engine,
        extension: &str,
    ) -> Result<i64, DatabaseError> {
        self.extension_syncs.fetch_add(1, Ordering::SeqCst);
        self.extensions.lock().unwrap().push(extension.to_string());
        SqlMigrator.sync_extension(engine, extension).await
    }
}

fn assert_send<T: Send>(_: &T) {}

fn isolated_context() -> Arc<TestContext> {
    Arc::new(TestContext::new(TestSettings::default()).expect("Failed to create test context"))
}

async fn version_of(engine: &Engine, repository: &str) -> Option<i64> {
    sqlx::query_scalar("SELECT version FROM migrate_version WHERE repository_id = ?")
        .bind(repository)
        .fetch_optional(engine)
        .await
        .unwrap()
}

mod in_memory {
    use super::*;

    #[tokio::test]
    async fn test_setup_creates_all_registered_tables() {
        let context = isolated_context();
        let mut fixture = DatabaseFixture::new(Arc::clone(&context), None);

        fixture.setup().await.unwrap();
        let engine = fixture.engine().unwrap().clone();

        assert_eq!(fixture.outcome(), Some(ProvisionOutcome::InMemory));
        assert_schema_matches(&engine, fixture.metadata()).await;
        // No migrations ran, so nothing is under version control.
        assert!(!table_names(&engine).await.iter().any(|t| t == "migrate_version"));

        fixture.teardown().await.unwrap();
        assert!(engine.is_closed());
        assert!(!fixture.is_set_up());
        assert!(!context.working_db_path(fixture.options()).exists());
    }

    #[tokio::test]
    async fn test_each_fixture_starts_empty() {
        let context = isolated_context();

        let mut first = DatabaseFixture::new(Arc::clone(&context), None);
        first.setup().await.unwrap();
        sqlx::query("INSERT INTO role (id, name) VALUES ('r1', 'admin')")
            .execute(first.engine().unwrap())
            .await
            .unwrap();
        first.teardown().await.unwrap();

        let mut second = DatabaseFixture::new(context, None);
        second.setup().await.unwrap();
        let roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role")
            .fetch_one(second.engine().unwrap())
            .await
            .unwrap();
        second.teardown().await.unwrap();

        assert_eq!(roles, 0);
    }

    #[tokio::test]
    async fn test_models_load_once_per_context() {
        let context = isolated_context();

        let fixtures: Vec<_> = (0..5)
            .map(|_| DatabaseFixture::new(Arc::clone(&context), None))
            .collect();

        let metadata = context.load_models();
        assert_eq!(metadata.modules().len(), MODEL_MODULES.len());
        assert!(metadata.has_unique_tables());
        for fixture in &fixtures {
            assert!(std::ptr::eq(fixture.metadata(), metadata));
        }
    }
}

mod file_backed {
    use super::*;

    #[tokio::test]
    async fn test_first_setup_migrates_and_writes_pristine() {
        let context = isolated_context();
        let migrator = Arc::new(CountingMigrator::default());
        let mut fixture = DatabaseFixture::new(Arc::clone(&context), Some(vec!["oauth1".into()]))
            .file_backed()
            .with_migrator(migrator.clone());

        let pristine = context.pristine_db_path(fixture.options());
        assert!(!pristine.exists());

        fixture.setup().await.unwrap();

        assert_eq!(fixture.outcome(), Some(ProvisionOutcome::Migrated));
        assert_eq!(migrator.base_syncs.load(Ordering::SeqCst), 1);
        assert_eq!(migrator.extension_syncs.load(Ordering::SeqCst), 1);
        assert!(pristine.exists());
        assert!(context.working_db_path(fixture.options()).exists());

        let engine = fixture.engine().unwrap().clone();
        let base = find_migrate_repo(None).unwrap();
        assert_eq!(version_of(&engine, "identity").await, Some(base.latest_version()));
        assert_eq!(version_of(&engine, "oauth1").await, Some(1));
        assert_eq!(version_of(&engine, "federation").await, None);
        assert_tables_exist(&engine, &["consumer", "request_token", "access_token"]).await;

        fixture.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_extensions_migrate_in_given_order() {
        let context = isolated_context();
        let migrator = Arc::new(CountingMigrator::default());
        let mut fixture = DatabaseFixture::new(
            Arc::clone(&context),
            Some(vec!["revoke".into(), "federation".into()]),
        )
        .file_backed()
        .with_migrator(migrator.clone());

        fixture.setup().await.unwrap();

        assert_eq!(fixture.outcome(), Some(ProvisionOutcome::Migrated));
        assert_eq!(*migrator.extensions.lock().unwrap(), ["revoke", "federation"]);

        let engine = fixture.engine().unwrap().clone();
        assert_eq!(
            version_of(&engine, "revoke").await,
            Some(find_migrate_repo(Some("revoke")).unwrap().latest_version())
        );
        assert_eq!(
            version_of(&engine, "federation").await,
            Some(find_migrate_repo(Some("federation")).unwrap().latest_version())
        );
        assert_eq!(version_of(&engine, "oauth1").await, None);

        fixture.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_configured_connection_backs_the_working_file() {
        let db_dir = tempfile::tempdir().unwrap();
        let working = db_dir.path().join("other.db");
        let settings = TestSettings {
            database_connection: Some(format!("sqlite://{}", working.display())),
            ..TestSettings::default()
        };
        let context = Arc::new(TestContext::new(settings).unwrap());

        let mut fixture = DatabaseFixture::new(Arc::clone(&context), None);
        assert_eq!(context.working_db_path(fixture.options()), working);

        fixture.setup().await.unwrap();

        assert_eq!(fixture.outcome(), Some(ProvisionOutcome::Migrated));
        assert!(working.exists());
        assert!(db_dir.path().join("other.db.pristine").exists());
        assert_schema_matches(fixture.engine().unwrap(), fixture.metadata()).await;

        fixture.teardown().await.unwrap();

        let mut second = DatabaseFixture::new(context, None);
        second.setup().await.unwrap();
        assert_eq!(second.outcome(), Some(ProvisionOutcome::CopiedFromPristine));
        second.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fixture_futures_can_be_spawned() {
        let context = isolated_context();
        let mut fixture = DatabaseFixture::new(Arc::clone(&context), None).file_backed();

        let setup = fixture.setup();
        assert_send(&setup);
        setup.await.unwrap();

        let teardown = fixture.teardown();
        assert_send(&teardown);
        teardown.await.unwrap();

        let spawned = DatabaseFixture::new(context, None).file_backed();
        let tables = tokio::spawn(async move {
            let mut fixture = spawned;
            fixture.setup().await?;
            let tables = table_names(fixture.engine()?).await;
            fixture.teardown().await?;
            Ok::<_, FixtureError>(tables)
        })
        .await
        .unwrap()
        .unwrap();

        assert!(tables.iter().any(|t| t == "migrate_version"));
    }

    #[tokio::test]
    async fn test_second_setup_reuses_pristine_without_migrating() {
        let context = isolated_context();

        let mut first = DatabaseFixture::new(Arc::clone(&context), None).file_backed();
        first.setup().await.unwrap();
        first.teardown().await.unwrap();

        let migrator = Arc::new(CountingMigrator::default());
        let mut second = DatabaseFixture::new(Arc::clone(&context), None)
            .file_backed()
            .with_migrator(migrator.clone());
        second.setup().await.unwrap();

        assert_eq!(second.outcome(), Some(ProvisionOutcome::CopiedFromPristine));
        assert_eq!(migrator.total(), 0);

        let engine = second.engine().unwrap().clone();
        assert_schema_matches(&engine, second.metadata()).await;
        assert_eq!(
            version_of(&engine, "identity").await,
            Some(find_migrate_repo(None).unwrap().latest_version())
        );

        second.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_working_file_is_replaced_and_pristine_untouched() {
        let context = isolated_context();

        let mut first = DatabaseFixture::new(Arc::clone(&context), None).file_backed();
        first.setup().await.unwrap();
        let pristine = context.pristine_db_path(first.options());
        let snapshot = std::fs::read(&pristine).unwrap();

        sqlx::query("INSERT INTO domain (id, name) VALUES ('default', 'Default')")
            .execute(first.engine().unwrap())
            .await
            .unwrap()
            .assert_rows_affected(1);
        first.teardown().await.unwrap();

        assert_eq!(std::fs::read(&pristine).unwrap(), snapshot);

        let mut second = DatabaseFixture::new(Arc::clone(&context), None).file_backed();
        second.setup().await.unwrap();
        let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domain")
            .fetch_one(second.engine().unwrap())
            .await
            .unwrap();
        second.teardown().await.unwrap();

        assert_eq!(domains, 0);
        assert_eq!(std::fs::read(&pristine).unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_teardown_drops_registered_tables() {
        let context = isolated_context();
        let mut fixture = DatabaseFixture::new(Arc::clone(&context), None).file_backed();

        fixture.setup().await.unwrap();
        let table_list = fixture.metadata().table_names();
        fixture.teardown().await.unwrap();

        let engine = create_engine(fixture.options()).await.unwrap();
        assert_tables_absent(&engine, &table_list).await;
        // Version bookkeeping is not a model table and stays behind.
        assert_tables_exist(&engine, &["migrate_version"]).await;
        engine.close().await;
    }

    #[tokio::test]
    async fn test_failed_migration_propagates_and_releases_lock() {
        let context = isolated_context();
        let mut fixture = DatabaseFixture::new(Arc::clone(&context), Some(vec!["kerberos".into()]))
            .file_backed();

        let err = fixture.setup().await.unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Database(DatabaseError::UnknownExtension(_))
        ));
        assert!(!fixture.is_set_up());
        assert!(!context.pristine_db_path(fixture.options()).exists());

        // The file lock was released, so another fixture can proceed.
        let mut next = DatabaseFixture::new(context, None).file_backed();
        next.setup().await.unwrap();
        assert_eq!(next.outcome(), Some(ProvisionOutcome::Migrated));
        next.teardown().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_tears_down_after_body_error() {
        let context = isolated_context();
        let fixture = DatabaseFixture::new(Arc::clone(&context), None).file_backed();

        let result: Result<(), FixtureError> = fixture
            .run(|engine| async move {
                sqlx::query("SELECT * FROM no_such_table")
                    .execute(&engine)
                    .await?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(FixtureError::Sql(_))));

        let lease = tokio::time::timeout(std::time::Duration::from_secs(5), context.lock_files())
            .await;
        assert!(lease.is_ok(), "file lock was not released");
    }

    #[tokio::test]
    async fn test_run_tears_down_after_panic() {
        let context = isolated_context();
        let fixture = DatabaseFixture::new(Arc::clone(&context), None).file_backed();

        let joined = tokio::spawn(fixture.run(|engine| async move {
            if !engine.is_closed() {
                panic!("body exploded");
            }
            Ok::<(), FixtureError>(())
        }))
        .await;

        assert!(joined.unwrap_err().is_panic());

        let lease = tokio::time::timeout(std::time::Duration::from_secs(5), context.lock_files())
            .await;
        assert!(lease.is_ok(), "file lock was not released");
    }

    #[tokio::test]
    async fn test_run_returns_body_value() {
        let context = isolated_context();
        let fixture = DatabaseFixture::new(context, None).file_backed();

        let users = fixture
            .run(|engine| async move {
                sqlx::query("INSERT INTO user (id, name, domain_id) VALUES (?, 'alice', 'default')")
                    .bind(uuid::Uuid::new_v4().simple().to_string())
                    .execute(&engine)
                    .await?;
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
                    .fetch_one(&engine)
                    .await?;
                Ok(count)
            })
            .await
            .unwrap();

        assert_eq!(users, 1);
    }
}

db_test!(test_macro_provides_schema, |engine| {
    let tables = table_names(&engine).await;
    assert!(tables.iter().any(|t| t == "user"));
    Ok(())
});

db_test!(test_macro_with_extensions, ["revoke", "federation"], |engine| {
    sqlx::query(
        "INSERT INTO revocation_event (id, issued_before, revoked_at) \
         VALUES ('e1', '2024-01-01 00:00:00', '2024-01-01 00:00:00')",
    )
    .execute(&engine)
    .await?;
    Ok(())
});
