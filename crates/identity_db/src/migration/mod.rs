//! Schema migrations
//!
//! - `repository`: the embedded base and extension repositories
//! - `runner`: version control and upgrade/downgrade against an engine
//!
//! `SchemaMigrator` is the seam callers go through when they want to swap
//! the real runner out, for instance to count how often migrations run.

pub mod repository;
pub mod runner;

use async_trait::async_trait;
use tracing::info;

use crate::engine::Engine;
use crate::error::DatabaseError;

pub use repository::{
    find_migrate_repo, Migration, MigrationRepository, EXTENSION_REPOS, IDENTITY_REPO,
};
pub use runner::{db_sync, db_version, db_version_control};

/// Names of all extensions that carry a migration repository
pub const EXTENSIONS: &[&str] = &["endpoint_filter", "oauth1", "revoke", "federation"];

/// Syncs the base repository, or an extension's, to `version` (default: latest)
pub async fn sync_database_to_version(
    engine: &Engine,
    extension: Option<&str>,
    version: Option<i64>,
) -> Result<i64, DatabaseError> {
    let repo = find_migrate_repo(extension)?;
    db_sync(engine, repo, version).await
}

/// Applies migrations to an engine
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Brings `repo` to its latest version
    async fn db_sync(&self, engine: &Engine, repo: &MigrationRepository)
        -> Result<i64, DatabaseError>;

    /// Brings the named extension's repository to its latest version
    async fn sync_extension(&self, engine: &Engine, extension: &str)
        -> Result<i64, DatabaseError>;
}

/// `SchemaMigrator` backed by the embedded repositories
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlMigrator;

#[async_trait]
impl SchemaMigrator for SqlMigrator {
    async fn db_sync(
        &self,
        engine: &Engine,
        repo: &MigrationRepository,
    ) -> Result<i64, DatabaseError> {
        db_sync(engine, repo, None).await
    }

    async fn sync_extension(
        &self,
        engine: &Engine,
        extension: &str,
    ) -> Result<i64, DatabaseError> {
        info!(extension, "Applying extension migrations");
        sync_database_to_version(engine, Some(extension), None).await
    }
}
