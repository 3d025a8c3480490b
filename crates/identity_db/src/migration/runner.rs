//! Migration runner
//!
//! Repository versions are tracked in `migrate_version`, one row per
//! repository id. Each migration step runs in its own transaction together
//! with the version bump, so a failed step leaves the database at the last
//! completed version.

use sqlx::Executor;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::DatabaseError;

use super::repository::MigrationRepository;

const CREATE_VERSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS migrate_version (
        repository_id VARCHAR(250) NOT NULL PRIMARY KEY,
        repository_path TEXT,
        version INTEGER
    )
"#;

async fn ensure_version_table(engine: &Engine) -> Result<(), DatabaseError> {
    sqlx::query(CREATE_VERSION_TABLE).execute(engine).await?;
    Ok(())
}

async fn has_version_table(engine: &Engine) -> Result<bool, DatabaseError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'migrate_version'",
    )
    .fetch_one(engine)
    .await?;
    Ok(found > 0)
}

/// Returns the version a repository is at, or `None` if it is not under
/// version control in this database
///
/// Read only: a database without a `migrate_version` table is left as is.
pub async fn db_version(
    engine: &Engine,
    repo: &MigrationRepository,
) -> Result<Option<i64>, DatabaseError> {
    if !has_version_table(engine).await? {
        return Ok(None);
    }

    let version = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM migrate_version WHERE repository_id = ?",
    )
    .bind(repo.id)
    .fetch_optional(engine)
    .await?;

    Ok(version)
}

/// Places a repository under version control at `version` (default 0)
///
/// # Errors
///
/// Returns `DatabaseError::AlreadyVersionControlled` if a version is already
/// recorded, or `DatabaseError::InvalidVersion` if `version` is out of range
pub async fn db_version_control(
    engine: &Engine,
    repo: &MigrationRepository,
    version: Option<i64>,
) -> Result<i64, DatabaseError> {
    let version = version.unwrap_or(0);
    check_version(repo, version)?;

    ensure_version_table(engine).await?;
    if db_version(engine, repo).await?.is_some() {
        return Err(DatabaseError::AlreadyVersionControlled(repo.id.to_string()));
    }

    sqlx::query(
        "INSERT INTO migrate_version (repository_id, repository_path, version) VALUES (?, ?, ?)",
    )
    .bind(repo.id)
    .bind(repo.path)
    .bind(version)
    .execute(engine)
    .await?;

    debug!(repository = repo.id, version, "Placed repository under version control");
    Ok(version)
}

/// Upgrades or downgrades a repository to `target` (default: latest)
///
/// A repository that is not yet under version control is first placed under
/// it at version 0.
///
/// # Returns
///
/// The version the repository is at afterwards
///
/// # Errors
///
/// Returns `DatabaseError::InvalidVersion` for an out-of-range target and
/// `DatabaseError::MigrationFailed` when a script fails or a downgrade step
/// has no down script
pub async fn db_sync(
    engine: &Engine,
    repo: &MigrationRepository,
    target: Option<i64>,
) -> Result<i64, DatabaseError> {
    repo.validate()?;
    let target = target.unwrap_or_else(|| repo.latest_version());
    check_version(repo, target)?;

    let current = match db_version(engine, repo).await? {
        Some(version) => version,
        None => db_version_control(engine, repo, None).await?,
    };

    if current == target {
        debug!(repository = repo.id, version = current, "Repository already at target version");
        return Ok(current);
    }

    info!(repository = repo.id, from = current, to = target, "Syncing database schema");

    if target > current {
        for version in (current + 1)..=target {
            let migration = repo
                .migration(version)
                .ok_or_else(|| DatabaseError::migration(repo.id, version, "script not found"))?;
            apply_step(engine, repo, migration.up_sql, version, version).await?;
        }
    } else {
        for version in ((target + 1)..=current).rev() {
            let down_sql = repo
                .migration(version)
                .and_then(|m| m.down_sql)
                .ok_or_else(|| DatabaseError::migration(repo.id, version, "no downgrade script"))?;
            apply_step(engine, repo, down_sql, version, version - 1).await?;
        }
    }

    Ok(target)
}

async fn apply_step(
    engine: &Engine,
    repo: &MigrationRepository,
    sql: &str,
    step: i64,
    new_version: i64,
) -> Result<(), DatabaseError> {
    let mut tx = engine.begin().await?;

    (&mut *tx)
        .execute(sqlx::raw_sql(sql))
        .await
        .map_err(|e| DatabaseError::migration(repo.id, step, DatabaseError::from(&e)))?;

    sqlx::query("UPDATE migrate_version SET version = ? WHERE repository_id = ?")
        .bind(new_version)
        .bind(repo.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(repository = repo.id, version = new_version, "Applied migration step");
    Ok(())
}

fn check_version(repo: &MigrationRepository, version: i64) -> Result<(), DatabaseError> {
    let latest = repo.latest_version();
    if version < 0 || version > latest {
        return Err(DatabaseError::InvalidVersion {
            repository: repo.id.to_string(),
            version,
            latest,
        });
    }
    Ok(())
}
