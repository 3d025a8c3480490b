//! Migration repositories
//!
//! The base repository carries the core schema; every extension carries its
//! own repository with independent version numbering. Scripts are embedded at
//! compile time from the crate's `migrations/` directory.

use crate::error::DatabaseError;

/// One versioned schema change
#[derive(Debug, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up_sql: &'static str,
    pub down_sql: Option<&'static str>,
}

/// An ordered set of migrations tracked under one repository id
#[derive(Debug, PartialEq, Eq)]
pub struct MigrationRepository {
    /// Key in the `migrate_version` table
    pub id: &'static str,
    /// Location of the scripts, recorded alongside the version
    pub path: &'static str,
    /// Migrations sorted by version, starting at 1 without gaps
    pub migrations: &'static [Migration],
}

impl MigrationRepository {
    /// Highest version this repository can upgrade to
    pub fn latest_version(&self) -> i64 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// Looks up the migration for a version
    pub fn migration(&self, version: i64) -> Option<&'static Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    /// Checks that versions run 1, 2, 3, ... without gaps or duplicates
    pub fn validate(&self) -> Result<(), DatabaseError> {
        for (index, migration) in self.migrations.iter().enumerate() {
            let expected = index as i64 + 1;
            if migration.version != expected {
                return Err(DatabaseError::migration(
                    self.id,
                    migration.version,
                    format!("expected version {}", expected),
                ));
            }
        }
        Ok(())
    }
}

macro_rules! migration {
    ($repo:literal, $version:literal, $name:literal) => {
        Migration {
            version: $version,
            description: $name,
            up_sql: include_str!(concat!(
                "../../migrations/", $repo, "/", $name, ".up.sql"
            )),
            down_sql: Some(include_str!(concat!(
                "../../migrations/", $repo, "/", $name, ".down.sql"
            ))),
        }
    };
}

/// Core identity schema
pub static IDENTITY_REPO: MigrationRepository = MigrationRepository {
    id: "identity",
    path: "migrations/identity",
    migrations: &[
        migration!("identity", 1, "001_assignment"),
        migration!("identity", 2, "002_identity"),
        migration!("identity", 3, "003_catalog"),
        migration!("identity", 4, "004_credential_policy_token"),
        migration!("identity", 5, "005_trust"),
    ],
};

pub static ENDPOINT_FILTER_REPO: MigrationRepository = MigrationRepository {
    id: "endpoint_filter",
    path: "migrations/endpoint_filter",
    migrations: &[migration!("endpoint_filter", 1, "001_project_endpoint")],
};

pub static OAUTH1_REPO: MigrationRepository = MigrationRepository {
    id: "oauth1",
    path: "migrations/oauth1",
    migrations: &[migration!("oauth1", 1, "001_oauth_tables")],
};

pub static REVOKE_REPO: MigrationRepository = MigrationRepository {
    id: "revoke",
    path: "migrations/revoke",
    migrations: &[migration!("revoke", 1, "001_revocation_event")],
};

pub static FEDERATION_REPO: MigrationRepository = MigrationRepository {
    id: "federation",
    path: "migrations/federation",
    migrations: &[
        migration!("federation", 1, "001_identity_provider"),
        migration!("federation", 2, "002_mapping"),
    ],
};

/// Extension repositories, keyed by extension name
pub static EXTENSION_REPOS: &[&MigrationRepository] = &[
    &ENDPOINT_FILTER_REPO,
    &OAUTH1_REPO,
    &REVOKE_REPO,
    &FEDERATION_REPO,
];

/// Finds the base repository, or an extension's repository by name
///
/// # Errors
///
/// Returns `DatabaseError::UnknownExtension` for an unregistered extension
pub fn find_migrate_repo(
    extension: Option<&str>,
) -> Result<&'static MigrationRepository, DatabaseError> {
    match extension {
        None => Ok(&IDENTITY_REPO),
        Some(name) => EXTENSION_REPOS
            .iter()
            .copied()
            .find(|repo| repo.id == name)
            .ok_or_else(|| DatabaseError::UnknownExtension(name.to_string())),
    }
}
