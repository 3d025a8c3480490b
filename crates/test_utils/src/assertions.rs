//! Custom Test Assertions
//!
//! Provides schema assertion helpers that give more meaningful failure
//! messages than comparing table lists by hand.

use identity_db::{Engine, Metadata};
use sqlx::sqlite::SqliteQueryResult;

/// Names of all user tables in the database, sorted
///
/// # Panics
///
/// Panics if the catalog query fails
pub async fn table_names(engine: &Engine) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )
    .fetch_all(engine)
    .await
    .expect("Failed to list tables")
}

/// Asserts that every named table exists
pub async fn assert_tables_exist(engine: &Engine, expected: &[&str]) {
    let tables = table_names(engine).await;
    let missing: Vec<_> = expected
        .iter()
        .filter(|name| !tables.iter().any(|t| t == *name))
        .collect();

    assert!(
        missing.is_empty(),
        "Missing tables: {:?} (present: {:?})",
        missing,
        tables
    );
}

/// Asserts that none of the named tables exist
pub async fn assert_tables_absent(engine: &Engine, unexpected: &[&str]) {
    let tables = table_names(engine).await;
    let present: Vec<_> = unexpected
        .iter()
        .filter(|name| tables.iter().any(|t| t == *name))
        .collect();

    assert!(present.is_empty(), "Tables still present: {:?}", present);
}

/// Asserts that every table registered in `metadata` exists
pub async fn assert_schema_matches(engine: &Engine, metadata: &Metadata) {
    assert_tables_exist(engine, &metadata.table_names()).await;
}

/// Helper trait for test assertions on database results
pub trait DatabaseTestAssertions {
    /// Asserts that a specific number of rows were affected
    fn assert_rows_affected(&self, expected: u64);
}

impl DatabaseTestAssertions for SqliteQueryResult {
    fn assert_rows_affected(&self, expected: u64) {
        assert_eq!(
            self.rows_affected(),
            expected,
            "Expected {} rows affected, got {}",
            expected,
            self.rows_affected()
        );
    }
}
