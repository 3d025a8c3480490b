//! Table models and the model registry
//!
//! Every backend that stores data in SQL declares its tables in a
//! `ModelModule`. `MODEL_MODULES` lists all of them, so the schema produced by
//! `Metadata::create_all` never depends on which backends a caller happened
//! to touch first.
//!
//! # Ordering
//!
//! The registry is kept in dependency order: a table only references tables
//! registered before it. `create_all` walks that order forwards and
//! `drop_all` walks it backwards, which keeps both valid with foreign key
//! enforcement switched on.

pub mod assignment;
pub mod catalog;
pub mod contrib;
pub mod credential;
pub mod identity;
pub mod policy;
pub mod token;
pub mod trust;

use std::collections::HashSet;

use sqlx::Executor;
use tracing::debug;

use crate::engine::Engine;
use crate::error::DatabaseError;

/// A single table: its name and the idempotent DDL that creates it
///
/// `create_sql` may hold several statements (the table and its indexes) and
/// must only use `IF NOT EXISTS` forms.
#[derive(Debug, PartialEq, Eq)]
pub struct TableModel {
    pub name: &'static str,
    pub create_sql: &'static str,
}

impl TableModel {
    /// Statement that drops this table if it exists
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name)
    }
}

/// The tables owned by one backend
#[derive(Debug, PartialEq, Eq)]
pub struct ModelModule {
    /// Dotted path of the backend, e.g. `identity` or `contrib.oauth1`
    pub name: &'static str,
    pub tables: &'static [TableModel],
}

/// Every model module, in dependency order
pub static MODEL_MODULES: &[&ModelModule] = &[
    &assignment::MODULE,
    &identity::MODULE,
    &catalog::MODULE,
    &credential::MODULE,
    &policy::MODULE,
    &token::MODULE,
    &trust::MODULE,
    &contrib::endpoint_filter::MODULE,
    &contrib::oauth1::MODULE,
    &contrib::revoke::MODULE,
    &contrib::federation::MODULE,
];

/// The set of registered model modules
///
/// # Example
///
/// ```rust
/// use identity_db::{Metadata, MODEL_MODULES};
///
/// let metadata = Metadata::load(MODEL_MODULES);
/// assert!(metadata.table_names().contains(&"user"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    modules: Vec<&'static ModelModule>,
}

impl Metadata {
    /// Registers each module of `registry` in order
    ///
    /// A module whose name is already registered is skipped, so loading the
    /// same registry twice yields the same metadata.
    pub fn load(registry: &[&'static ModelModule]) -> Self {
        let mut metadata = Self::default();
        for module in registry {
            metadata.register(module);
        }
        metadata
    }

    /// Registers a single module; returns false if it was already present
    pub fn register(&mut self, module: &'static ModelModule) -> bool {
        if self.modules.iter().any(|m| m.name == module.name) {
            return false;
        }
        debug!(module = module.name, tables = module.tables.len(), "Registered model module");
        self.modules.push(module);
        true
    }

    /// Registered modules in registration order
    pub fn modules(&self) -> &[&'static ModelModule] {
        &self.modules
    }

    /// Registered tables in registration order
    pub fn tables(&self) -> impl Iterator<Item = &'static TableModel> + '_ {
        self.modules.iter().flat_map(|module| module.tables.iter())
    }

    /// Names of the registered tables in registration order
    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables().map(|table| table.name).collect()
    }

    /// Returns true if no two registered tables share a name
    pub fn has_unique_tables(&self) -> bool {
        let mut seen = HashSet::new();
        self.tables().all(|table| seen.insert(table.name))
    }

    /// Creates every registered table that does not exist yet
    pub async fn create_all(&self, engine: &Engine) -> Result<(), DatabaseError> {
        let mut tx = engine.begin().await?;
        for table in self.tables() {
            (&mut *tx).execute(sqlx::raw_sql(table.create_sql)).await?;
        }
        tx.commit().await?;

        debug!(tables = self.tables().count(), "Created registered tables");
        Ok(())
    }

    /// Drops every registered table, children first
    pub async fn drop_all(&self, engine: &Engine) -> Result<(), DatabaseError> {
        let tables: Vec<_> = self.tables().collect();

        let mut tx = engine.begin().await?;
        for table in tables.iter().rev() {
            sqlx::query(&table.drop_sql()).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(tables = tables.len(), "Dropped registered tables");
        Ok(())
    }
}
