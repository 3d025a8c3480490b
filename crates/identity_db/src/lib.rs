//! Identity Service SQL Layer
//!
//! This crate provides the database layer of the identity service on SQLite
//! using SQLx.
//!
//! # Architecture
//!
//! - `config`: connection options, including the in-memory marker
//! - `engine`: engine creation and the cached session that owns it
//! - `models`: table models and the static registry of model modules
//! - `migration`: versioned migration repositories and the runner that
//!   applies them
//!
//! Table models and migrations are maintained separately: migrations are the
//! source of truth for an upgraded schema, while `Metadata::create_all`
//! creates any registered table the migrations have not produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use identity_db::{DatabaseOptions, SqlSession, migration};
//!
//! let session = SqlSession::new(DatabaseOptions::file("/tmp/identity.db"));
//! let engine = session.get_engine().await?;
//! migration::db_sync(&engine, &migration::find_migrate_repo(None)?, None).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod migration;
pub mod models;

pub use config::{DatabaseOptions, IN_MEMORY_CONNECTION};
pub use engine::{create_engine, Engine, SqlSession};
pub use error::DatabaseError;
pub use migration::{MigrationRepository, SchemaMigrator, SqlMigrator};
pub use models::{Metadata, ModelModule, TableModel, MODEL_MODULES};
