//! Identity Service - Database Management Binary
//!
//! Applies and inspects schema migrations for the identity database.
//!
//! # Usage
//!
//! ```bash
//! # Upgrade the core schema to the latest version
//! IDENTITY_DB_CONNECTION=sqlite:///var/lib/identity/identity.db identity-manage db_sync
//!
//! # Upgrade an extension, or move to a specific version
//! identity-manage db_sync --extension oauth1
//! identity-manage db_sync --version 3
//!
//! # Show the current version
//! identity-manage db_version --extension federation
//! ```
//!
//! # Environment Variables
//!
//! * `IDENTITY_DB_CONNECTION` - Connection string (default: in-memory)
//! * `IDENTITY_DB_MAX_CONNECTIONS` - Pool size for file databases (default: 5)
//! * `RUST_LOG` - Log filter (default: info)

use clap::{Parser, Subcommand};
use identity_db::migration::{db_version, find_migrate_repo, sync_database_to_version};
use identity_db::{DatabaseOptions, SqlSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "identity-manage", about = "Identity database management")]
struct Cli {
    /// Connection string; overrides IDENTITY_DB_CONNECTION
    #[arg(long, global = true)]
    connection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate the schema up or down
    #[command(name = "db_sync")]
    DbSync {
        /// Extension whose repository to migrate
        #[arg(long)]
        extension: Option<String>,
        /// Target version (default: latest)
        #[arg(long)]
        version: Option<i64>,
    },
    /// Print the current schema version
    #[command(name = "db_version")]
    DbVersion {
        #[arg(long)]
        extension: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let options = resolve_options(cli.connection)?;
    let session = SqlSession::new(options);
    let engine = session.get_engine().await?;

    let result = match cli.command {
        Command::DbSync { extension, version } => {
            sync_database_to_version(&engine, extension.as_deref(), version)
                .await
                .map(|v| tracing::info!(version = v, "Database synced"))
        }
        Command::DbVersion { extension } => match find_migrate_repo(extension.as_deref()) {
            Ok(repo) => db_version(&engine, repo).await.map(|v| match v {
                Some(version) => println!("{}", version),
                None => println!("not under version control"),
            }),
            Err(e) => Err(e),
        },
    };

    session.cleanup().await;
    result?;
    Ok(())
}

/// Environment options, with `--connection` taking precedence
fn resolve_options(
    connection: Option<String>,
) -> Result<DatabaseOptions, Box<dyn std::error::Error>> {
    let options = DatabaseOptions::from_env()?;
    match connection {
        Some(connection) => Ok(DatabaseOptions {
            max_connections: options.max_connections,
            acquire_timeout: options.acquire_timeout,
            ..DatabaseOptions::from_connection(connection, options.sqlite_db)?
        }),
        None => Ok(options),
    }
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
