//! Command-line interface.
//!
//! Applications embed their migrations by building a [`MigrationRegistry`]
//! and handing it to [`run`] from their own `main`:
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse();
//!     init_tracing(cli.verbose)?;
//!     let mut registry = MigrationRegistry::new();
//!     registry.register("2024_03_01_120000_create_users_table", CreateUsersTable)?;
//!     run(cli, registry).await
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use machinjiri_sql_core::Database;
use machinjiri_sql_sqlite::SqliteConnector;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{MigrateConfig, DEFAULT_CONFIG_FILE};
use crate::creator::MigrationCreator;
use crate::error::MigrateError;
use crate::handler::MigrationHandler;
use crate::migration::MigrationRegistry;

/// Batch-based database migrations.
#[derive(Debug, Parser)]
#[command(name = "machinjiri-migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database URL. Overrides the configuration file.
    #[arg(short, long, env = "DATABASE_URL")]
    pub database: Option<String>,

    /// Configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Migrations directory. Overrides the configuration file.
    #[arg(short, long)]
    pub migrations_dir: Option<PathBuf>,

    /// Ledger table. Overrides the configuration file.
    #[arg(short, long)]
    pub table: Option<String>,

    /// Table name prefix. Overrides the configuration file.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the ledger table and a default configuration file.
    Init,

    /// Apply pending migrations as a new batch.
    Migrate,

    /// Roll back the last batch.
    Rollback,

    /// Roll back every batch.
    Reset,

    /// Show applied and pending migrations.
    Status,

    /// Create a new migration file.
    Make {
        /// Snake-case name, e.g. `create_users_table`.
        name: String,
    },
}

impl Cli {
    /// Loads the configuration file and applies command-line overrides.
    pub fn resolve_config(&self) -> crate::Result<MigrateConfig> {
        let mut config = MigrateConfig::load(&self.config)?;
        if let Some(url) = &self.database {
            config.database_url.clone_from(url);
        }
        if let Some(dir) = &self.migrations_dir {
            config.migrations_dir.clone_from(dir);
        }
        if let Some(table) = &self.table {
            config.migrations_table.clone_from(table);
        }
        if let Some(prefix) = &self.prefix {
            config.table_prefix.clone_from(prefix);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Installs the global `tracing` subscriber.
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Opens the database named by `config`.
pub async fn connect(config: &MigrateConfig) -> crate::Result<Database> {
    if !config.database_url.starts_with("sqlite:") {
        return Err(MigrateError::Config(format!(
            "unsupported database url '{}': only sqlite is available",
            config.database_url
        )));
    }
    let connection =
        SqliteConnector::connect(&config.database_url, config.max_connections).await?;
    Ok(Database::with_prefix(
        Arc::new(connection),
        &config.table_prefix,
    )?)
}

/// Executes `cli` against the migrations in `registry`.
pub async fn run(cli: Cli, registry: MigrationRegistry) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;

    if let Command::Make { name } = &cli.command {
        let path = MigrationCreator::new(&config.migrations_dir).create(name)?;
        println!("Created migration: {}", path.display());
        return Ok(());
    }

    let db = connect(&config).await?;
    let handler =
        MigrationHandler::with_table(db, Arc::new(registry), &config.migrations_table).await?;

    match cli.command {
        Command::Init => {
            info!(table = %config.migrations_table, "Migration ledger ready");
            if cli.config.exists() {
                info!(path = %cli.config.display(), "Configuration file already exists");
            } else {
                config.save(&cli.config)?;
                info!(path = %cli.config.display(), "Configuration file written");
            }
        }

        Command::Migrate => {
            let applied = handler.migrate().await?;
            if !applied.is_empty() {
                info!(count = applied.len(), "Migrations applied");
            }
        }

        Command::Rollback => {
            let rolled_back = handler.rollback().await?;
            if !rolled_back.is_empty() {
                info!(count = rolled_back.len(), "Migrations rolled back");
            }
        }

        Command::Reset => {
            let rolled_back = handler.reset().await?;
            info!(count = rolled_back.len(), "Database reset");
        }

        Command::Status => {
            let statuses = handler.status().await?;
            if statuses.is_empty() {
                info!("No migrations registered.");
                return Ok(());
            }

            println!("\nMigrations:");
            println!("{:-<60}", "");
            for status in &statuses {
                let mark = if status.is_applied() { "X" } else { " " };
                let batch = status
                    .batch
                    .map(|b| format!(" (batch {b})"))
                    .unwrap_or_default();
                let missing = if status.registered { "" } else { " [missing]" };
                println!(" [{mark}] {}{batch}{missing}", status.name);
            }
            println!();
        }

        Command::Make { .. } => {
            warn!("make is handled before connecting");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "machinjiri-migrate",
            "--database",
            "sqlite::memory:",
            "--table",
            "schema_log",
            "make",
            "create_users_table",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(cli.command, Command::Make { ref name } if name == "create_users_table"));

        let cli = Cli::try_parse_from(["machinjiri-migrate", "-v", "rollback"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Rollback));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("machinjiri.json");
        std::fs::write(
            &path,
            r#"{"database_url": "sqlite:file.db", "migrations_table": "from_file"}"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "machinjiri-migrate",
            "--config",
            path.to_str().unwrap(),
            "--database",
            "sqlite:flag.db",
            "--prefix",
            "app_",
            "status",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.database_url, "sqlite:flag.db");
        assert_eq!(config.migrations_table, "from_file");
        assert_eq!(config.table_prefix, "app_");
    }

    #[tokio::test]
    async fn test_connect_rejects_other_drivers() {
        let config = MigrateConfig {
            database_url: String::from("mysql://localhost/app"),
            ..MigrateConfig::default()
        };
        let err = connect(&config).await.unwrap_err();
        assert_eq!(err.code(), 2005);
    }
}
