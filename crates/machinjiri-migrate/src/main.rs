//! machinjiri-migrate CLI
//!
//! Standalone binary with an empty registry. Applications that ship
//! migrations call [`machinjiri_migrate::cli::run`] with their own registry.

use clap::Parser;

use machinjiri_migrate::cli::{init_tracing, run, Cli};
use machinjiri_migrate::MigrationRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    run(cli, MigrationRegistry::new()).await
}
