use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use lcrd::bootstrap::Server;
use lcrd::config::{Config, ReferenceConfig};
use lcrd::telemetry::{counters, init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(name = "lcrd")]
#[command(author, version, about = "Least-cost SMS routing decision service")]
struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Validate config and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (to get log settings)
    let config = Config::load(&args.config)?;

    init_tracing(&TracingConfig::from_telemetry("lcrd", &config.telemetry))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "starting lcrd"
    );

    info!(
        address = %config.server.address,
        backend = match config.reference {
            ReferenceConfig::Memory(_) => "memory",
            ReferenceConfig::Postgres(_) => "postgres",
        },
        max_backups = config.routing.max_backups,
        "configuration loaded"
    );

    // Validate only mode
    if args.validate {
        info!("configuration is valid");
        return Ok(());
    }

    counters::init();

    Server::new(config).run().await?;

    Ok(())
}
