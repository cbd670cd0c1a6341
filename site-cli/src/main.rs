use clap::Parser;
use tracing::debug;

use site_cli::cli::Cli;
use site_cli::{commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging("info", cli.log_file.as_deref())?;
    debug!(command = ?cli.command, "Starting");

    commands::run(&cli).await
}
