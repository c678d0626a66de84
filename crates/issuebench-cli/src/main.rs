use anyhow::Result;
use clap::Parser;
use tracing::debug;

use issuebench_cli::{
    cli::{Cli, Commands},
    commands,
    config::HarnessConfig,
    logging,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HarnessConfig::load(cli.config.as_deref())?;
    logging::init(cli.effective_log_level(config.log_level));
    debug!(?config, "Effective configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Bench { params } => commands::bench::execute(&config.benchmark, params, &mut out),
        Commands::Crash { params } => commands::crash::execute(&config.crash, params, &mut out),
    }
}
