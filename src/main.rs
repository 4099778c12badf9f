use std::sync::Arc;

use clap::Parser;

use feedhook::app::AppContext;
use feedhook::cli::{commands, Cli, Commands};
use feedhook::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(max_entries) = cli.max_entries {
        config.max_entries = max_entries;
    }
    if cli.no_log_file {
        config.logging.file = None;
    }

    feedhook::logging::init(&config.logging)?;

    let ctx = AppContext::new(config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            commands::run_jobs(Arc::new(ctx)).await?;
        }
        Commands::Jobs => {
            commands::list_jobs(&ctx)?;
        }
    }

    Ok(())
}
