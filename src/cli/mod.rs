pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedhook")]
#[command(about = "Forward new feed entries to chat webhooks", long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to $FEEDHOOK_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Entries considered per fetch (overrides MAX_POSTS)
    #[arg(short, long, global = true)]
    pub max_entries: Option<usize>,

    /// Log to the console only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run every job once (default)
    Run,
    /// List configured jobs and their sent state
    Jobs,
}
