//! Logging setup: console output plus an optional size-rotated log file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::app::Result;
use crate::config::LoggingConfig;

/// Rotate the log file once it grows past this size.
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
/// Rotated files kept as `<file>.1` .. `<file>.N`.
pub const LOG_BACKUPS: usize = 3;

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize tracing. `RUST_LOG` directives take precedence over the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let console = tracing_subscriber::fmt::layer().with_target(false);

    match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            rotate_if_needed(path, MAX_LOG_BYTES, LOG_BACKUPS)?;

            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(console)
                .with(file_layer)
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(console)
                .with(filter)
                .init();
        }
    }

    Ok(())
}

/// Shift `path` to `path.1` (and older backups up by one) when it has
/// reached `max_bytes`. The oldest backup beyond `backups` is dropped.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, backups: usize) -> Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return Ok(false),
    };
    if size < max_bytes {
        return Ok(false);
    }

    if backups == 0 {
        fs::remove_file(path)?;
        return Ok(true);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;

    Ok(true)
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}
