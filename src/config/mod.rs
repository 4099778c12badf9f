//! Configuration for a feedhook run.
//!
//! Built once at startup from, in increasing priority: built-in defaults,
//! an optional TOML file, and the process environment (a `.env` file in the
//! working directory is loaded first). The result is immutable and shared by
//! reference with every job.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::Job;

pub const DEFAULT_MAX_ENTRIES: usize = 5;
/// 4500 seconds: a deliberately long spacing between posts.
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 4_500_000;
pub const DEFAULT_JOBS: &str = "fastapi,ml";
pub const DEFAULT_LOG_FILE: &str = "logs/feedhook.log";

/// Order in which newly found entries are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOrder {
    /// Reverse of the feed's own order, assuming the feed is newest-first.
    #[default]
    Feed,
    /// Oldest publication date first; undated entries go last in feed order.
    Published,
}

impl FromStr for DeliveryOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feed" => Ok(Self::Feed),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown delivery order: {}", other)),
        }
    }
}

impl fmt::Display for DeliveryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed => f.write_str("feed"),
            Self::Published => f.write_str("published"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file mirrored from the console; `None` disables file logging.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    /// Entries considered per fetch, counted from the top of the feed.
    pub max_entries: usize,
    /// Pause between consecutive deliveries within one job.
    pub pacing_interval: Duration,
    pub state_dir: PathBuf,
    pub order: DeliveryOrder,
    pub logging: LoggingConfig,
    pub jobs: Vec<Job>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            pacing_interval: Duration::from_millis(DEFAULT_PACING_INTERVAL_MS),
            state_dir: PathBuf::from("."),
            order: DeliveryOrder::default(),
            logging: LoggingConfig::default(),
            jobs: Vec::new(),
        }
    }
}

/// Shape of the optional TOML file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub max_entries: Option<usize>,
    pub pacing_interval_ms: Option<u64>,
    pub state_dir: Option<PathBuf>,
    pub order: Option<DeliveryOrder>,
    pub logging: Option<FileLogging>,
    pub jobs: Vec<FileJob>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct FileJob {
    pub name: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub feed_url: String,
    pub state_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Config {
    /// Loads `.env`, then the TOML file at `path` (or `$FEEDHOOK_CONFIG`),
    /// then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let env: HashMap<String, String> = std::env::vars().collect();
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env.get("FEEDHOOK_CONFIG").map(PathBuf::from));

        let file = match path {
            Some(path) => Some(FileConfig::read(&path)?),
            None => None,
        };

        Self::from_sources(file, |key| env.get(key).cloned())
    }

    /// Builds a configuration from an optional parsed file and an
    /// environment lookup.
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut file_jobs = Vec::new();

        if let Some(file) = file {
            if let Some(max_entries) = file.max_entries {
                config.max_entries = max_entries;
            }
            if let Some(ms) = file.pacing_interval_ms {
                config.pacing_interval = Duration::from_millis(ms);
            }
            if let Some(state_dir) = file.state_dir {
                config.state_dir = state_dir;
            }
            if let Some(order) = file.order {
                config.order = order;
            }
            if let Some(logging) = file.logging {
                if let Some(level) = logging.level {
                    config.logging.level = level;
                }
                if let Some(path) = logging.file {
                    config.logging.file = non_empty_path(path);
                }
            }
            file_jobs = file.jobs;
        }

        if let Some(value) = env("MAX_POSTS") {
            config.max_entries = parse_value("MAX_POSTS", &value)?;
        }
        if let Some(value) = env("PACING_INTERVAL_MS") {
            config.pacing_interval = Duration::from_millis(parse_value("PACING_INTERVAL_MS", &value)?);
        }
        if let Some(value) = env("STATE_DIR") {
            config.state_dir = PathBuf::from(value.trim());
        }
        if let Some(value) = env("DELIVERY_ORDER") {
            config.order = parse_value("DELIVERY_ORDER", &value)?;
        }
        if let Some(value) = env("LOG_LEVEL") {
            config.logging.level = value.trim().to_string();
        }
        if let Some(value) = env("LOG_FILE") {
            config.logging.file = non_empty_path(PathBuf::from(value.trim()));
        }

        config.jobs = if file_jobs.is_empty() {
            let names = env("JOBS").unwrap_or_else(|| DEFAULT_JOBS.to_string());
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| config.job_from_env(name, &env))
                .collect()
        } else {
            file_jobs
                .into_iter()
                .map(|job| {
                    let state_file = job
                        .state_file
                        .unwrap_or_else(|| config.default_state_file(&job.name));
                    Job::new(job.name, job.webhook_url.trim(), job.feed_url.trim(), state_file)
                })
                .collect()
        };

        config.validate()?;
        Ok(config)
    }

    fn job_from_env<F>(&self, name: &str, env: &F) -> Job
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = name.to_uppercase().replace('-', "_");
        let lookup = |var: String| env(&var).map(|v| v.trim().to_string()).unwrap_or_default();

        let webhook_url = lookup(format!("DISCORD_{}_URL", key));
        let feed_url = lookup(format!("FEED_{}_URL", key));
        let state_file = match lookup(format!("{}_STATE_FILE", key)) {
            path if path.is_empty() => self.default_state_file(name),
            path => PathBuf::from(path),
        };

        Job::new(name, webhook_url, feed_url, state_file)
    }

    fn default_state_file(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{}_sent_ids.json", name))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }

        let mut owners: HashMap<PathBuf, &str> = HashMap::new();
        for job in &self.jobs {
            if let Some(first) = owners.insert(same_file_key(&job.state_file), job.name.as_str()) {
                return Err(ConfigError::SharedStateFile {
                    path: job.state_file.clone(),
                    first: first.to_string(),
                    second: job.name.clone(),
                });
            }
        }

        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// A key under which two spellings of the same state file compare equal:
/// absolute, with `.` and `..` resolved, and the parent directory's symlinks
/// resolved when it exists.
fn same_file_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    match (cleaned.parent(), cleaned.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => cleaned,
        },
        _ => cleaned,
    }
}

fn non_empty_path(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("No jobs configured")]
    NoJobs,

    #[error("Jobs {first} and {second} share the state file {path}")]
    SharedStateFile {
        path: PathBuf,
        first: String,
        second: String,
    },
}
