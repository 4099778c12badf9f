use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FeedhookError>;

/// Why a single job stopped before reaching `Done`.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(#[source] FeedhookError),

    #[error("failed to save sent state to {path}: {source}")]
    StateSave {
        path: std::path::PathBuf,
        #[source]
        source: FeedhookError,
    },

    #[error("job task panicked: {0}")]
    Panicked(String),
}

/// A single failed delivery attempt. Never aborts the batch.
#[derive(Error, Debug)]
#[error("delivery of {identity} failed: {source}")]
pub struct DeliveryError {
    pub identity: String,
    #[source]
    pub source: FeedhookError,
}
