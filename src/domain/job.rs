use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::app::JobError;

/// A (channel, feed, state file) triple processed as one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub webhook_url: String,
    pub feed_url: String,
    pub state_file: PathBuf,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        webhook_url: impl Into<String>,
        feed_url: impl Into<String>,
        state_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            webhook_url: webhook_url.into(),
            feed_url: feed_url.into(),
            state_file: state_file.into(),
        }
    }

    /// Checks that both endpoints are set and are absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), JobError> {
        check_url("webhook URL", &self.webhook_url)?;
        check_url("feed URL", &self.feed_url)?;
        Ok(())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn check_url(what: &str, value: &str) -> Result<(), JobError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(JobError::Config(format!("{} is not set", what)));
    }

    let url = Url::parse(value)
        .map_err(|e| JobError::Config(format!("{} {:?} is invalid: {}", what, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(JobError::Config(format!(
            "{} {:?} has unsupported scheme {}",
            what, value, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(webhook: &str, feed: &str) -> Job {
        Job::new("test", webhook, feed, "test_sent_ids.json")
    }

    #[test]
    fn test_valid_job() {
        let job = job(
            "https://discord.com/api/webhooks/1/abc",
            "https://medium.com/feed/tag/rust",
        );
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_blank_webhook_is_config_error() {
        let err = job("   ", "https://example.com/feed").validate().unwrap_err();
        assert!(matches!(err, JobError::Config(ref msg) if msg.contains("webhook")));
    }

    #[test]
    fn test_blank_feed_is_config_error() {
        let err = job("https://example.com/hook", "").validate().unwrap_err();
        assert!(matches!(err, JobError::Config(ref msg) if msg.contains("feed")));
    }

    #[test]
    fn test_relative_url_is_config_error() {
        assert!(job("not a url", "https://example.com/feed").validate().is_err());
    }

    #[test]
    fn test_non_http_scheme_is_config_error() {
        assert!(job("https://example.com/hook", "ftp://example.com/feed")
            .validate()
            .is_err());
    }
}
