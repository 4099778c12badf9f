use std::sync::Arc;

use crate::config::Config;
use crate::delivery::{Notifier, WebhookClient};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::{JsonStateStore, StateStore};

/// Everything a job needs, shared read-only across all jobs.
pub struct AppContext {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub store: Arc<dyn StateStore + Send + Sync>,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self::with_components(
            config,
            Arc::new(HttpFetcher::new()),
            Arc::new(WebhookClient::new()),
            Arc::new(JsonStateStore::new()),
        )
    }

    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
        store: Arc<dyn StateStore + Send + Sync>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            notifier,
            store,
            normalizer: Normalizer::new(),
        }
    }
}
