pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedEntry;
use crate::normalizer::Normalizer;

#[async_trait]
pub trait Fetcher {
    /// Retrieves the raw feed body. Transport failures and non-2xx
    /// responses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches and parses the feed at `url`, keeping the first `max_entries`
/// entries in the feed's own order.
pub async fn fetch_entries(
    fetcher: &(dyn Fetcher + Send + Sync),
    normalizer: &Normalizer,
    url: &str,
    max_entries: usize,
) -> Result<Vec<FeedEntry>> {
    tracing::info!("Fetching feed {}", url);

    let body = fetcher.fetch(url).await?;
    let parsed = normalizer.normalize(&body)?;

    if let Some(warning) = &parsed.warning {
        tracing::warn!("Feed parsing issue for {}: {}", url, warning);
    }

    let total = parsed.entries.len();
    let mut entries = parsed.entries;
    entries.truncate(max_entries);

    tracing::debug!("Feed {}: {} entries, {} considered", url, total, entries.len());

    Ok(entries)
}
