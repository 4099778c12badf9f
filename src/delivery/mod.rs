pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;

use crate::app::Result;
use crate::domain::FeedEntry;

pub use webhook::WebhookClient;

/// Body of a chat webhook post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
}

impl WebhookPayload {
    pub fn new(title: &str, link: &str, published: &str) -> Self {
        Self {
            content: format_message(title, link, published),
        }
    }

    pub fn for_entry(entry: &FeedEntry) -> Self {
        Self::new(
            entry.display_title(),
            &entry.link,
            &entry.published_display(),
        )
    }
}

/// Headline, link and an optional italic publication line.
pub fn format_message(title: &str, link: &str, published: &str) -> String {
    let mut lines = vec![format!("🆕 **{}**", title), link.to_string()];
    if !published.is_empty() {
        lines.push(format!("_Published on: {}_", published));
    }
    lines.join("\n")
}

#[async_trait]
pub trait Notifier {
    /// Posts one notification. Any transport failure or non-2xx status is
    /// an error.
    async fn deliver(&self, endpoint: &str, payload: &WebhookPayload) -> Result<()>;
}
