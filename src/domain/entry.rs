use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Placeholder shown when an entry carries no title.
pub const UNTITLED: &str = "No Title";

/// One item pulled out of a feed. Only its identity outlives a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Provider-supplied id or guid, if any.
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            link: link.into(),
            published_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_published(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Stable deduplication key for this entry.
    ///
    /// A non-empty provider id is used verbatim. Otherwise the key is the
    /// hex SHA-256 of `title|link`, with missing fields read as empty.
    pub fn identity(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Self::content_hash(self.title.as_deref().unwrap_or(""), &self.link),
        }
    }

    pub fn content_hash(title: &str, link: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"|");
        hasher.update(link.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED,
        }
    }

    /// Human-readable publication date, empty when the feed gave none.
    pub fn published_display(&self) -> String {
        self.published_at
            .map(|dt| dt.to_rfc2822())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_used_verbatim() {
        let entry = FeedEntry::new("Title", "https://example.com/a").with_id("urn:post:42");
        assert_eq!(entry.identity(), "urn:post:42");
    }

    #[test]
    fn test_equal_provider_ids_share_identity() {
        let a = FeedEntry::new("First", "https://example.com/a").with_id("g1");
        let b = FeedEntry::new("Second", "https://example.com/b").with_id("g1");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_empty_provider_id_falls_back_to_hash() {
        let entry = FeedEntry::new("Title", "https://example.com/a").with_id("");
        assert_eq!(
            entry.identity(),
            FeedEntry::content_hash("Title", "https://example.com/a")
        );
    }

    #[test]
    fn test_hash_ignores_other_fields() {
        let a = FeedEntry::new("Title", "https://example.com/a");
        let b = FeedEntry::new("Title", "https://example.com/a")
            .with_published(Utc::now());
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_hash_matches_sha256_of_joined_fields() {
        let mut hasher = Sha256::new();
        hasher.update("Title|https://example.com/a".as_bytes());
        let expected = hex::encode(hasher.finalize());
        assert_eq!(
            FeedEntry::new("Title", "https://example.com/a").identity(),
            expected
        );
    }

    #[test]
    fn test_degenerate_entries_collide() {
        let a = FeedEntry::default();
        let b = FeedEntry::default();
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.identity(), FeedEntry::content_hash("", ""));
        assert_eq!(a.identity().len(), 64);
    }

    #[test]
    fn test_missing_title_hashes_as_empty_not_placeholder() {
        let entry = FeedEntry {
            link: "https://example.com/a".into(),
            ..Default::default()
        };
        assert_eq!(
            entry.identity(),
            FeedEntry::content_hash("", "https://example.com/a")
        );
        assert_eq!(entry.display_title(), UNTITLED);
    }

    #[test]
    fn test_published_display() {
        let dt = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = FeedEntry::new("T", "L").with_published(dt);
        let shown = entry.published_display();
        assert!(shown.starts_with("Mon, "));
        assert!(shown.ends_with("Jan 2024 00:00:00 +0000"));
        assert_eq!(FeedEntry::new("T", "L").published_display(), "");
    }
}
