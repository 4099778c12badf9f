//! Stub collaborators shared by pipeline and coordinator tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{AppContext, FeedhookError, Result};
use crate::config::Config;
use crate::delivery::{Notifier, WebhookPayload};
use crate::domain::SentState;
use crate::fetcher::Fetcher;
use crate::shutdown::ShutdownTrigger;
use crate::store::StateStore;

pub struct TestItem {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: String,
}

impl TestItem {
    pub fn guid(id: &str) -> Self {
        Self {
            guid: Some(id.to_string()),
            title: Some(format!("Post {}", id)),
            link: format!("https://example.com/{}", id),
        }
    }

    pub fn untitled(link: &str) -> Self {
        Self {
            guid: None,
            title: None,
            link: link.to_string(),
        }
    }
}

/// Renders an RSS 2.0 document, items in the given (newest-first) order.
pub fn rss(items: &[TestItem]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test</title>"#,
    );
    for item in items {
        body.push_str("<item>");
        if let Some(title) = &item.title {
            body.push_str(&format!("<title>{}</title>", title));
        }
        body.push_str(&format!("<link>{}</link>", item.link));
        if let Some(guid) = &item.guid {
            body.push_str(&format!("<guid>{}</guid>", guid));
        }
        body.push_str("</item>");
    }
    body.push_str("</channel></rss>");
    body
}

pub fn test_config() -> Config {
    Config {
        pacing_interval: Duration::ZERO,
        logging: crate::config::LoggingConfig {
            level: "debug".into(),
            file: None,
        },
        ..Config::default()
    }
}

pub fn context<F, N, S>(fetcher: F, notifier: N, store: S) -> AppContext
where
    F: Fetcher + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    AppContext::with_components(
        test_config(),
        Arc::new(fetcher),
        Arc::new(notifier),
        Arc::new(store),
    )
}

/// Serves one fixed body for every URL, or fails every fetch.
#[derive(Clone)]
pub struct StaticFetcher {
    body: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new(body: String) -> Self {
        Self {
            body: Some(body),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => Ok(body.as_bytes().to_vec()),
            None => Err(FeedhookError::Other(format!("connection refused: {}", url))),
        }
    }
}

/// Serves a different body per URL; unknown URLs fail.
#[derive(Clone, Default)]
pub struct RoutedFetcher {
    routes: Arc<Mutex<Vec<(String, String)>>>,
}

impl RoutedFetcher {
    pub fn route(self, url: &str, body: String) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((url.to_string(), body));
        self
    }
}

#[async_trait]
impl Fetcher for RoutedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|(route, _)| route == url)
            .map(|(_, body)| body.as_bytes().to_vec())
            .ok_or_else(|| FeedhookError::Other(format!("no route for {}", url)))
    }
}

#[derive(Default)]
struct NotifierState {
    attempts: Vec<(String, WebhookPayload)>,
    failing_titles: HashSet<String>,
    trigger: Option<ShutdownTrigger>,
}

/// Records every delivery attempt; fails for configured titles.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(titles: &[&str]) -> Self {
        let notifier = Self::new();
        notifier.state.lock().unwrap().failing_titles =
            titles.iter().map(|t| t.to_string()).collect();
        notifier
    }

    /// Fires `trigger` after the first successful delivery.
    pub fn trigger_after_first(self, trigger: ShutdownTrigger) -> Self {
        self.state.lock().unwrap().trigger = Some(trigger);
        self
    }

    pub fn heal(&self) {
        self.state.lock().unwrap().failing_titles.clear();
    }

    pub fn contents(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(_, payload)| payload.content.clone())
            .collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }

    /// Titles of attempted deliveries, in attempt order.
    pub fn titles(&self) -> Vec<String> {
        self.contents().iter().map(|c| headline_title(c)).collect()
    }
}

fn headline_title(content: &str) -> String {
    let headline = content.lines().next().unwrap_or_default();
    headline
        .trim_start_matches("🆕 **")
        .trim_end_matches("**")
        .to_string()
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, endpoint: &str, payload: &WebhookPayload) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .attempts
            .push((endpoint.to_string(), payload.clone()));

        if state.failing_titles.contains(&headline_title(&payload.content)) {
            return Err(FeedhookError::Other("webhook returned 500".into()));
        }
        if let Some(trigger) = state.trigger.take() {
            trigger.trigger();
        }
        Ok(())
    }
}

/// Loads nothing and refuses every save.
pub struct FailingStore;

impl StateStore for FailingStore {
    fn load(&self, _path: &Path) -> SentState {
        SentState::new()
    }

    fn save(&self, path: &Path, _state: &SentState) -> Result<()> {
        Err(FeedhookError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("read-only: {}", path.display()),
        )))
    }
}
