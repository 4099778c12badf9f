//! # Feedhook
//!
//! Polls syndication feeds and forwards entries that have not been sent
//! before to chat webhooks, remembering what was delivered per job.
//!
//! ## Architecture
//!
//! ```text
//! Coordinator ─┬─ Pipeline(job 1): State → Fetcher → Normalizer → Filter → Delivery → State
//!              └─ Pipeline(job 2): ...
//! ```
//!
//! Each job is a (webhook, feed, state file) triple and runs as its own
//! task. A run is a single pass; scheduling repeated runs is left to cron,
//! a systemd timer or similar.
//!
//! ## Quick Start
//!
//! ```bash
//! export JOBS=rust
//! export DISCORD_RUST_URL=https://discord.com/api/webhooks/...
//! export FEED_RUST_URL=https://blog.rust-lang.org/feed.xml
//!
//! # Deliver anything new
//! feedhook
//!
//! # Inspect configured jobs
//! feedhook jobs
//! ```

/// Application context and error types.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetcher,
/// notifier, state store and configuration shared by all jobs.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration from defaults, a TOML file and the environment.
pub mod config;

/// Runs all jobs concurrently with per-job failure isolation.
pub mod coordinator;

/// Webhook message formatting and delivery.
pub mod delivery;

/// Core domain models.
///
/// - [`FeedEntry`](domain::FeedEntry): an entry and its dedup identity
/// - [`SentState`](domain::SentState): identities already delivered
/// - [`Job`](domain::Job): one feed/channel/state-file triple
pub mod domain;

/// HTTP fetching of feed bodies.
pub mod fetcher;

/// Tracing setup with a rotated log file.
pub mod logging;

/// Feed parsing with recovery for malformed bodies.
pub mod normalizer;

/// The per-job fetch → filter → deliver → persist pass.
pub mod pipeline;

/// Graceful handling of operator interrupts.
pub mod shutdown;

/// Sent-state persistence.
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
