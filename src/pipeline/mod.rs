//! One job's pass: load state, fetch, filter, order, deliver, persist.
//!
//! ```text
//! Idle → LoadingState → Fetching → Filtering → Delivering → Persisting → Done
//!   └→ AbortedConfig (webhook or feed URL unusable; nothing else runs)
//! ```
//!
//! Delivery failures are per entry: the failed entry stays out of the sent
//! state so the next run retries it, and the batch carries on.
//!
//! The pacing pause sits between attempts only; nothing follows the last
//! attempt except the state write.

use std::collections::HashSet;
use std::fmt;

use tokio::time::sleep;

use crate::app::{AppContext, DeliveryError, JobError};
use crate::config::DeliveryOrder;
use crate::delivery::{Notifier, WebhookPayload};
use crate::domain::{FeedEntry, Job, SentState};
use crate::fetcher::fetch_entries;
use crate::shutdown::Shutdown;
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    AbortedConfig,
    LoadingState,
    Fetching,
    Filtering,
    Delivering,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::AbortedConfig => "aborted-config",
            Stage::LoadingState => "loading-state",
            Stage::Fetching => "fetching",
            Stage::Filtering => "filtering",
            Stage::Delivering => "delivering",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a completed job did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries taken from the top of the feed.
    pub considered: usize,
    /// Entries not found in the sent state.
    pub new: usize,
    pub delivered: usize,
    pub failed: usize,
    /// New entries left unattempted because shutdown was requested.
    pub skipped: usize,
    /// Whether the sent state was written back.
    pub persisted: bool,
}

/// An entry selected for delivery, with its identity computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub identity: String,
    pub entry: FeedEntry,
}

/// Keeps entries whose identity is not in `sent`, in feed order. Repeats of
/// an identity within the batch are dropped after the first.
pub fn select_new(entries: Vec<FeedEntry>, sent: &SentState) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(|entry| {
            let identity = entry.identity();
            if sent.contains(&identity) || !seen.insert(identity.clone()) {
                None
            } else {
                Some(Candidate { identity, entry })
            }
        })
        .collect()
}

/// Puts new entries in delivery order: oldest first.
pub fn order_for_delivery(mut candidates: Vec<Candidate>, order: DeliveryOrder) -> Vec<Candidate> {
    // Feeds are taken to be newest-first.
    candidates.reverse();

    if order == DeliveryOrder::Published {
        candidates.sort_by_key(|c| (c.entry.published_at.is_none(), c.entry.published_at));
    }

    candidates
}

/// Runs one job to completion.
pub async fn run_job(
    ctx: &AppContext,
    job: &Job,
    mut shutdown: Shutdown,
) -> Result<RunSummary, JobError> {
    tracing::debug!(stage = %Stage::Idle, "Starting job {}", job.name);
    if let Err(e) = job.validate() {
        tracing::debug!(stage = %Stage::AbortedConfig, "{}", e);
        return Err(e);
    }

    let mut summary = RunSummary::default();

    tracing::debug!(stage = %Stage::LoadingState, "Loading {}", job.state_file.display());
    let mut sent = ctx.store.load(&job.state_file);
    tracing::debug!("Loaded {} sent ids from {}", sent.len(), job.state_file.display());

    tracing::debug!(stage = %Stage::Fetching);
    let entries = fetch_entries(
        ctx.fetcher.as_ref(),
        &ctx.normalizer,
        &job.feed_url,
        ctx.config.max_entries,
    )
    .await
    .map_err(JobError::Fetch)?;
    summary.considered = entries.len();

    tracing::debug!(stage = %Stage::Filtering);
    let candidates = order_for_delivery(select_new(entries, &sent), ctx.config.order);
    summary.new = candidates.len();
    tracing::debug!(
        "Feed {}: {} inspected, {} new",
        job.feed_url,
        summary.considered,
        summary.new
    );

    if candidates.is_empty() {
        tracing::info!("No new entries for feed {}", job.feed_url);
        tracing::debug!(stage = %Stage::Done);
        return Ok(summary);
    }

    tracing::info!("Found {} new entries for feed {}", summary.new, job.feed_url);
    tracing::debug!(stage = %Stage::Delivering);

    let pacing = ctx.config.pacing_interval;
    for (i, candidate) in candidates.iter().enumerate() {
        if i > 0 && !pacing.is_zero() {
            tokio::select! {
                _ = sleep(pacing) => {},
                _ = shutdown.requested() => {},
            }
        }
        if shutdown.is_requested() {
            summary.skipped = candidates.len() - i;
            tracing::warn!("Shutdown requested, skipping {} remaining entries", summary.skipped);
            break;
        }

        let entry = &candidate.entry;
        tracing::info!("Sending: {}", entry.display_title());

        let payload = WebhookPayload::for_entry(entry);
        match ctx.notifier.deliver(&job.webhook_url, &payload).await {
            Ok(()) => {
                sent.insert(candidate.identity.clone());
                summary.delivered += 1;
            }
            Err(source) => {
                let err = DeliveryError {
                    identity: candidate.identity.clone(),
                    source,
                };
                tracing::error!("Failed to send {:?}: {}", entry.display_title(), err);
                summary.failed += 1;
            }
        }
    }

    tracing::debug!(stage = %Stage::Persisting);
    ctx.store
        .save(&job.state_file, &sent)
        .map_err(|source| JobError::StateSave {
            path: job.state_file.clone(),
            source,
        })?;
    summary.persisted = true;
    tracing::info!("Updated ids saved to {}", job.state_file.display());

    tracing::debug!(stage = %Stage::Done);
    Ok(summary)
}
