use std::sync::Arc;

use crate::app::{AppContext, FeedhookError, Result};
use crate::coordinator::{Coordinator, JobReport};
use crate::shutdown;
use crate::store::StateStore;

/// One pass over every job. Job failures are logged, not returned; an
/// operator interrupt is returned as an error once all jobs have stopped.
pub async fn run_jobs(ctx: Arc<AppContext>) -> Result<Vec<JobReport>> {
    tracing::info!("Starting feedhook with {} jobs", ctx.config.jobs.len());

    let (trigger, shutdown) = shutdown::channel();
    let listener = shutdown::spawn_signal_listener(trigger);

    let reports = Coordinator::new(ctx).run(shutdown.clone()).await;
    listener.abort();

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    tracing::info!(
        "All done: {} jobs succeeded, {} failed",
        reports.len() - failed,
        failed
    );

    if shutdown.is_requested() {
        return Err(FeedhookError::Other("interrupted by user".into()));
    }

    Ok(reports)
}

pub fn list_jobs(ctx: &AppContext) -> Result<()> {
    for job in &ctx.config.jobs {
        let status = match job.validate() {
            Ok(()) => "ok".to_string(),
            Err(e) => e.to_string(),
        };
        let sent = ctx.store.load(&job.state_file).len();

        println!("{} [{}]", job.name, status);
        println!("  feed:  {}", display_or_unset(&job.feed_url));
        println!("  hook:  {}", display_or_unset(&redact_webhook(&job.webhook_url)));
        println!("  state: {} ({} sent)", job.state_file.display(), sent);
    }

    Ok(())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

/// Hides the token part of a webhook URL, which grants posting rights.
fn redact_webhook(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((base, token)) if !token.is_empty() && base.contains("://") => {
            format!("{}/***", base)
        }
        _ => url.to_string(),
    }
}
