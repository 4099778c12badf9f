//! Runs every configured job concurrently, one task per job.
//!
//! Jobs share nothing mutable: each owns its feed, its channel and its
//! state file. A job that fails (bad configuration, fetch error, panic) is
//! reported and never cancels its siblings.

use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::app::{AppContext, JobError};
use crate::domain::Job;
use crate::pipeline::{run_job, RunSummary};
use crate::shutdown::Shutdown;

/// Terminal state of one job.
#[derive(Debug)]
pub struct JobReport {
    pub job: String,
    pub result: Result<RunSummary, JobError>,
}

impl JobReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Coordinator {
    ctx: Arc<AppContext>,
}

impl Coordinator {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Runs all configured jobs and waits for every one of them to finish.
    /// Reports come back in configuration order.
    pub async fn run(&self, shutdown: Shutdown) -> Vec<JobReport> {
        self.run_jobs(self.ctx.config.jobs.clone(), shutdown).await
    }

    pub async fn run_jobs(&self, jobs: Vec<Job>, shutdown: Shutdown) -> Vec<JobReport> {
        let mut names = Vec::with_capacity(jobs.len());
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let ctx = self.ctx.clone();
            let shutdown = shutdown.clone();
            let span = tracing::info_span!("job", name = %job.name);

            names.push(job.name.clone());
            handles.push(tokio::spawn(
                async move { run_job(&ctx, &job, shutdown).await }.instrument(span),
            ));
        }

        let results = join_all(handles).await;

        let reports: Vec<JobReport> = names
            .into_iter()
            .zip(results)
            .map(|(job, joined)| {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => Err(JobError::Panicked(e.to_string())),
                };
                JobReport { job, result }
            })
            .collect();

        for report in &reports {
            match &report.result {
                Ok(summary) => tracing::info!(
                    "Job {} done: {} new, {} delivered, {} failed",
                    report.job,
                    summary.new,
                    summary.delivered,
                    summary.failed
                ),
                Err(e) => tracing::error!("Error in job {}: {}", report.job, e),
            }
        }

        reports
    }
}
