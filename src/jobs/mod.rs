//! Scheduled Jobs
//!
//! Background work that runs beside request processing. Today that is the
//! daily exchange-rate refresh; it is its own unit of work and only
//! contends with the engines through row-level locks on the rate table.

pub mod rate_refresh;

pub use rate_refresh::{derive_rates, RateRefresher, RefreshReport};

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::repository::RepositoryError;

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// UTC wall-clock time of the daily rate refresh
    pub rate_refresh_at: NaiveTime,
}

/// Time left until the next occurrence of `at`, strictly after `now`
pub fn until_next(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        today + Duration::days(1)
    };
    next - now
}

/// Job Scheduler - runs the daily rate refresh
pub struct JobScheduler {
    refresher: RateRefresher,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a scheduler firing at `config.rate_refresh_at`
    pub fn with_config(refresher: RateRefresher, config: JobSchedulerConfig) -> Self {
        Self { refresher, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(at = %self.config.rate_refresh_at, "Job scheduler started");

        loop {
            let wait = until_next(Utc::now(), self.config.rate_refresh_at);
            tokio::time::sleep(wait.to_std().unwrap_or_default()).await;

            if let Err(e) = self.refresher.run_once().await {
                tracing::error!(error = %e, "Exchange rate refresh failed");
            }
        }
    }
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Rate source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate source data rejected: {0}")]
    Feed(String),
}

// =========================================================================
// Tests
// =========================================================================
