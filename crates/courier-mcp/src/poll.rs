//! Fixed-interval polling for asynchronous vendor jobs.
//!
//! Design export and asset upload operations are asynchronous server-side
//! jobs: one request starts the job, and the handle is then polled until it
//! reports a terminal state. With no push channel available, a fixed
//! interval with a hard deadline is the simplest correct strategy; no
//! backoff is applied.
//!
//! # Example
//!
//! ```rust,no_run
//! use courier_mcp::poll::{await_completion, JobState, PollConfig, PollError};
//! use std::time::Duration;
//!
//! async fn example() -> Result<String, PollError> {
//!     let config = PollConfig {
//!         interval: Duration::from_secs(2),
//!         deadline: Duration::from_secs(60),
//!     };
//!
//!     await_completion(&config, || async {
//!         // Fetch job status from the vendor here
//!         Ok(JobState::Success("export-url".to_string()))
//!     }).await
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Polling error types.
#[derive(Debug, Error)]
pub enum PollError {
    /// The job reached the failed state
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// The deadline elapsed without a terminal state
    #[error("Job timed out after {deadline_ms}ms")]
    Timeout {
        /// Deadline in milliseconds.
        deadline_ms: u64,
    },

    /// A status fetch itself failed
    #[error("Status fetch failed: {0}")]
    Fetch(String),
}

/// Observed state of a vendor job.
#[derive(Debug, Clone)]
pub enum JobState<T> {
    /// Still running; poll again after the interval
    Pending,
    /// Terminal: completed with a payload
    Success(T),
    /// Terminal: failed with a reason
    Failed(String),
}

/// Job status on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is still running
    Pending,
    /// Job completed
    Success,
    /// Job failed
    Failed,
}

/// A vendor job handle as returned by job-initiating requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    /// Job ID used for status polling
    pub id: String,

    /// Current status
    pub status: JobStatus,

    /// Failure reason, if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobHandle {
    /// Whether the handle is in a terminal state.
    ///
    /// A terminal handle must never be polled again.
    pub fn is_terminal(&self) -> bool {
        self.status != JobStatus::Pending
    }

    /// Convert the handle into a poll state, consuming it.
    pub fn into_state(self) -> JobState<JobHandle> {
        match self.status {
            JobStatus::Pending => JobState::Pending,
            JobStatus::Success => JobState::Success(self),
            JobStatus::Failed => {
                let reason = self
                    .error
                    .unwrap_or_else(|| "no failure reason reported".to_string());
                JobState::Failed(reason)
            }
        }
    }
}

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed interval between status fetches
    pub interval: Duration,

    /// Hard deadline measured from the first fetch
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            deadline: Duration::from_secs(120),
        }
    }
}

impl PollConfig {
    /// Build a config from millisecond values.
    pub fn from_millis(interval_ms: u64, deadline_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            deadline: Duration::from_millis(deadline_ms),
        }
    }
}

/// Poll a job to completion.
///
/// Calls `fetch` immediately, then every `interval` until the job reports
/// success or failure, or until `deadline` elapses. A failed fetch aborts
/// the loop; there is no retry beyond the next scheduled poll for pending
/// states.
///
/// # Errors
///
/// - [`PollError::JobFailed`] as soon as the job reports failure
/// - [`PollError::Timeout`] once `deadline` has elapsed, never later
/// - [`PollError::Fetch`] if a status fetch itself fails
pub async fn await_completion<T, F, Fut>(config: &PollConfig, mut fetch: F) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<JobState<T>, PollError>>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        match fetch().await? {
            JobState::Success(payload) => {
                tracing::debug!(polls, elapsed_ms = started.elapsed().as_millis() as u64, "Job completed");
                return Ok(payload);
            }
            JobState::Failed(reason) => {
                tracing::warn!(polls, reason = %reason, "Job failed");
                return Err(PollError::JobFailed(reason));
            }
            JobState::Pending => {}
        }

        let remaining = config.deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            tracing::warn!(polls, "Job polling deadline elapsed");
            return Err(PollError::Timeout {
                deadline_ms: config.deadline.as_millis() as u64,
            });
        }

        // Never sleep past the deadline.
        sleep(config.interval.min(remaining)).await;

        if started.elapsed() >= config.deadline {
            tracing::warn!(polls, "Job polling deadline elapsed");
            return Err(PollError::Timeout {
                deadline_ms: config.deadline.as_millis() as u64,
            });
        }
    }
}
