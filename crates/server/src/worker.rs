// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Background job worker.
//!
//! A single task polls the persistent work queue and runs queued ingestion
//! and billing jobs one at a time. Job state is owned by the `work_queue`
//! table; the worker only keeps counters describing its own activity.
//!
//! # Recovery
//!
//! A job interrupted by a crash stays `running` and its upload stays
//! `processing`. Operators re-queue the upload explicitly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use loadbill_api::run_next_job;
use loadbill_persistence::{JobData, JobState, SqlitePersistence};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Activity counters shared between the worker task and the HTTP handlers.
#[derive(Debug, Default)]
pub struct WorkerState {
    completed: AtomicU64,
    failed: AtomicU64,
    queue_errors: AtomicU64,
}

/// Snapshot of [`WorkerState`] for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Jobs that finished successfully.
    pub jobs_completed: u64,
    /// Jobs that finished with an error.
    pub jobs_failed: u64,
    /// Times the queue itself could not be read or updated.
    pub queue_errors: u64,
}

impl WorkerState {
    /// Creates a shared state with zeroed counters.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, job: &JobData) {
        match job.state {
            JobState::Done => self.completed.fetch_add(1, Ordering::Relaxed),
            _ => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Returns the current counters.
    #[must_use]
    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            jobs_completed: self.completed.load(Ordering::Relaxed),
            jobs_failed: self.failed.load(Ordering::Relaxed),
            queue_errors: self.queue_errors.load(Ordering::Relaxed),
        }
    }
}

/// Runs queued jobs until the queue is empty.
///
/// # Returns
///
/// The number of jobs that ran.
pub async fn drain_queue(
    persistence: &Arc<Mutex<SqlitePersistence>>,
    worker: &WorkerState,
) -> usize {
    let mut ran: usize = 0;
    loop {
        let mut guard = persistence.lock().await;
        let result = run_next_job(&mut guard, chrono::Utc::now().naive_utc());
        drop(guard);

        match result {
            Ok(Some(job)) => {
                debug!(
                    job_id = job.job_id,
                    state = job.state.as_str(),
                    "Job finished"
                );
                worker.record(&job);
                ran += 1;
            }
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "Work queue unavailable");
                worker.queue_errors.fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
    }
    ran
}

/// Polls the work queue forever.
pub async fn run_worker(
    persistence: Arc<Mutex<SqlitePersistence>>,
    worker: Arc<WorkerState>,
    poll_interval: Duration,
) {
    info!(
        poll_interval_ms = poll_interval.as_millis(),
        "Job worker started"
    );
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let ran: usize = drain_queue(&persistence, &worker).await;
        if ran > 0 {
            info!(jobs = ran, "Drained work queue");
        }
    }
}
