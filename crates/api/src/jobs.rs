// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Background job submission and execution.
//!
//! Ingestion and billing run through the persistent work queue: the
//! submitting call returns as soon as the job is queued, and a worker later
//! claims and runs it with [`run_next_job`].

use chrono::NaiveDateTime;
use loadbill_persistence::{JobData, JobKind, JobState, SqlitePersistence};
use tracing::{info, warn};

use crate::billing::compute_report;
use crate::error::ApiError;
use crate::ingestion::{get_load_file, process_upload, requeue_upload};
use crate::request_response::BillingRequest;

/// Queues ingestion of a registered upload.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file does not exist.
pub fn enqueue_ingestion(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    now: NaiveDateTime,
) -> Result<JobData, ApiError> {
    get_load_file(persistence, load_file_id)?;
    let job: JobData =
        persistence.enqueue_job(JobKind::Ingest, load_file_id, &serde_json::json!({}), now)?;
    info!(job_id = job.job_id, load_file_id, "Ingestion queued");
    Ok(job)
}

/// Returns an upload stuck in `processing` to the queue.
///
/// The ingestion job left `running` by an interrupted worker is queued again
/// rather than replaced; a new job is queued only when none was left behind.
///
/// # Errors
///
/// - `ResourceNotFound` if the file does not exist
/// - `DomainRuleViolation` if the file is not `processing`
pub fn requeue_ingestion(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    now: NaiveDateTime,
) -> Result<JobData, ApiError> {
    requeue_upload(persistence, load_file_id, now)?;

    let stranded: Option<JobData> = persistence
        .list_jobs_for_target(JobKind::Ingest, load_file_id)?
        .into_iter()
        .find(|job| job.state == JobState::Running);
    let Some(job) = stranded else {
        return enqueue_ingestion(persistence, load_file_id, now);
    };

    persistence.requeue_job(job.job_id)?;
    info!(job_id = job.job_id, load_file_id, "Interrupted ingestion requeued");
    get_job(persistence, job.job_id)
}

/// Queues a billing computation for a load file.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file does not exist.
pub fn enqueue_billing(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    request: &BillingRequest,
    now: NaiveDateTime,
) -> Result<JobData, ApiError> {
    get_load_file(persistence, load_file_id)?;
    let options: serde_json::Value =
        serde_json::to_value(request).map_err(|e| ApiError::Internal {
            message: format!("Failed to encode billing options: {e}"),
        })?;
    let job: JobData = persistence.enqueue_job(JobKind::Billing, load_file_id, &options, now)?;
    info!(job_id = job.job_id, load_file_id, "Billing queued");
    Ok(job)
}

/// Retrieves a job.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the job does not exist.
pub fn get_job(persistence: &mut SqlitePersistence, job_id: i64) -> Result<JobData, ApiError> {
    persistence
        .get_job(job_id)?
        .ok_or_else(|| ApiError::not_found("Job", format!("Job {job_id} does not exist")))
}

/// Runs a claimed job.
///
/// # Errors
///
/// Returns whatever the underlying operation returns.
pub fn run_job(
    persistence: &mut SqlitePersistence,
    job: &JobData,
    now: NaiveDateTime,
) -> Result<(), ApiError> {
    match job.kind {
        JobKind::Ingest => {
            process_upload(persistence, job.target_id, now)?;
        }
        JobKind::Billing => {
            let request: BillingRequest = serde_json::from_value(job.options.clone())
                .map_err(|e| ApiError::invalid("options", e.to_string()))?;
            compute_report(persistence, job.target_id, &request, now)?;
        }
    }
    Ok(())
}

/// Claims the oldest queued job, runs it and records the outcome.
///
/// # Returns
///
/// The finished job, or `None` when the queue is empty.
///
/// # Errors
///
/// Returns an error only if the queue itself cannot be read or updated; a
/// failing job is recorded as failed and returned.
pub fn run_next_job(
    persistence: &mut SqlitePersistence,
    now: NaiveDateTime,
) -> Result<Option<JobData>, ApiError> {
    let Some(job) = persistence.claim_next_job(now)? else {
        return Ok(None);
    };
    info!(
        job_id = job.job_id,
        kind = job.kind.as_str(),
        target_id = job.target_id,
        attempt = job.attempts,
        "Running job"
    );

    match run_job(persistence, &job, now) {
        Ok(()) => persistence.complete_job(job.job_id, now)?,
        Err(err) => {
            warn!(job_id = job.job_id, error = %err, "Job failed");
            persistence.fail_job(job.job_id, &err.to_string(), now)?;
        }
    }

    get_job(persistence, job.job_id).map(Some)
}
