// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work queue mutations.
//!
//! Jobs move `queued -> running -> done | failed`. A failed or interrupted
//! job can be put back in the queue with [`requeue_job`].

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info, warn};

use crate::backend::PersistenceBackend;
use crate::conversions::format_timestamp;
use crate::data_models::{JobData, JobKind, JobState};
use crate::diesel_schema::work_queue;
use crate::error::PersistenceError;
use crate::queries::jobs::{get_job, oldest_queued_row};

fn require_job(conn: &mut SqliteConnection, job_id: i64) -> Result<JobData, PersistenceError> {
    get_job(conn, job_id)?.ok_or_else(|| PersistenceError::NotFound(format!("Job {job_id}")))
}

/// Adds a job to the end of the queue.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn enqueue_job(
    conn: &mut SqliteConnection,
    kind: JobKind,
    target_id: i64,
    options: &serde_json::Value,
    now: NaiveDateTime,
) -> Result<JobData, PersistenceError> {
    diesel::insert_into(work_queue::table)
        .values((
            work_queue::kind.eq(kind.as_str()),
            work_queue::target_id.eq(target_id),
            work_queue::options.eq(serde_json::to_string(options)?),
            work_queue::state.eq(JobState::Queued.as_str()),
            work_queue::created_at.eq(format_timestamp(now)),
        ))
        .execute(conn)?;
    let job_id: i64 = conn.get_last_insert_rowid()?;

    info!(job_id, kind = kind.as_str(), target_id, "Enqueued job");
    require_job(conn, job_id)
}

/// Claims the oldest queued job, marking it running.
///
/// # Returns
///
/// `None` when the queue is empty.
///
/// # Errors
///
/// Returns an error if a statement fails.
pub fn claim_next_job(
    conn: &mut SqliteConnection,
    now: NaiveDateTime,
) -> Result<Option<JobData>, PersistenceError> {
    let claimed: Option<i64> = conn.immediate_transaction(|conn| {
        let Some(row) = oldest_queued_row(conn)? else {
            return Ok::<Option<i64>, PersistenceError>(None);
        };

        diesel::update(work_queue::table)
            .filter(work_queue::job_id.eq(row.job_id))
            .set((
                work_queue::state.eq(JobState::Running.as_str()),
                work_queue::attempts.eq(work_queue::attempts + 1),
                work_queue::started_at.eq(Some(format_timestamp(now))),
                work_queue::finished_at.eq(None::<String>),
            ))
            .execute(conn)?;
        Ok(Some(row.job_id))
    })?;

    match claimed {
        Some(job_id) => {
            debug!(job_id, "Claimed job");
            require_job(conn, job_id).map(Some)
        }
        None => Ok(None),
    }
}

fn finish_job(
    conn: &mut SqliteConnection,
    job_id: i64,
    state: JobState,
    last_error: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(work_queue::table)
        .filter(work_queue::job_id.eq(job_id))
        .set((
            work_queue::state.eq(state.as_str()),
            work_queue::last_error.eq(last_error),
            work_queue::finished_at.eq(Some(format_timestamp(now))),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Job {job_id}")));
    }
    Ok(())
}

/// Marks a job done.
///
/// # Errors
///
/// Returns `NotFound` if the job does not exist.
pub fn complete_job(
    conn: &mut SqliteConnection,
    job_id: i64,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    finish_job(conn, job_id, JobState::Done, None, now)?;
    info!(job_id, "Job completed");
    Ok(())
}

/// Marks a job failed with the error that stopped it.
///
/// # Errors
///
/// Returns `NotFound` if the job does not exist.
pub fn fail_job(
    conn: &mut SqliteConnection,
    job_id: i64,
    error: &str,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    finish_job(conn, job_id, JobState::Failed, Some(error), now)?;
    warn!(job_id, error, "Job failed");
    Ok(())
}

/// Puts a job back in the queue.
///
/// # Errors
///
/// Returns `NotFound` if the job does not exist.
pub fn requeue_job(conn: &mut SqliteConnection, job_id: i64) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(work_queue::table)
        .filter(work_queue::job_id.eq(job_id))
        .set((
            work_queue::state.eq(JobState::Queued.as_str()),
            work_queue::started_at.eq(None::<String>),
            work_queue::finished_at.eq(None::<String>),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Job {job_id}")));
    }
    info!(job_id, "Job requeued");
    Ok(())
}
