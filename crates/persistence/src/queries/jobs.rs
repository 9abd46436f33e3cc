// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work queue queries.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::conversions::parse_stored;
use crate::data_models::{JobData, JobKind, JobState};
use crate::diesel_schema::work_queue;
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = work_queue)]
pub(crate) struct JobRow {
    pub job_id: i64,
    kind: String,
    target_id: i64,
    options: String,
    state: String,
    attempts: i32,
    last_error: Option<String>,
    created_at: String,
    started_at: Option<String>,
    finished_at: Option<String>,
}

impl TryFrom<JobRow> for JobData {
    type Error = PersistenceError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            job_id: row.job_id,
            kind: parse_stored("work_queue.kind", &row.kind)?,
            target_id: row.target_id,
            options: serde_json::from_str(&row.options)?,
            state: parse_stored("work_queue.state", &row.state)?,
            attempts: row.attempts,
            last_error: row.last_error,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

pub(crate) fn oldest_queued_row(
    conn: &mut SqliteConnection,
) -> Result<Option<JobRow>, PersistenceError> {
    Ok(work_queue::table
        .filter(work_queue::state.eq(JobState::Queued.as_str()))
        .order(work_queue::job_id.asc())
        .select(JobRow::as_select())
        .first(conn)
        .optional()?)
}

/// Retrieves a job by ID.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_job(
    conn: &mut SqliteConnection,
    job_id: i64,
) -> Result<Option<JobData>, PersistenceError> {
    work_queue::table
        .filter(work_queue::job_id.eq(job_id))
        .select(JobRow::as_select())
        .first(conn)
        .optional()?
        .map(JobData::try_from)
        .transpose()
}

/// Lists jobs of one kind for a load file, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_jobs_for_target(
    conn: &mut SqliteConnection,
    kind: JobKind,
    target_id: i64,
) -> Result<Vec<JobData>, PersistenceError> {
    let rows: Vec<JobRow> = work_queue::table
        .filter(work_queue::kind.eq(kind.as_str()))
        .filter(work_queue::target_id.eq(target_id))
        .order(work_queue::job_id.desc())
        .select(JobRow::as_select())
        .load(conn)?;
    rows.into_iter().map(JobData::try_from).collect()
}
