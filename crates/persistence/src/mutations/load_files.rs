// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! File version ledger mutations.
//!
//! Every write that touches the `is_active` flag runs inside one immediate
//! transaction so two uploads for the same context serialize on the write
//! lock. The partial unique index on active rows is the backstop: a writer
//! that still races past the application check gets `ConcurrencyConflict`.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::SqliteConnection;
use loadbill_domain::{DomainError, FileStatus, LoadContext, RowTally};
use tracing::{info, warn};

use crate::backend::PersistenceBackend;
use crate::backend::sqlite::is_write_conflict;
use crate::conversions::{flag, format_timestamp, parse_stored};
use crate::data_models::{ClassRowRecord, LoadFileData, NewLoadFile};
use crate::diesel_schema::{load_class_rows, load_files};
use crate::error::PersistenceError;
use crate::mutations::class_rows::insert_class_rows;
use crate::queries::load_files::{LoadFileRow, find_active_row, find_load_file_row, get_load_file};

/// Maps a lost race on the active-version index or write lock to `ConcurrencyConflict`.
pub fn conflict_aware(context: LoadContext) -> impl Fn(DieselError) -> PersistenceError {
    move |err| {
        if is_write_conflict(&err) {
            warn!(%context, error = %err, "Concurrent load file version creation");
            PersistenceError::ConcurrencyConflict(format!(
                "another upload for {context} was stored concurrently"
            ))
        } else {
            PersistenceError::from(err)
        }
    }
}

/// Registers a new upload as the active version of its context.
///
/// The previous active version (if any) is deactivated, stamped with
/// `superseded_at` and linked to the new row through `superseded_by`. The new
/// row starts `pending` with `version = previous + 1` (or 1).
///
/// # Errors
///
/// - `ConcurrencyConflict` if another writer created a version concurrently
/// - a database error if any statement fails
pub fn create_load_file_version(
    conn: &mut SqliteConnection,
    new_file: &NewLoadFile,
    now: NaiveDateTime,
) -> Result<LoadFileData, PersistenceError> {
    let context: LoadContext = new_file.context;
    let stamp: String = format_timestamp(now);
    let on_conflict = conflict_aware(context);

    let load_file_id: i64 = conn.immediate_transaction(|conn| {
        let previous: Option<LoadFileRow> = find_active_row(conn, context)?;
        let version: i32 = LoadContext::next_version(previous.as_ref().map(|p| p.version));

        if let Some(prev) = &previous {
            diesel::update(load_files::table)
                .filter(load_files::load_file_id.eq(prev.load_file_id))
                .set((
                    load_files::is_active.eq(0),
                    load_files::superseded_at.eq(&stamp),
                ))
                .execute(conn)
                .map_err(&on_conflict)?;
        }

        diesel::insert_into(load_files::table)
            .values((
                load_files::faculty_id.eq(context.faculty_id),
                load_files::school_id.eq(context.school_id),
                load_files::term_id.eq(context.term_id),
                load_files::uploaded_by.eq(&new_file.uploaded_by),
                load_files::original_filename.eq(&new_file.original_filename),
                load_files::storage_path.eq(&new_file.storage_path),
                load_files::strict_validation.eq(flag(new_file.strict_validation)),
                load_files::status.eq(FileStatus::Pending.as_str()),
                load_files::version.eq(version),
                load_files::is_active.eq(1),
                load_files::created_at.eq(&stamp),
            ))
            .execute(conn)
            .map_err(&on_conflict)?;

        let new_id: i64 = conn.get_last_insert_rowid()?;

        if let Some(prev) = &previous {
            diesel::update(load_files::table)
                .filter(load_files::load_file_id.eq(prev.load_file_id))
                .set(load_files::superseded_by.eq(Some(new_id)))
                .execute(conn)?;
        }

        info!(
            load_file_id = new_id,
            version,
            superseded = previous.as_ref().map(|p| p.load_file_id),
            %context,
            "Created load file version"
        );
        Ok::<i64, PersistenceError>(new_id)
    })?;

    get_load_file(conn, load_file_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Load file {load_file_id}")))
}

fn current_status(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<FileStatus, PersistenceError> {
    let row: LoadFileRow = find_load_file_row(conn, load_file_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Load file {load_file_id}")))?;
    parse_stored("load_files.status", &row.status)
}

/// Moves a file to a new status, enforcing the status lifecycle.
///
/// Moving to a terminal status stamps `processed_at`; moving back to
/// `pending` clears it.
///
/// # Errors
///
/// - `NotFound` if the file does not exist
/// - `Domain(InvalidStatusTransition)` if the move is not allowed
pub fn transition_load_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
    target: FileStatus,
    now: NaiveDateTime,
) -> Result<FileStatus, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let from: FileStatus = current_status(conn, load_file_id)?;
        let to: FileStatus = from.transition(target)?;
        let processed_at: Option<String> = to.is_terminal().then(|| format_timestamp(now));

        diesel::update(load_files::table)
            .filter(load_files::load_file_id.eq(load_file_id))
            .set((
                load_files::status.eq(to.as_str()),
                load_files::processed_at.eq(processed_at),
            ))
            .execute(conn)?;

        info!(load_file_id, from = %from, to = %to, "Load file status changed");
        Ok(to)
    })
}

/// Outcome of processing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOutcome {
    /// `Completed` or `Failed`.
    pub status: FileStatus,
    pub tally: RowTally,
    /// Human note or JSON failure report.
    pub error_message: Option<String>,
}

/// Stores every processed row and the final status of an upload.
///
/// Rows are written in spreadsheet order in batches, together with the
/// counters, inside one transaction. Rows left by an earlier interrupted
/// attempt are replaced.
///
/// # Errors
///
/// - `Domain(InvalidStatusTransition)` if the file is not `processing` or the
///   outcome status is not terminal
/// - a database or serialization error if a write fails
pub fn finish_load_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
    rows: &[ClassRowRecord],
    outcome: &IngestionOutcome,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let from: FileStatus = current_status(conn, load_file_id)?;
        let to: FileStatus = from.transition(outcome.status)?;
        if !to.is_terminal() {
            return Err(PersistenceError::Domain(DomainError::InvalidStatusTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }));
        }

        diesel::delete(load_class_rows::table)
            .filter(load_class_rows::load_file_id.eq(load_file_id))
            .execute(conn)?;
        let written: usize = insert_class_rows(conn, load_file_id, rows)?;

        diesel::update(load_files::table)
            .filter(load_files::load_file_id.eq(load_file_id))
            .set((
                load_files::status.eq(to.as_str()),
                load_files::total_rows.eq(outcome.tally.total),
                load_files::inserted_rows.eq(outcome.tally.inserted),
                load_files::failed_rows.eq(outcome.tally.failed),
                load_files::warning_rows.eq(outcome.tally.warnings),
                load_files::error_message.eq(outcome.error_message.as_deref()),
                load_files::processed_at.eq(Some(format_timestamp(now))),
            ))
            .execute(conn)?;

        info!(
            load_file_id,
            status = %to,
            rows = written,
            inserted = outcome.tally.inserted,
            failed = outcome.tally.failed,
            warnings = outcome.tally.warnings,
            "Stored ingestion result"
        );
        Ok(())
    })
}

/// Marks an upload failed for a structural reason (no rows are written).
///
/// # Errors
///
/// Returns `Domain(InvalidStatusTransition)` if the file is not `processing`.
pub fn fail_load_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
    note: &str,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    finish_load_file(
        conn,
        load_file_id,
        &[],
        &IngestionOutcome {
            status: FileStatus::Failed,
            tally: RowTally::default(),
            error_message: Some(note.to_string()),
        },
        now,
    )
}

/// Deletes a version, promoting the newest remaining version when the
/// deleted one was active.
///
/// Pointers to the deleted row are cleared first; its class rows and
/// billing report cascade.
///
/// # Returns
///
/// The ID of the promoted version, if any.
///
/// # Errors
///
/// - `NotFound` if the file does not exist
/// - a database error if any statement fails
pub fn delete_load_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Option<i64>, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let target: LoadFileRow = find_load_file_row(conn, load_file_id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("Load file {load_file_id}")))?;
        let data: LoadFileData = LoadFileData::try_from(target)?;

        diesel::update(load_files::table)
            .filter(load_files::superseded_by.eq(Some(load_file_id)))
            .set(load_files::superseded_by.eq(None::<i64>))
            .execute(conn)?;

        diesel::delete(load_files::table)
            .filter(load_files::load_file_id.eq(load_file_id))
            .execute(conn)?;

        let promoted: Option<i64> = if data.is_active {
            let context: LoadContext = data.context;
            let candidate: Option<i64> = load_files::table
                .filter(load_files::faculty_id.eq(context.faculty_id))
                .filter(load_files::school_id.eq(context.school_id))
                .filter(load_files::term_id.eq(context.term_id))
                .order(load_files::version.desc())
                .select(load_files::load_file_id)
                .first(conn)
                .optional()?;

            if let Some(id) = candidate {
                diesel::update(load_files::table)
                    .filter(load_files::load_file_id.eq(id))
                    .set((
                        load_files::is_active.eq(1),
                        load_files::superseded_at.eq(None::<String>),
                        load_files::superseded_by.eq(None::<i64>),
                    ))
                    .execute(conn)?;
            }
            candidate
        } else {
            None
        };

        info!(
            load_file_id,
            was_active = data.is_active,
            promoted,
            "Deleted load file version"
        );
        Ok(promoted)
    })
}
