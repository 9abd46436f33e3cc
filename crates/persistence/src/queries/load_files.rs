// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Load file version queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::{LoadContext, RowTally};
use tracing::debug;

use crate::conversions::{is_set, parse_stored};
use crate::data_models::LoadFileData;
use crate::diesel_schema::load_files;
use crate::error::PersistenceError;

/// Diesel Queryable struct for load file rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = load_files)]
pub(crate) struct LoadFileRow {
    pub load_file_id: i64,
    faculty_id: i64,
    school_id: i64,
    term_id: i64,
    uploaded_by: String,
    original_filename: String,
    storage_path: String,
    strict_validation: i32,
    pub status: String,
    pub version: i32,
    pub is_active: i32,
    superseded_at: Option<String>,
    superseded_by: Option<i64>,
    total_rows: i32,
    inserted_rows: i32,
    failed_rows: i32,
    warning_rows: i32,
    error_message: Option<String>,
    created_at: String,
    processed_at: Option<String>,
}

impl TryFrom<LoadFileRow> for LoadFileData {
    type Error = PersistenceError;

    fn try_from(row: LoadFileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            load_file_id: row.load_file_id,
            context: LoadContext::new(row.faculty_id, row.school_id, row.term_id),
            uploaded_by: row.uploaded_by,
            original_filename: row.original_filename,
            storage_path: row.storage_path,
            strict_validation: is_set(row.strict_validation),
            status: parse_stored("load_files.status", &row.status)?,
            version: row.version,
            is_active: is_set(row.is_active),
            superseded_at: row.superseded_at,
            superseded_by: row.superseded_by,
            tally: RowTally {
                total: row.total_rows,
                inserted: row.inserted_rows,
                failed: row.failed_rows,
                warnings: row.warning_rows,
            },
            error_message: row.error_message,
            created_at: row.created_at,
            processed_at: row.processed_at,
        })
    }
}

pub(crate) fn find_load_file_row(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Option<LoadFileRow>, PersistenceError> {
    Ok(load_files::table
        .filter(load_files::load_file_id.eq(load_file_id))
        .select(LoadFileRow::as_select())
        .first(conn)
        .optional()?)
}

pub(crate) fn find_active_row(
    conn: &mut SqliteConnection,
    context: LoadContext,
) -> Result<Option<LoadFileRow>, PersistenceError> {
    Ok(load_files::table
        .filter(load_files::faculty_id.eq(context.faculty_id))
        .filter(load_files::school_id.eq(context.school_id))
        .filter(load_files::term_id.eq(context.term_id))
        .filter(load_files::is_active.eq(1))
        .select(LoadFileRow::as_select())
        .first(conn)
        .optional()?)
}

/// Retrieves a load file by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the file does not exist.
pub fn get_load_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Option<LoadFileData>, PersistenceError> {
    debug!(load_file_id, "Looking up load file");
    find_load_file_row(conn, load_file_id)?
        .map(LoadFileData::try_from)
        .transpose()
}

/// Retrieves the active version for a context.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_active_load_file(
    conn: &mut SqliteConnection,
    context: LoadContext,
) -> Result<Option<LoadFileData>, PersistenceError> {
    debug!(%context, "Looking up active load file");
    find_active_row(conn, context)?
        .map(LoadFileData::try_from)
        .transpose()
}

/// Lists every stored version for a context, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_load_file_versions(
    conn: &mut SqliteConnection,
    context: LoadContext,
) -> Result<Vec<LoadFileData>, PersistenceError> {
    let rows: Vec<LoadFileRow> = load_files::table
        .filter(load_files::faculty_id.eq(context.faculty_id))
        .filter(load_files::school_id.eq(context.school_id))
        .filter(load_files::term_id.eq(context.term_id))
        .order(load_files::version.desc())
        .select(LoadFileRow::as_select())
        .load(conn)?;

    rows.into_iter().map(LoadFileData::try_from).collect()
}
