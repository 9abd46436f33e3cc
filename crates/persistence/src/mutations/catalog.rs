// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Catalog maintenance.
//!
//! Catalogs are owned by the academic administration; these writes exist so
//! an installation can be seeded and kept in step with it.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::conversions::{flag, format_date, format_timestamp};
use crate::data_models::NewProfessor;
use crate::diesel_schema::{coordinations, holidays, professors, subjects, terms};
use crate::error::PersistenceError;

/// Adds a coordination.
///
/// # Errors
///
/// Returns an error if the code already exists or the insert fails.
pub fn insert_coordination(
    conn: &mut SqliteConnection,
    code: &str,
    name: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(coordinations::table)
        .values((coordinations::code.eq(code), coordinations::name.eq(name)))
        .execute(conn)?;
    let id: i64 = conn.get_last_insert_rowid()?;
    info!(coordination_id = id, code, "Created coordination");
    Ok(id)
}

/// Adds a subject.
///
/// # Errors
///
/// Returns an error if a live subject already uses the code.
pub fn insert_subject(
    conn: &mut SqliteConnection,
    code: &str,
    name: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(subjects::table)
        .values((subjects::code.eq(code), subjects::name.eq(name)))
        .execute(conn)?;
    let id: i64 = conn.get_last_insert_rowid()?;
    info!(subject_id = id, code, "Created subject");
    Ok(id)
}

/// Soft-deletes a subject; it stays referenced by stored rows but no longer
/// matches new uploads.
///
/// # Errors
///
/// Returns `NotFound` if the subject does not exist.
pub fn soft_delete_subject(
    conn: &mut SqliteConnection,
    subject_id: i64,
    now: NaiveDateTime,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(subjects::table)
        .filter(subjects::subject_id.eq(subject_id))
        .set(subjects::deleted_at.eq(Some(format_timestamp(now))))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Subject {subject_id}")));
    }
    info!(subject_id, "Soft-deleted subject");
    Ok(())
}

/// Adds a professor.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_professor(
    conn: &mut SqliteConnection,
    professor: &NewProfessor,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(professors::table)
        .values((
            professors::professor_code.eq(&professor.professor_code),
            professors::full_name.eq(&professor.full_name),
            professors::academic_title.eq(&professor.academic_title),
            professors::masters_count.eq(i32::from(professor.masters_count)),
            professors::is_bilingual.eq(flag(professor.is_bilingual)),
            professors::is_doctor.eq(flag(professor.is_doctor)),
            professors::is_active.eq(flag(professor.is_active)),
        ))
        .execute(conn)?;
    let id: i64 = conn.get_last_insert_rowid()?;
    info!(professor_id = id, name = %professor.full_name, "Created professor");
    Ok(id)
}

/// Adds an academic term.
///
/// # Errors
///
/// Returns an error if `end_date` precedes `start_date` or the insert fails.
pub fn insert_term(
    conn: &mut SqliteConnection,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(terms::table)
        .values((
            terms::name.eq(name),
            terms::start_date.eq(format_date(start_date)),
            terms::end_date.eq(format_date(end_date)),
        ))
        .execute(conn)?;
    let id: i64 = conn.get_last_insert_rowid()?;
    info!(term_id = id, name, %start_date, %end_date, "Created term");
    Ok(id)
}

/// Adds a non-teaching day.
///
/// # Errors
///
/// Returns an error if the date is already a holiday or the insert fails.
pub fn insert_holiday(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    description: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(holidays::table)
        .values((
            holidays::holiday_date.eq(format_date(date)),
            holidays::description.eq(description),
        ))
        .execute(conn)?;
    let id: i64 = conn.get_last_insert_rowid()?;
    info!(holiday_id = id, %date, "Created holiday");
    Ok(id)
}
