// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference catalog loaders.
//!
//! The ingestion worker reads every catalog once per upload into a
//! `CatalogSnapshot`, so validation never touches the database per row.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::{
    CatalogSnapshot, CoordinationRecord, LevelCode, ProfessorRecord, SubjectRecord,
};
use tracing::debug;

use crate::conversions::{format_date, is_set, parse_date, parse_stored, to_u8};
use crate::data_models::{AcademicLevelData, TermData};
use crate::diesel_schema::{academic_levels, coordinations, holidays, professors, subjects, terms};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = subjects)]
struct SubjectRow {
    subject_id: i64,
    code: String,
    name: String,
    deleted_at: Option<String>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = professors)]
struct ProfessorRow {
    professor_id: i64,
    professor_code: String,
    full_name: String,
    academic_title: String,
    masters_count: i32,
    is_bilingual: i32,
    is_doctor: i32,
    is_active: i32,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = coordinations)]
struct CoordinationRow {
    coordination_id: i64,
    code: String,
    name: String,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = terms)]
struct TermRow {
    term_id: i64,
    name: String,
    start_date: String,
    end_date: String,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = academic_levels)]
struct AcademicLevelRow {
    level_id: i64,
    code: String,
    name: String,
    priority: i32,
    is_active: i32,
}

impl TryFrom<AcademicLevelRow> for AcademicLevelData {
    type Error = PersistenceError;

    fn try_from(row: AcademicLevelRow) -> Result<Self, Self::Error> {
        Ok(Self {
            level_id: row.level_id,
            code: parse_stored("academic_levels.code", &row.code)?,
            name: row.name,
            priority: row.priority,
            is_active: is_set(row.is_active),
        })
    }
}

/// Loads subjects, professors and coordinations into an in-memory catalog.
///
/// Soft-deleted subjects are read but dropped by the snapshot itself.
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn load_catalog_snapshot(
    conn: &mut SqliteConnection,
) -> Result<CatalogSnapshot, PersistenceError> {
    let subject_rows: Vec<SubjectRow> = subjects::table
        .select(SubjectRow::as_select())
        .load(conn)?;
    let professor_rows: Vec<ProfessorRow> = professors::table
        .order(professors::professor_id.asc())
        .select(ProfessorRow::as_select())
        .load(conn)?;
    let coordination_rows: Vec<CoordinationRow> = coordinations::table
        .select(CoordinationRow::as_select())
        .load(conn)?;

    let subject_records: Vec<SubjectRecord> = subject_rows
        .into_iter()
        .map(|row| SubjectRecord {
            subject_id: row.subject_id,
            code: row.code,
            name: row.name,
            is_deleted: row.deleted_at.is_some(),
        })
        .collect();

    let professor_records: Vec<ProfessorRecord> = professor_rows
        .into_iter()
        .map(|row| {
            Ok(ProfessorRecord {
                professor_id: row.professor_id,
                professor_code: row.professor_code,
                full_name: row.full_name,
                academic_title: row.academic_title,
                masters_count: to_u8("professors.masters_count", row.masters_count)?,
                is_bilingual: is_set(row.is_bilingual),
                is_doctor: is_set(row.is_doctor),
                is_active: is_set(row.is_active),
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    let coordination_records: Vec<CoordinationRecord> = coordination_rows
        .into_iter()
        .map(|row| CoordinationRecord {
            coordination_id: row.coordination_id,
            code: row.code,
            name: row.name,
        })
        .collect();

    let snapshot: CatalogSnapshot =
        CatalogSnapshot::new(subject_records, professor_records, coordination_records);
    debug!(
        subjects = snapshot.subject_count(),
        professors = snapshot.professor_count(),
        "Loaded catalog snapshot"
    );
    Ok(snapshot)
}

/// Retrieves a term by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored dates are malformed.
pub fn get_term(
    conn: &mut SqliteConnection,
    term_id: i64,
) -> Result<Option<TermData>, PersistenceError> {
    let row: Option<TermRow> = terms::table
        .filter(terms::term_id.eq(term_id))
        .select(TermRow::as_select())
        .first(conn)
        .optional()?;

    row.map(|r| {
        Ok(TermData {
            term_id: r.term_id,
            name: r.name,
            start_date: parse_date("terms.start_date", &r.start_date)?,
            end_date: parse_date("terms.end_date", &r.end_date)?,
        })
    })
    .transpose()
}

/// Lists holiday dates within `start..=end`.
///
/// # Errors
///
/// Returns an error if the query fails or a stored date is malformed.
pub fn list_holidays_between(
    conn: &mut SqliteConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, PersistenceError> {
    let raw: Vec<String> = holidays::table
        .filter(holidays::holiday_date.ge(format_date(start)))
        .filter(holidays::holiday_date.le(format_date(end)))
        .order(holidays::holiday_date.asc())
        .select(holidays::holiday_date)
        .load(conn)?;

    raw.iter()
        .map(|d| parse_date("holidays.holiday_date", d))
        .collect()
}

/// Lists all academic levels by priority.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_academic_levels(
    conn: &mut SqliteConnection,
) -> Result<Vec<AcademicLevelData>, PersistenceError> {
    let rows: Vec<AcademicLevelRow> = academic_levels::table
        .order(academic_levels::priority.asc())
        .select(AcademicLevelRow::as_select())
        .load(conn)?;
    rows.into_iter().map(AcademicLevelData::try_from).collect()
}

/// Resolves the row ID of a level code.
///
/// # Errors
///
/// Returns `NotFound` if the level table lacks the code.
pub fn lookup_level_id(
    conn: &mut SqliteConnection,
    level: LevelCode,
) -> Result<i64, PersistenceError> {
    academic_levels::table
        .filter(academic_levels::code.eq(level.as_str()))
        .select(academic_levels::level_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Academic level {level}")))
}
