// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ingested class row queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::NormalizedClassRow;
use tracing::debug;

use crate::conversions::{is_set, parse_stored, to_u8, to_u32};
use crate::data_models::{ClassRowRecord, StoredClassRow};
use crate::diesel_schema::load_class_rows;
use crate::error::PersistenceError;

/// Diesel Queryable struct for class rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = load_class_rows)]
struct ClassRow {
    load_class_row_id: i64,
    load_file_id: i64,
    row_number: i32,
    sequence: String,
    coordination_code: String,
    subject_code: String,
    subject_name: String,
    section: String,
    parallel: String,
    is_bilingual: i32,
    duration_minutes: i32,
    schedule: String,
    days: String,
    class_type: String,
    institute: String,
    title: String,
    professor_name: String,
    contact: String,
    phone: String,
    professor_code: String,
    category: String,
    payment_status: String,
    profile: String,
    final_grade: String,
    masters_count: i32,
    institutional_email: String,
    personal_email: String,
    observations: String,
    teams_owner: String,
    subject_id: Option<i64>,
    professor_id: Option<i64>,
    coordination_id: Option<i64>,
    professor_is_bilingual: i32,
    professor_is_doctor: i32,
    validation_status: String,
    validation_errors: Option<String>,
    validation_findings: String,
    normalization_log: String,
}

impl TryFrom<ClassRow> for StoredClassRow {
    type Error = PersistenceError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        let normalized: NormalizedClassRow = NormalizedClassRow {
            row_number: row.row_number,
            sequence: row.sequence,
            coordination_code: row.coordination_code,
            subject_code: row.subject_code,
            subject_name: row.subject_name,
            section: row.section,
            parallel: row.parallel,
            is_bilingual: is_set(row.is_bilingual),
            duration_minutes: to_u32("load_class_rows.duration_minutes", row.duration_minutes)?,
            schedule: row.schedule,
            days: row.days,
            class_type: row.class_type,
            institute: row.institute,
            title: row.title,
            professor_name: row.professor_name,
            contact: row.contact,
            phone: row.phone,
            professor_code: row.professor_code,
            category: row.category,
            payment_status: row.payment_status,
            profile: row.profile,
            final_grade: row.final_grade,
            masters_count: to_u8("load_class_rows.masters_count", row.masters_count)?,
            institutional_email: row.institutional_email,
            personal_email: row.personal_email,
            observations: row.observations,
            teams_owner: row.teams_owner,
        };

        Ok(Self {
            load_class_row_id: row.load_class_row_id,
            load_file_id: row.load_file_id,
            record: ClassRowRecord {
                row: normalized,
                subject_id: row.subject_id,
                professor_id: row.professor_id,
                coordination_id: row.coordination_id,
                professor_is_bilingual: is_set(row.professor_is_bilingual),
                professor_is_doctor: is_set(row.professor_is_doctor),
                status: parse_stored("load_class_rows.validation_status", &row.validation_status)?,
                validation_errors: row.validation_errors,
                findings: serde_json::from_str(&row.validation_findings)?,
                changes: serde_json::from_str(&row.normalization_log)?,
            },
        })
    }
}

/// Lists the rows of a load file in spreadsheet order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row cannot be decoded.
pub fn list_class_rows(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Vec<StoredClassRow>, PersistenceError> {
    debug!(load_file_id, "Loading class rows");

    let rows: Vec<ClassRow> = load_class_rows::table
        .filter(load_class_rows::load_file_id.eq(load_file_id))
        .order((
            load_class_rows::row_number.asc(),
            load_class_rows::load_class_row_id.asc(),
        ))
        .select(ClassRow::as_select())
        .load(conn)?;

    rows.into_iter().map(StoredClassRow::try_from).collect()
}

/// Counts the rows stored for a load file.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_class_rows(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(load_class_rows::table
        .filter(load_class_rows::load_file_id.eq(load_file_id))
        .count()
        .get_result(conn)?)
}
