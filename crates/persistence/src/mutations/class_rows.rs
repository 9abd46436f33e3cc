// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Class row snapshot writes.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use crate::conversions::{flag, to_i32};
use crate::data_models::ClassRowRecord;
use crate::diesel_schema::load_class_rows;
use crate::error::PersistenceError;

/// Rows per multi-row `INSERT`; keeps each statement well under `SQLite`'s
/// bound-parameter limit.
const INSERT_BATCH_SIZE: usize = 200;

#[derive(Insertable)]
#[diesel(table_name = load_class_rows)]
struct NewClassRow<'a> {
    load_file_id: i64,
    row_number: i32,
    sequence: &'a str,
    coordination_code: &'a str,
    subject_code: &'a str,
    subject_name: &'a str,
    section: &'a str,
    parallel: &'a str,
    is_bilingual: i32,
    duration_minutes: i32,
    schedule: &'a str,
    days: &'a str,
    class_type: &'a str,
    institute: &'a str,
    title: &'a str,
    professor_name: &'a str,
    contact: &'a str,
    phone: &'a str,
    professor_code: &'a str,
    category: &'a str,
    payment_status: &'a str,
    profile: &'a str,
    final_grade: &'a str,
    masters_count: i32,
    institutional_email: &'a str,
    personal_email: &'a str,
    observations: &'a str,
    teams_owner: &'a str,
    subject_id: Option<i64>,
    professor_id: Option<i64>,
    coordination_id: Option<i64>,
    professor_is_bilingual: i32,
    professor_is_doctor: i32,
    validation_status: &'static str,
    validation_errors: Option<&'a str>,
    validation_findings: String,
    normalization_log: String,
}

impl<'a> NewClassRow<'a> {
    fn new(load_file_id: i64, record: &'a ClassRowRecord) -> Result<Self, PersistenceError> {
        let row = &record.row;
        Ok(Self {
            load_file_id,
            row_number: row.row_number,
            sequence: &row.sequence,
            coordination_code: &row.coordination_code,
            subject_code: &row.subject_code,
            subject_name: &row.subject_name,
            section: &row.section,
            parallel: &row.parallel,
            is_bilingual: flag(row.is_bilingual),
            duration_minutes: to_i32("load_class_rows.duration_minutes", row.duration_minutes)?,
            schedule: &row.schedule,
            days: &row.days,
            class_type: &row.class_type,
            institute: &row.institute,
            title: &row.title,
            professor_name: &row.professor_name,
            contact: &row.contact,
            phone: &row.phone,
            professor_code: &row.professor_code,
            category: &row.category,
            payment_status: &row.payment_status,
            profile: &row.profile,
            final_grade: &row.final_grade,
            masters_count: i32::from(row.masters_count),
            institutional_email: &row.institutional_email,
            personal_email: &row.personal_email,
            observations: &row.observations,
            teams_owner: &row.teams_owner,
            subject_id: record.subject_id,
            professor_id: record.professor_id,
            coordination_id: record.coordination_id,
            professor_is_bilingual: flag(record.professor_is_bilingual),
            professor_is_doctor: flag(record.professor_is_doctor),
            validation_status: record.status.as_str(),
            validation_errors: record.validation_errors.as_deref(),
            validation_findings: serde_json::to_string(&record.findings)?,
            normalization_log: serde_json::to_string(&record.changes)?,
        })
    }
}

/// Inserts rows for a load file in the given order.
///
/// Callers run this inside their own transaction.
///
/// # Errors
///
/// Returns an error if serialization or an insert fails.
pub fn insert_class_rows(
    conn: &mut SqliteConnection,
    load_file_id: i64,
    rows: &[ClassRowRecord],
) -> Result<usize, PersistenceError> {
    let mut written: usize = 0;
    for chunk in rows.chunks(INSERT_BATCH_SIZE) {
        let batch: Vec<NewClassRow<'_>> = chunk
            .iter()
            .map(|record| NewClassRow::new(load_file_id, record))
            .collect::<Result<_, PersistenceError>>()?;

        written += diesel::insert_into(load_class_rows::table)
            .values(&batch)
            .execute(conn)?;
        debug!(load_file_id, batch = batch.len(), "Inserted class row batch");
    }
    Ok(written)
}
