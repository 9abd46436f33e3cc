// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod billing_tests;
mod catalog_tests;
mod concurrency_tests;
mod initialization_tests;
mod job_tests;
mod load_file_tests;
mod rate_tests;

use chrono::{NaiveDate, NaiveDateTime};
use loadbill_domain::{
    ChangeRecord, ErrorCategory, Finding, LoadContext, NormalizedClassRow, Severity,
    ValidationStatus,
};

use crate::{ClassRowRecord, NewLoadFile, NewProfessor, SqlitePersistence};

pub fn create_test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn create_test_now() -> NaiveDateTime {
    create_test_date(2026, 1, 10).and_hms_opt(9, 30, 0).unwrap()
}

/// Creates a database seeded with one term (2026-01-05 to 2026-05-29).
///
/// Returns the persistence handle and the term ID.
pub fn create_test_persistence() -> (SqlitePersistence, i64) {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let term_id: i64 = persistence
        .insert_term(
            "2026-I",
            create_test_date(2026, 1, 5),
            create_test_date(2026, 5, 29),
        )
        .unwrap();
    (persistence, term_id)
}

pub fn create_test_upload(term_id: i64, filename: &str) -> NewLoadFile {
    NewLoadFile {
        context: LoadContext::new(1, 10, term_id),
        uploaded_by: String::from("coordinator@example.edu"),
        original_filename: filename.to_string(),
        storage_path: format!("/var/lib/loadbill/{filename}"),
        strict_validation: false,
    }
}

pub fn create_test_professor(name: &str) -> NewProfessor {
    NewProfessor {
        professor_code: String::from("P-001"),
        full_name: name.to_string(),
        academic_title: String::from("Ing."),
        masters_count: 1,
        is_bilingual: false,
        is_doctor: false,
        is_active: true,
    }
}

pub fn create_test_class_row(row_number: i32, status: ValidationStatus) -> ClassRowRecord {
    let row: NormalizedClassRow = NormalizedClassRow {
        row_number,
        sequence: row_number.to_string(),
        coordination_code: String::from("SIS"),
        subject_code: String::from("MAT101"),
        subject_name: String::from("Calculo I"),
        section: String::from("A"),
        parallel: String::from("1"),
        duration_minutes: 120,
        schedule: String::from("07:00-09:00"),
        days: String::from("Lu-Mi"),
        title: String::from("Ing."),
        professor_name: String::from("Ana Perez"),
        masters_count: 1,
        ..NormalizedClassRow::default()
    };

    let findings: Vec<Finding> = if status == ValidationStatus::Valid {
        Vec::new()
    } else {
        vec![Finding {
            level: Severity::Warning,
            field: String::from("subject_name"),
            message: String::from("Subject name differs from catalog"),
            expected: Some(String::from("Calculo I")),
            actual: Some(String::from("Calculo 1")),
            validator: String::from("subject"),
            category: ErrorCategory::MissingSubject,
        }]
    };

    ClassRowRecord {
        row,
        subject_id: None,
        professor_id: None,
        coordination_id: None,
        professor_is_bilingual: false,
        professor_is_doctor: false,
        status,
        validation_errors: findings.first().map(|f| f.message.clone()),
        findings,
        changes: vec![ChangeRecord {
            field: String::from("title"),
            from: String::from("ingeniero"),
            to: String::from("Ing."),
            reason: String::from("title abbreviated"),
        }],
    }
}
