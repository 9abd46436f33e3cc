// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use chrono::{NaiveDate, NaiveDateTime};
use loadbill_domain::CanonicalField;
use loadbill_persistence::{LoadFileData, NewProfessor, SqlitePersistence};
use tempfile::TempDir;

use crate::{UploadRequest, register_upload};

pub fn create_test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn create_test_now() -> NaiveDateTime {
    create_test_date(2026, 1, 10).and_hms_opt(9, 30, 0).unwrap()
}

/// One spreadsheet data row, keyed by field.
#[derive(Debug, Clone)]
pub struct TestRow(Vec<(CanonicalField, String)>);

impl TestRow {
    /// A row that passes every validator against the seeded catalog.
    pub fn valid() -> Self {
        Self(
            [
                (CanonicalField::Sequence, "1"),
                (CanonicalField::CoordinationCode, "SIS"),
                (CanonicalField::SubjectCode, "MAT101"),
                (CanonicalField::SubjectName, "Calculo I"),
                (CanonicalField::Section, "A"),
                (CanonicalField::Parallel, "1"),
                (CanonicalField::Bilingual, ""),
                (CanonicalField::Duration, "120"),
                (CanonicalField::Schedule, "07:00-09:00"),
                (CanonicalField::Days, "Lu-Mi"),
                (CanonicalField::Title, "Ing."),
                (CanonicalField::ProfessorName, "Ana Perez"),
                (CanonicalField::ProfessorCode, "P-001"),
                (CanonicalField::MastersCount, "1"),
            ]
            .into_iter()
            .map(|(f, v)| (f, v.to_string()))
            .collect(),
        )
    }

    pub fn with(mut self, field: CanonicalField, value: &str) -> Self {
        self.0.retain(|(f, _)| *f != field);
        self.0.push((field, value.to_string()));
        self
    }

    /// Cells in sheet column order.
    pub fn cells(&self) -> Vec<String> {
        CanonicalField::ALL
            .iter()
            .map(|field| {
                self.0
                    .iter()
                    .find(|(f, _)| f == field)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

pub fn create_test_header() -> Vec<String> {
    CanonicalField::ALL
        .iter()
        .map(|f| f.header().to_string())
        .collect()
}

pub fn create_test_grid(rows: &[TestRow]) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<String>> = vec![create_test_header()];
    grid.extend(rows.iter().map(TestRow::cells));
    grid
}

fn csv_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn create_test_csv(rows: &[TestRow]) -> Vec<u8> {
    create_test_grid(rows)
        .iter()
        .map(|cells| csv_line(cells))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

/// A database with one term, a small catalog and a storage directory.
pub struct TestEnv {
    pub persistence: SqlitePersistence,
    pub term_id: i64,
    pub storage: TempDir,
}

fn professor(code: &str, name: &str, title: &str) -> NewProfessor {
    NewProfessor {
        professor_code: code.to_string(),
        full_name: name.to_string(),
        academic_title: title.to_string(),
        is_active: true,
        ..NewProfessor::default()
    }
}

/// Seeds term 2026-I (2026-01-05 to 2026-05-29) and the catalog:
///
/// - coordination `SIS`
/// - subjects `MAT101` Calculo I and `FIS201` Fisica II
/// - Ana Perez (M1), Luis Gomez (GDO), Marta Rios (DR), Sam Lee (BLG)
pub fn create_test_env() -> TestEnv {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let term_id: i64 = persistence
        .insert_term(
            "2026-I",
            create_test_date(2026, 1, 5),
            create_test_date(2026, 5, 29),
        )
        .unwrap();

    persistence.insert_coordination("SIS", "Sistemas").unwrap();
    persistence.insert_subject("MAT101", "Calculo I").unwrap();
    persistence.insert_subject("FIS201", "Fisica II").unwrap();
    persistence
        .insert_professor(&NewProfessor {
            masters_count: 1,
            ..professor("P-001", "Ana Perez", "Ing.")
        })
        .unwrap();
    persistence
        .insert_professor(&professor("P-002", "Luis Gomez", "Ing."))
        .unwrap();
    persistence
        .insert_professor(&NewProfessor {
            is_doctor: true,
            ..professor("P-003", "Marta Rios", "Dra.")
        })
        .unwrap();
    persistence
        .insert_professor(&NewProfessor {
            is_bilingual: true,
            ..professor("P-004", "Sam Lee", "Lic.")
        })
        .unwrap();

    TestEnv {
        persistence,
        term_id,
        storage: TempDir::new().unwrap(),
    }
}

pub fn create_test_request(term_id: i64, filename: &str, strict: bool) -> UploadRequest {
    UploadRequest {
        faculty_id: 1,
        school_id: 10,
        term_id,
        uploaded_by: String::from("coordinator@example.edu"),
        original_filename: filename.to_string(),
        strict_validation: strict,
    }
}

/// Registers a CSV upload built from `rows`.
pub fn upload_test_rows(env: &mut TestEnv, rows: &[TestRow], strict: bool) -> LoadFileData {
    register_upload(
        &mut env.persistence,
        env.storage.path(),
        &create_test_request(env.term_id, "carga.csv", strict),
        &create_test_csv(rows),
        create_test_now(),
    )
    .unwrap()
}
