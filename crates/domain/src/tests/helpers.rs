// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test fixtures shared by the domain tests.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    CatalogSnapshot, CoordinationRecord, Money, NormalizedClassRow, ProfessorRecord, RateWindow,
    SubjectRecord,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).expect("valid test time")
}

pub fn dollars(amount: i64) -> Money {
    Money::from_cents(amount * 100)
}

pub fn create_test_window(
    rate_id: i64,
    rate: i64,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> RateWindow {
    RateWindow {
        rate_id,
        level_id: 4,
        rate: dollars(rate),
        start_date: start,
        end_date: end,
        created_at: at(2024, 1, 1, 8),
    }
}

pub fn create_test_professor(id: i64, name: &str, code: &str, title: &str) -> ProfessorRecord {
    ProfessorRecord {
        professor_id: id,
        professor_code: String::from(code),
        full_name: String::from(name),
        academic_title: String::from(title),
        masters_count: 0,
        is_bilingual: false,
        is_doctor: false,
        is_active: true,
    }
}

pub fn create_test_catalog() -> CatalogSnapshot {
    CatalogSnapshot::new(
        vec![
            SubjectRecord {
                subject_id: 1,
                code: String::from("MAT101"),
                name: String::from("Cálculo I"),
                is_deleted: false,
            },
            SubjectRecord {
                subject_id: 2,
                code: String::from("FIS201"),
                name: String::from("Física General"),
                is_deleted: false,
            },
            SubjectRecord {
                subject_id: 3,
                code: String::from("OLD900"),
                name: String::from("Materia Retirada"),
                is_deleted: true,
            },
        ],
        vec![
            create_test_professor(10, "María José Pérez", "0102030405", "Ingeniera"),
            create_test_professor(11, "Juan Carlos Andrade", "1100220033", "Licenciado"),
            ProfessorRecord {
                is_active: false,
                ..create_test_professor(12, "Pedro Inactivo Sosa", "9999999999", "Ing.")
            },
        ],
        vec![CoordinationRecord {
            coordination_id: 100,
            code: String::from("CB"),
            name: String::from("Ciencias Básicas"),
        }],
    )
}

/// A row that passes every validator against `create_test_catalog`.
pub fn create_test_row() -> NormalizedClassRow {
    NormalizedClassRow {
        row_number: 5,
        sequence: String::from("1"),
        coordination_code: String::from("CB"),
        subject_code: String::from("MAT101"),
        subject_name: String::from("Calculo I"),
        section: String::from("A"),
        parallel: String::from("1"),
        duration_minutes: 90,
        schedule: String::from("07:00-08:30"),
        days: String::from("Lu-Mi"),
        class_type: String::from("Presencial"),
        title: String::from("Ing."),
        professor_name: String::from("Maria Jose Perez"),
        professor_code: String::from("0102030405"),
        ..NormalizedClassRow::default()
    }
}
