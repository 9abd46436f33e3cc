// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;
use loadbill_domain::{CatalogSnapshot, ReferenceCatalog};

use crate::tests::{create_test_date, create_test_now, create_test_persistence, create_test_professor};
use crate::{NewProfessor, TermData};

#[test]
fn test_catalog_snapshot_contains_seeded_records() {
    let (mut persistence, _) = create_test_persistence();
    persistence.insert_coordination("SIS", "Sistemas").unwrap();
    persistence.insert_subject("MAT101", "Calculo I").unwrap();
    persistence
        .insert_professor(&create_test_professor("Ana Perez"))
        .unwrap();

    let snapshot: CatalogSnapshot = persistence.load_catalog_snapshot().unwrap();

    assert_eq!(snapshot.subject_count(), 1);
    assert_eq!(snapshot.professor_count(), 1);
    assert_eq!(
        snapshot.subject_by_code("mat101").map(|s| s.name.as_str()),
        Some("Calculo I")
    );
    let professor = snapshot.professor_by_name("ANA PEREZ").unwrap();
    assert_eq!(professor.masters_count, 1);
    assert_eq!(professor.academic_title, "Ing.");
}

#[test]
fn test_soft_deleted_subject_is_hidden_from_snapshot() {
    let (mut persistence, _) = create_test_persistence();
    let subject_id: i64 = persistence.insert_subject("MAT101", "Calculo I").unwrap();

    persistence
        .soft_delete_subject(subject_id, create_test_now())
        .unwrap();

    let snapshot: CatalogSnapshot = persistence.load_catalog_snapshot().unwrap();
    assert_eq!(snapshot.subject_count(), 0);
    assert!(snapshot.subject_by_code("MAT101").is_none());
}

#[test]
fn test_soft_deleted_subject_code_can_be_reused() {
    let (mut persistence, _) = create_test_persistence();
    let old_id: i64 = persistence.insert_subject("MAT101", "Calculo I").unwrap();

    assert!(persistence.insert_subject("MAT101", "Duplicate").is_err());

    persistence.soft_delete_subject(old_id, create_test_now()).unwrap();
    let new_id: i64 = persistence.insert_subject("MAT101", "Calculo Diferencial").unwrap();

    assert_ne!(old_id, new_id);
    let snapshot: CatalogSnapshot = persistence.load_catalog_snapshot().unwrap();
    assert_eq!(
        snapshot.subject_by_code("MAT101").map(|s| s.subject_id),
        Some(new_id)
    );
}

#[test]
fn test_soft_delete_missing_subject_is_not_found() {
    let (mut persistence, _) = create_test_persistence();
    let result = persistence.soft_delete_subject(999, create_test_now());
    assert!(matches!(result, Err(crate::PersistenceError::NotFound(_))));
}

#[test]
fn test_inactive_professor_is_loaded_but_not_active() {
    let (mut persistence, _) = create_test_persistence();
    let retired: NewProfessor = NewProfessor {
        is_active: false,
        ..create_test_professor("Luis Gomez")
    };
    persistence.insert_professor(&retired).unwrap();

    let snapshot: CatalogSnapshot = persistence.load_catalog_snapshot().unwrap();
    assert!(snapshot.professor_by_name("Luis Gomez").is_some());
    assert!(snapshot.active_professors().is_empty());
}

#[test]
fn test_get_term_round_trips_dates() {
    let (mut persistence, term_id) = create_test_persistence();

    let term: TermData = persistence.get_term(term_id).unwrap().unwrap();

    assert_eq!(term.name, "2026-I");
    assert_eq!(term.start_date, create_test_date(2026, 1, 5));
    assert_eq!(term.end_date, create_test_date(2026, 5, 29));
    assert!(persistence.get_term(term_id + 1).unwrap().is_none());
}

#[test]
fn test_term_with_inverted_dates_is_rejected() {
    let (mut persistence, _) = create_test_persistence();
    let result = persistence.insert_term(
        "broken",
        create_test_date(2026, 6, 1),
        create_test_date(2026, 5, 1),
    );
    assert!(result.is_err());
}

#[test]
fn test_holidays_are_filtered_by_range() {
    let (mut persistence, _) = create_test_persistence();
    persistence
        .insert_holiday(create_test_date(2026, 2, 16), "Carnaval")
        .unwrap();
    persistence
        .insert_holiday(create_test_date(2026, 2, 17), "Carnaval")
        .unwrap();
    persistence
        .insert_holiday(create_test_date(2026, 8, 10), "Primer Grito")
        .unwrap();

    let holidays: Vec<NaiveDate> = persistence
        .list_holidays_between(create_test_date(2026, 1, 5), create_test_date(2026, 5, 29))
        .unwrap();

    assert_eq!(
        holidays,
        vec![create_test_date(2026, 2, 16), create_test_date(2026, 2, 17)]
    );
}

#[test]
fn test_duplicate_holiday_is_rejected() {
    let (mut persistence, _) = create_test_persistence();
    persistence
        .insert_holiday(create_test_date(2026, 2, 16), "Carnaval")
        .unwrap();
    assert!(
        persistence
            .insert_holiday(create_test_date(2026, 2, 16), "Again")
            .is_err()
    );
}
