// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::{Duration, NaiveDateTime};
use loadbill_domain::{
    DeletionPlan, DomainError, LevelCode, Money, RateCorrection, RateTable, RateWindow,
};

use crate::tests::{create_test_date, create_test_now};
use crate::{PersistenceError, SqlitePersistence};

fn create_open_dr_rate(persistence: &mut SqlitePersistence) -> RateWindow {
    persistence
        .raise_rate(
            LevelCode::Doctor,
            Money::from_cents(1200),
            create_test_date(2024, 1, 1),
            "admin",
            create_test_now(),
        )
        .unwrap()
}

#[test]
fn test_raise_closes_current_rate_the_day_before() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let original: RateWindow = create_open_dr_rate(&mut persistence);

    let raised: RateWindow = persistence
        .raise_rate(
            LevelCode::Doctor,
            Money::from_cents(1500),
            create_test_date(2026, 1, 1),
            "admin",
            create_test_now(),
        )
        .unwrap();

    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0].rate_id, original.rate_id);
    assert_eq!(history[0].rate, Money::from_cents(1200));
    assert_eq!(history[0].start_date, create_test_date(2024, 1, 1));
    assert_eq!(history[0].end_date, Some(create_test_date(2025, 12, 31)));

    assert_eq!(history[1].rate_id, raised.rate_id);
    assert_eq!(history[1].rate, Money::from_cents(1500));
    assert_eq!(history[1].start_date, create_test_date(2026, 1, 1));
    assert!(history[1].end_date.is_none());
}

#[test]
fn test_raise_on_day_after_open_start_leaves_single_day_window() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    create_open_dr_rate(&mut persistence);

    persistence
        .raise_rate(
            LevelCode::Doctor,
            Money::from_cents(1300),
            create_test_date(2024, 1, 2),
            "admin",
            create_test_now(),
        )
        .unwrap();

    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history[0].end_date, Some(create_test_date(2024, 1, 1)));
}

#[test]
fn test_raise_that_does_not_move_forward_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    create_open_dr_rate(&mut persistence);

    let result = persistence.raise_rate(
        LevelCode::Doctor,
        Money::from_cents(1500),
        create_test_date(2023, 6, 1),
        "admin",
        create_test_now(),
    );

    assert!(matches!(
        result,
        Err(PersistenceError::Domain(DomainError::RaiseStartsTooEarly { .. }))
    ));
    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].end_date.is_none());
}

#[test]
fn test_correction_overlapping_another_window_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let first: RateWindow = create_open_dr_rate(&mut persistence);
    persistence
        .raise_rate(
            LevelCode::Doctor,
            Money::from_cents(1500),
            create_test_date(2026, 1, 1),
            "admin",
            create_test_now(),
        )
        .unwrap();

    let corrected = persistence.correct_rate(
        first.rate_id,
        RateCorrection {
            end_date: Some(Some(create_test_date(2026, 3, 1))),
            ..RateCorrection::default()
        },
    );

    assert!(matches!(
        corrected,
        Err(PersistenceError::Domain(DomainError::RateOverlap { .. }))
    ));
    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history[0].end_date, Some(create_test_date(2025, 12, 31)));
}

#[test]
fn test_non_positive_rate_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let result = persistence.raise_rate(
        LevelCode::Grado,
        Money::from_cents(0),
        create_test_date(2026, 1, 1),
        "admin",
        create_test_now(),
    );
    assert!(matches!(
        result,
        Err(PersistenceError::Domain(DomainError::InvalidRate(_)))
    ));
}

#[test]
fn test_levels_have_independent_histories() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    create_open_dr_rate(&mut persistence);
    persistence
        .raise_rate(
            LevelCode::Grado,
            Money::from_cents(900),
            create_test_date(2024, 1, 1),
            "admin",
            create_test_now(),
        )
        .unwrap();

    let table: RateTable = persistence.load_rate_table().unwrap();

    let on: chrono::NaiveDate = create_test_date(2025, 3, 1);
    assert_eq!(
        table.rate_on(LevelCode::Doctor, on).unwrap(),
        Money::from_cents(1200)
    );
    assert_eq!(
        table.rate_on(LevelCode::Grado, on).unwrap(),
        Money::from_cents(900)
    );
    assert!(table.rate_on(LevelCode::Bilingual, on).is_err());
}

#[test]
fn test_correction_updates_amount_only() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let window: RateWindow = create_open_dr_rate(&mut persistence);

    let corrected: RateWindow = persistence
        .correct_rate(
            window.rate_id,
            RateCorrection {
                rate: Some(Money::from_cents(1250)),
                ..RateCorrection::default()
            },
        )
        .unwrap();

    assert_eq!(corrected.rate, Money::from_cents(1250));
    assert_eq!(corrected.start_date, window.start_date);
    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history[0].rate, Money::from_cents(1250));
}

#[test]
fn test_correction_with_end_not_after_start_is_rejected() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let window: RateWindow = create_open_dr_rate(&mut persistence);

    let result = persistence.correct_rate(
        window.rate_id,
        RateCorrection {
            end_date: Some(Some(create_test_date(2024, 1, 1))),
            ..RateCorrection::default()
        },
    );

    assert!(matches!(
        result,
        Err(PersistenceError::Domain(DomainError::InvalidRateWindow { .. }))
    ));
}

#[test]
fn test_correction_of_missing_rate_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let result = persistence.correct_rate(77, RateCorrection::default());
    assert!(matches!(
        result,
        Err(PersistenceError::Domain(DomainError::RateNotFound(77)))
    ));
}

#[test]
fn test_deleting_current_rate_reopens_previous() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let first: RateWindow = create_open_dr_rate(&mut persistence);
    let raised: RateWindow = persistence
        .raise_rate(
            LevelCode::Doctor,
            Money::from_cents(1500),
            create_test_date(2026, 1, 1),
            "admin",
            create_test_now(),
        )
        .unwrap();

    let plan: DeletionPlan = persistence
        .delete_rate(raised.rate_id, create_test_now() + Duration::hours(2))
        .unwrap();

    assert_eq!(plan.reopen, Some(first.rate_id));
    let history: Vec<RateWindow> = persistence.load_level_history(LevelCode::Doctor).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].end_date.is_none());
}

#[test]
fn test_deleting_old_rate_is_refused() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let window: RateWindow = create_open_dr_rate(&mut persistence);
    let later: NaiveDateTime = create_test_now() + Duration::hours(25);

    let result = persistence.delete_rate(window.rate_id, later);

    assert!(matches!(
        result,
        Err(PersistenceError::Domain(
            DomainError::RateDeletionWindowExpired { .. }
        ))
    ));
    assert_eq!(
        persistence.load_level_history(LevelCode::Doctor).unwrap().len(),
        1
    );
}
