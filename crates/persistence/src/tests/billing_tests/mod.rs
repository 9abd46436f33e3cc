// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::NaiveDate;
use loadbill_domain::{
    BillingComputation, DomainError, LevelCode, LevelRates, Money, MonthlyLine, RateSnapshotLine,
    ScheduleBlock, SummaryLine,
};

use crate::tests::{create_test_date, create_test_now, create_test_persistence, create_test_upload};
use crate::{BillingReportDetail, LoadFileData, PersistenceError, SqlitePersistence};

fn create_test_block() -> ScheduleBlock {
    ScheduleBlock {
        days: String::from("Lu-Mi"),
        schedule: String::from("07:00-09:00"),
        duration_minutes: 120,
    }
}

fn create_test_computation(class_count: i32) -> BillingComputation {
    let mut rates: LevelRates = LevelRates::default();
    rates.add(LevelCode::Masters1, Money::from_cents(1100));
    BillingComputation {
        summaries: vec![SummaryLine {
            block: create_test_block(),
            class_count,
            rates,
        }],
        monthly: vec![
            MonthlyLine {
                block: create_test_block(),
                year: 2026,
                month: 1,
                session_count: 8,
                total_minutes: 960,
                class_hours: 16.0,
                total: Money::from_cents(17_600),
            },
            MonthlyLine {
                block: create_test_block(),
                year: 2026,
                month: 2,
                session_count: 6,
                total_minutes: 720,
                class_hours: 12.0,
                total: Money::from_cents(13_200),
            },
        ],
        snapshots: vec![RateSnapshotLine {
            level: LevelCode::Masters1,
            rate_id: 3,
            rate: Money::from_cents(1100),
        }],
    }
}

fn create_test_file(persistence: &mut SqlitePersistence, term_id: i64) -> LoadFileData {
    persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap()
}

fn as_of() -> NaiveDate {
    create_test_date(2026, 1, 15)
}

#[test]
fn test_store_and_read_report() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = create_test_file(&mut persistence, term_id);

    let report_id: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            false,
            create_test_now(),
        )
        .unwrap();

    let detail: BillingReportDetail = persistence.get_report_detail(report_id).unwrap();
    assert_eq!(detail.report.load_file_id, file.load_file_id);
    assert_eq!(detail.report.as_of_date, as_of());
    assert!(!detail.report.is_edited);
    assert_eq!(detail.summaries.len(), 1);
    assert_eq!(detail.summaries[0].line.class_count, 2);
    assert_eq!(detail.summaries[0].line.rates.m1, Money::from_cents(1100));
    assert_eq!(detail.monthly.len(), 2);
    assert_eq!(detail.monthly[1].line.month, 2);
    assert_eq!(detail.monthly[1].line.total, Money::from_cents(13_200));
    assert_eq!(detail.snapshots.len(), 1);
    assert_eq!(detail.snapshots[0].level, LevelCode::Masters1);
}

#[test]
fn test_recompute_replaces_children_and_keeps_report_id() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = create_test_file(&mut persistence, term_id);
    let first: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            false,
            create_test_now(),
        )
        .unwrap();

    let second: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            create_test_date(2026, 2, 1),
            &create_test_computation(5),
            false,
            create_test_now(),
        )
        .unwrap();

    assert_eq!(first, second);
    let detail: BillingReportDetail = persistence.get_report_detail(second).unwrap();
    assert_eq!(detail.summaries.len(), 1);
    assert_eq!(detail.summaries[0].line.class_count, 5);
    assert_eq!(detail.monthly.len(), 2);
    assert_eq!(detail.report.as_of_date, create_test_date(2026, 2, 1));
}

#[test]
fn test_edited_report_requires_force() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = create_test_file(&mut persistence, term_id);
    let report_id: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            false,
            create_test_now(),
        )
        .unwrap();
    let detail: BillingReportDetail = persistence.get_report_detail(report_id).unwrap();
    persistence
        .edit_payment_summary(
            detail.summaries[0].payment_summary_id,
            3,
            detail.summaries[0].line.rates,
        )
        .unwrap();

    let refused = persistence.store_billing_report(
        file.load_file_id,
        as_of(),
        &create_test_computation(2),
        false,
        create_test_now(),
    );
    assert!(matches!(
        refused,
        Err(PersistenceError::Domain(DomainError::ReportEdited { .. }))
    ));
    let untouched: BillingReportDetail = persistence.get_report_detail(report_id).unwrap();
    assert_eq!(untouched.summaries[0].line.class_count, 3);

    persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            true,
            create_test_now(),
        )
        .unwrap();
    let forced: BillingReportDetail = persistence.get_report_detail(report_id).unwrap();
    assert_eq!(forced.summaries[0].line.class_count, 2);
    assert!(forced.report.is_edited);
}

#[test]
fn test_editing_monthly_item_recomputes_hours() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = create_test_file(&mut persistence, term_id);
    let report_id: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            false,
            create_test_now(),
        )
        .unwrap();
    let item_id: i64 = persistence.get_report_detail(report_id).unwrap().monthly[0].monthly_item_id;

    persistence
        .edit_monthly_item(item_id, 7, 850, Money::from_cents(15_583))
        .unwrap();

    let detail: BillingReportDetail = persistence.get_report_detail(report_id).unwrap();
    assert!(detail.report.is_edited);
    let item = &detail.monthly[0].line;
    assert_eq!(item.session_count, 7);
    assert_eq!(item.total_minutes, 850);
    assert!((item.class_hours - 14.17).abs() < f64::EPSILON);
    assert_eq!(item.total, Money::from_cents(15_583));
}

#[test]
fn test_editing_missing_lines_is_not_found() {
    let (mut persistence, _) = create_test_persistence();
    assert!(matches!(
        persistence.edit_payment_summary(9, 1, LevelRates::default()),
        Err(PersistenceError::NotFound(_))
    ));
    assert!(matches!(
        persistence.edit_monthly_item(9, 1, 60, Money::from_cents(100)),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_deleting_load_file_removes_report() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = create_test_file(&mut persistence, term_id);
    let report_id: i64 = persistence
        .store_billing_report(
            file.load_file_id,
            as_of(),
            &create_test_computation(2),
            false,
            create_test_now(),
        )
        .unwrap();

    persistence.delete_load_file(file.load_file_id).unwrap();

    assert!(persistence.get_report_for_file(file.load_file_id).unwrap().is_none());
    assert!(matches!(
        persistence.get_report_detail(report_id),
        Err(PersistenceError::NotFound(_))
    ));
}
