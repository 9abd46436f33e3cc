// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing report queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::{LevelRates, MonthlyLine, Money, ScheduleBlock, SummaryLine};

use crate::conversions::{is_set, parse_date, parse_stored, to_u32};
use crate::data_models::{
    BillingReportData, BillingReportDetail, MonthlyItemData, PaymentSummaryData, RateSnapshotData,
};
use crate::diesel_schema::{
    billing_rate_snapshots, billing_reports, monthly_items, payment_summaries,
};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = billing_reports)]
pub(crate) struct BillingReportRow {
    pub report_id: i64,
    load_file_id: i64,
    pub is_edited: i32,
    as_of_date: String,
    generated_at: String,
}

impl TryFrom<BillingReportRow> for BillingReportData {
    type Error = PersistenceError;

    fn try_from(row: BillingReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            report_id: row.report_id,
            load_file_id: row.load_file_id,
            is_edited: is_set(row.is_edited),
            as_of_date: parse_date("billing_reports.as_of_date", &row.as_of_date)?,
            generated_at: row.generated_at,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = payment_summaries)]
struct PaymentSummaryRow {
    payment_summary_id: i64,
    days: String,
    schedule: String,
    duration_minutes: i32,
    class_count: i32,
    payment_rate_grado: i64,
    payment_rate_m1: i64,
    payment_rate_m2: i64,
    payment_rate_dr: i64,
    payment_rate_blg: i64,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = monthly_items)]
struct MonthlyItemRow {
    monthly_item_id: i64,
    days: String,
    schedule: String,
    duration_minutes: i32,
    year: i32,
    month: i32,
    session_count: i32,
    total_minutes: i64,
    class_hours: f64,
    total_cents: i64,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = billing_rate_snapshots)]
struct RateSnapshotRow {
    level_code: String,
    rate_id: i64,
    rate_cents: i64,
}

fn block(
    days: String,
    schedule: String,
    duration_minutes: i32,
) -> Result<ScheduleBlock, PersistenceError> {
    Ok(ScheduleBlock {
        days,
        schedule,
        duration_minutes: to_u32("duration_minutes", duration_minutes)?,
    })
}

pub(crate) fn find_report_row(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Option<BillingReportRow>, PersistenceError> {
    Ok(billing_reports::table
        .filter(billing_reports::load_file_id.eq(load_file_id))
        .select(BillingReportRow::as_select())
        .first(conn)
        .optional()?)
}

/// Retrieves the billing report header of a load file.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_report_for_file(
    conn: &mut SqliteConnection,
    load_file_id: i64,
) -> Result<Option<BillingReportData>, PersistenceError> {
    find_report_row(conn, load_file_id)?
        .map(BillingReportData::try_from)
        .transpose()
}

/// Retrieves a billing report with its summaries, monthly lines and rate snapshots.
///
/// # Errors
///
/// Returns `NotFound` if the report does not exist, or an error if a query fails.
pub fn get_report_detail(
    conn: &mut SqliteConnection,
    report_id: i64,
) -> Result<BillingReportDetail, PersistenceError> {
    let header: BillingReportRow = billing_reports::table
        .filter(billing_reports::report_id.eq(report_id))
        .select(BillingReportRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Billing report {report_id}")))?;

    let summary_rows: Vec<PaymentSummaryRow> = payment_summaries::table
        .filter(payment_summaries::report_id.eq(report_id))
        .order(payment_summaries::payment_summary_id.asc())
        .select(PaymentSummaryRow::as_select())
        .load(conn)?;

    let monthly_rows: Vec<MonthlyItemRow> = monthly_items::table
        .filter(monthly_items::report_id.eq(report_id))
        .order(monthly_items::monthly_item_id.asc())
        .select(MonthlyItemRow::as_select())
        .load(conn)?;

    let snapshot_rows: Vec<RateSnapshotRow> = billing_rate_snapshots::table
        .filter(billing_rate_snapshots::report_id.eq(report_id))
        .order(billing_rate_snapshots::snapshot_id.asc())
        .select(RateSnapshotRow::as_select())
        .load(conn)?;

    let summaries: Vec<PaymentSummaryData> = summary_rows
        .into_iter()
        .map(|row| {
            Ok(PaymentSummaryData {
                payment_summary_id: row.payment_summary_id,
                line: SummaryLine {
                    block: block(row.days, row.schedule, row.duration_minutes)?,
                    class_count: row.class_count,
                    rates: LevelRates {
                        grado: Money::from_cents(row.payment_rate_grado),
                        m1: Money::from_cents(row.payment_rate_m1),
                        m2: Money::from_cents(row.payment_rate_m2),
                        dr: Money::from_cents(row.payment_rate_dr),
                        blg: Money::from_cents(row.payment_rate_blg),
                    },
                },
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    let monthly: Vec<MonthlyItemData> = monthly_rows
        .into_iter()
        .map(|row| {
            let month: u32 = to_u32("monthly_items.month", row.month)?;
            Ok(MonthlyItemData {
                monthly_item_id: row.monthly_item_id,
                line: MonthlyLine {
                    block: block(row.days, row.schedule, row.duration_minutes)?,
                    year: row.year,
                    month,
                    session_count: row.session_count,
                    total_minutes: row.total_minutes,
                    class_hours: row.class_hours,
                    total: Money::from_cents(row.total_cents),
                },
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    let snapshots: Vec<RateSnapshotData> = snapshot_rows
        .into_iter()
        .map(|row| {
            Ok(RateSnapshotData {
                level: parse_stored("billing_rate_snapshots.level_code", &row.level_code)?,
                rate_id: row.rate_id,
                rate_cents: row.rate_cents,
            })
        })
        .collect::<Result<_, PersistenceError>>()?;

    Ok(BillingReportDetail {
        report: BillingReportData::try_from(header)?,
        summaries,
        monthly,
        snapshots,
    })
}
