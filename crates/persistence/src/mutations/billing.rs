// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing report writes.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::{
    BillingComputation, LevelRates, Money, ensure_recomputable, minutes_to_hours,
};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::conversions::{format_date, format_timestamp, is_set, to_i32};
use crate::diesel_schema::{
    billing_rate_snapshots, billing_reports, monthly_items, payment_summaries,
};
use crate::error::PersistenceError;
use crate::queries::billing::{BillingReportRow, find_report_row};

fn clear_children(conn: &mut SqliteConnection, report_id: i64) -> Result<(), PersistenceError> {
    diesel::delete(payment_summaries::table)
        .filter(payment_summaries::report_id.eq(report_id))
        .execute(conn)?;
    diesel::delete(monthly_items::table)
        .filter(monthly_items::report_id.eq(report_id))
        .execute(conn)?;
    diesel::delete(billing_rate_snapshots::table)
        .filter(billing_rate_snapshots::report_id.eq(report_id))
        .execute(conn)?;
    Ok(())
}

fn insert_children(
    conn: &mut SqliteConnection,
    report_id: i64,
    computation: &BillingComputation,
) -> Result<(), PersistenceError> {
    for line in &computation.summaries {
        diesel::insert_into(payment_summaries::table)
            .values((
                payment_summaries::report_id.eq(report_id),
                payment_summaries::days.eq(&line.block.days),
                payment_summaries::schedule.eq(&line.block.schedule),
                payment_summaries::duration_minutes.eq(to_i32(
                    "payment_summaries.duration_minutes",
                    line.block.duration_minutes,
                )?),
                payment_summaries::class_count.eq(line.class_count),
                payment_summaries::payment_rate_grado.eq(line.rates.grado.cents()),
                payment_summaries::payment_rate_m1.eq(line.rates.m1.cents()),
                payment_summaries::payment_rate_m2.eq(line.rates.m2.cents()),
                payment_summaries::payment_rate_dr.eq(line.rates.dr.cents()),
                payment_summaries::payment_rate_blg.eq(line.rates.blg.cents()),
            ))
            .execute(conn)?;
    }

    for line in &computation.monthly {
        diesel::insert_into(monthly_items::table)
            .values((
                monthly_items::report_id.eq(report_id),
                monthly_items::days.eq(&line.block.days),
                monthly_items::schedule.eq(&line.block.schedule),
                monthly_items::duration_minutes.eq(to_i32(
                    "monthly_items.duration_minutes",
                    line.block.duration_minutes,
                )?),
                monthly_items::year.eq(line.year),
                monthly_items::month.eq(to_i32("monthly_items.month", line.month)?),
                monthly_items::session_count.eq(line.session_count),
                monthly_items::total_minutes.eq(line.total_minutes),
                monthly_items::class_hours.eq(line.class_hours),
                monthly_items::total_cents.eq(line.total.cents()),
            ))
            .execute(conn)?;
    }

    for snapshot in &computation.snapshots {
        diesel::insert_into(billing_rate_snapshots::table)
            .values((
                billing_rate_snapshots::report_id.eq(report_id),
                billing_rate_snapshots::level_code.eq(snapshot.level.as_str()),
                billing_rate_snapshots::rate_id.eq(snapshot.rate_id),
                billing_rate_snapshots::rate_cents.eq(snapshot.rate.cents()),
            ))
            .execute(conn)?;
    }
    Ok(())
}

/// Stores (or recomputes) the billing report of a load file.
///
/// A file has at most one report. Recomputing replaces every child row and
/// keeps the report ID; an edited report keeps its `is_edited` mark.
///
/// # Returns
///
/// The report ID.
///
/// # Errors
///
/// - `Domain(ReportEdited)` if the report was edited by hand and `force` is false
/// - a database error if any statement fails
pub fn store_billing_report(
    conn: &mut SqliteConnection,
    load_file_id: i64,
    as_of_date: NaiveDate,
    computation: &BillingComputation,
    force: bool,
    now: NaiveDateTime,
) -> Result<i64, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let existing: Option<BillingReportRow> = find_report_row(conn, load_file_id)?;

        let report_id: i64 = if let Some(report) = existing {
            ensure_recomputable(report.report_id, is_set(report.is_edited), force)?;
            clear_children(conn, report.report_id)?;
            diesel::update(billing_reports::table)
                .filter(billing_reports::report_id.eq(report.report_id))
                .set((
                    billing_reports::as_of_date.eq(format_date(as_of_date)),
                    billing_reports::generated_at.eq(format_timestamp(now)),
                ))
                .execute(conn)?;
            report.report_id
        } else {
            diesel::insert_into(billing_reports::table)
                .values((
                    billing_reports::load_file_id.eq(load_file_id),
                    billing_reports::as_of_date.eq(format_date(as_of_date)),
                    billing_reports::generated_at.eq(format_timestamp(now)),
                ))
                .execute(conn)?;
            conn.get_last_insert_rowid()?
        };

        insert_children(conn, report_id, computation)?;

        info!(
            load_file_id,
            report_id,
            %as_of_date,
            summaries = computation.summaries.len(),
            monthly = computation.monthly.len(),
            total = %computation.total(),
            "Stored billing report"
        );
        Ok(report_id)
    })
}

fn mark_edited(conn: &mut SqliteConnection, report_id: i64) -> Result<(), PersistenceError> {
    diesel::update(billing_reports::table)
        .filter(billing_reports::report_id.eq(report_id))
        .set(billing_reports::is_edited.eq(1))
        .execute(conn)?;
    Ok(())
}

/// Overwrites a payment summary line by hand and marks its report edited.
///
/// # Errors
///
/// Returns `NotFound` if the line does not exist.
pub fn edit_payment_summary(
    conn: &mut SqliteConnection,
    payment_summary_id: i64,
    class_count: i32,
    rates: LevelRates,
) -> Result<(), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let report_id: i64 = payment_summaries::table
            .filter(payment_summaries::payment_summary_id.eq(payment_summary_id))
            .select(payment_summaries::report_id)
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                PersistenceError::NotFound(format!("Payment summary {payment_summary_id}"))
            })?;

        diesel::update(payment_summaries::table)
            .filter(payment_summaries::payment_summary_id.eq(payment_summary_id))
            .set((
                payment_summaries::class_count.eq(class_count),
                payment_summaries::payment_rate_grado.eq(rates.grado.cents()),
                payment_summaries::payment_rate_m1.eq(rates.m1.cents()),
                payment_summaries::payment_rate_m2.eq(rates.m2.cents()),
                payment_summaries::payment_rate_dr.eq(rates.dr.cents()),
                payment_summaries::payment_rate_blg.eq(rates.blg.cents()),
            ))
            .execute(conn)?;
        mark_edited(conn, report_id)?;

        info!(report_id, payment_summary_id, "Edited payment summary");
        Ok(())
    })
}

/// Overwrites a monthly line by hand and marks its report edited.
///
/// Class hours are derived from `total_minutes`.
///
/// # Errors
///
/// Returns `NotFound` if the line does not exist.
pub fn edit_monthly_item(
    conn: &mut SqliteConnection,
    monthly_item_id: i64,
    session_count: i32,
    total_minutes: i64,
    total: Money,
) -> Result<(), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let report_id: i64 = monthly_items::table
            .filter(monthly_items::monthly_item_id.eq(monthly_item_id))
            .select(monthly_items::report_id)
            .first(conn)
            .optional()?
            .ok_or_else(|| PersistenceError::NotFound(format!("Monthly item {monthly_item_id}")))?;

        diesel::update(monthly_items::table)
            .filter(monthly_items::monthly_item_id.eq(monthly_item_id))
            .set((
                monthly_items::session_count.eq(session_count),
                monthly_items::total_minutes.eq(total_minutes),
                monthly_items::class_hours.eq(minutes_to_hours(total_minutes)),
                monthly_items::total_cents.eq(total.cents()),
            ))
            .execute(conn)?;
        mark_edited(conn, report_id)?;

        info!(report_id, monthly_item_id, "Edited monthly item");
        Ok(())
    })
}
