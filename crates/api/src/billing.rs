// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing report computation and manual edits.

use chrono::{NaiveDate, NaiveDateTime};
use loadbill_domain::{
    BillableClass, BillingComputation, FileStatus, Money, RateTable, ScheduleBlock, TermCalendar,
    compute_billing, resolve_level,
};
use loadbill_persistence::{
    BillingReportData, BillingReportDetail, LoadFileData, SqlitePersistence, StoredClassRow,
    TermData,
};
use tracing::info;

use crate::error::ApiError;
use crate::ingestion::get_load_file;
use crate::request_response::{
    BillingReportResponse, BillingRequest, EditMonthlyRequest, EditSummaryRequest,
};

/// Converts a stored row into the billing view of the class.
#[must_use]
pub fn billable_class(stored: &StoredClassRow) -> BillableClass {
    let record = &stored.record;
    BillableClass {
        row_id: stored.load_class_row_id,
        block: ScheduleBlock {
            days: record.row.days.clone(),
            schedule: record.row.schedule.clone(),
            duration_minutes: record.row.duration_minutes,
        },
        level: resolve_level(
            record.row.is_bilingual,
            record.professor_is_bilingual,
            record.professor_is_doctor,
            record.row.masters_count,
        ),
        status: record.status,
    }
}

fn term_calendar(
    persistence: &mut SqlitePersistence,
    term_id: i64,
) -> Result<TermCalendar, ApiError> {
    let term: TermData = persistence
        .get_term(term_id)?
        .ok_or_else(|| ApiError::not_found("Term", format!("Term {term_id} does not exist")))?;
    let holidays: Vec<NaiveDate> =
        persistence.list_holidays_between(term.start_date, term.end_date)?;
    Ok(TermCalendar::new(term.start_date, term.end_date, holidays)?)
}

/// Computes (or recomputes) the billing report of a completed upload.
///
/// # Returns
///
/// The report ID, which is stable across recomputations.
///
/// # Errors
///
/// - `ResourceNotFound` if the file or its term does not exist
/// - `DomainRuleViolation` if the file is not completed, a needed rate is
///   not defined, or the report was edited and `force` is not set
pub fn compute_report(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    request: &BillingRequest,
    now: NaiveDateTime,
) -> Result<i64, ApiError> {
    let file: LoadFileData = get_load_file(persistence, load_file_id)?;
    if file.status != FileStatus::Completed {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("billable_load_file"),
            message: format!(
                "Load file {load_file_id} is {}; only completed uploads can be billed",
                file.status
            ),
        });
    }

    let as_of: NaiveDate = request.as_of_date.unwrap_or_else(|| now.date());
    let calendar: TermCalendar = term_calendar(persistence, file.context.term_id)?;
    let classes: Vec<BillableClass> = persistence
        .list_class_rows(load_file_id)?
        .iter()
        .map(billable_class)
        .collect();
    let rates: RateTable = persistence.load_rate_table()?;

    let computation: BillingComputation = compute_billing(&classes, &rates, &calendar, as_of)?;
    let total: Money = computation.total();
    let report_id: i64 =
        persistence.store_billing_report(load_file_id, as_of, &computation, request.force, now)?;

    info!(
        load_file_id,
        report_id,
        as_of = %as_of,
        classes = classes.len(),
        blocks = computation.summaries.len(),
        total = %total,
        "Billing report computed"
    );
    Ok(report_id)
}

/// Retrieves the billing report of a load file.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file has no report yet.
pub fn get_report(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
) -> Result<BillingReportResponse, ApiError> {
    let report: BillingReportData = persistence
        .get_report_for_file(load_file_id)?
        .ok_or_else(|| {
            ApiError::not_found(
                "Billing report",
                format!("Load file {load_file_id} has no billing report"),
            )
        })?;
    let detail: BillingReportDetail = persistence.get_report_detail(report.report_id)?;
    Ok(BillingReportResponse::from(detail))
}

/// Overwrites a payment summary line; the report becomes edited.
///
/// # Errors
///
/// Returns `InvalidInput` for a negative count, `ResourceNotFound` if the
/// line does not exist.
pub fn edit_summary(
    persistence: &mut SqlitePersistence,
    payment_summary_id: i64,
    request: &EditSummaryRequest,
) -> Result<(), ApiError> {
    if request.class_count < 0 {
        return Err(ApiError::invalid(
            "class_count",
            String::from("Class count must not be negative"),
        ));
    }
    persistence.edit_payment_summary(payment_summary_id, request.class_count, request.rates)?;
    info!(payment_summary_id, "Payment summary edited by hand");
    Ok(())
}

/// Overwrites a monthly line; the report becomes edited.
///
/// # Errors
///
/// Returns `InvalidInput` for negative values, `ResourceNotFound` if the
/// line does not exist.
pub fn edit_monthly(
    persistence: &mut SqlitePersistence,
    monthly_item_id: i64,
    request: &EditMonthlyRequest,
) -> Result<(), ApiError> {
    if request.session_count < 0 || request.total_minutes < 0 || request.total_cents < 0 {
        return Err(ApiError::invalid(
            "monthly_item",
            String::from("Sessions, minutes and totals must not be negative"),
        ));
    }
    persistence.edit_monthly_item(
        monthly_item_id,
        request.session_count,
        request.total_minutes,
        Money::from_cents(request.total_cents),
    )?;
    info!(monthly_item_id, "Monthly item edited by hand");
    Ok(())
}
