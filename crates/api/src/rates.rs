// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hourly rate history operations.

use chrono::{NaiveDate, NaiveDateTime};
use loadbill_domain::{DeletionPlan, LevelCode, Money, RateCorrection, RateTable, RateWindow};
use loadbill_persistence::SqlitePersistence;
use tracing::info;

use crate::error::ApiError;
use crate::request_response::{
    CorrectRateRequest, CurrentRateResponse, DeleteRateResponse, RaiseRateRequest,
    RateWindowResponse,
};

/// Starts a new rate for a level, closing the current one the day before.
///
/// # Errors
///
/// - `InvalidInput` for an unknown level, malformed or non-positive amount,
///   or blank author
/// - `DomainRuleViolation` if the new window would overlap another one or
///   does not start after the current open rate
pub fn raise_rate(
    persistence: &mut SqlitePersistence,
    request: &RaiseRateRequest,
    now: NaiveDateTime,
) -> Result<RateWindowResponse, ApiError> {
    let level: LevelCode = request.level_code()?;
    let rate: Money = request.amount()?;
    if request.created_by.trim().is_empty() {
        return Err(ApiError::invalid(
            "created_by",
            String::from("Author must not be blank"),
        ));
    }

    let window: RateWindow = persistence.raise_rate(
        level,
        rate,
        request.start_date,
        request.created_by.trim(),
        now,
    )?;
    info!(
        level = %level,
        rate_id = window.rate_id,
        rate = %window.rate,
        start_date = %window.start_date,
        "Rate raised"
    );
    Ok(RateWindowResponse::from(&window))
}

/// Corrects the amount or dates of an existing rate row.
///
/// # Errors
///
/// - `ResourceNotFound` if the row does not exist
/// - `InvalidInput` if the resulting end is not after the start
/// - `DomainRuleViolation` if the corrected window overlaps another one
pub fn correct_rate(
    persistence: &mut SqlitePersistence,
    rate_id: i64,
    request: &CorrectRateRequest,
) -> Result<RateWindowResponse, ApiError> {
    let correction: RateCorrection = request.to_correction()?;
    let window: RateWindow = persistence.correct_rate(rate_id, correction)?;
    info!(rate_id, rate = %window.rate, "Rate corrected");
    Ok(RateWindowResponse::from(&window))
}

/// Deletes a recently created rate row.
///
/// # Errors
///
/// - `ResourceNotFound` if the row does not exist
/// - `DomainRuleViolation` if the row is older than the deletion window
pub fn delete_rate(
    persistence: &mut SqlitePersistence,
    rate_id: i64,
    now: NaiveDateTime,
) -> Result<DeleteRateResponse, ApiError> {
    let plan: DeletionPlan = persistence.delete_rate(rate_id, now)?;
    Ok(DeleteRateResponse {
        rate_id: plan.rate_id,
        reopened_rate_id: plan.reopen,
    })
}

/// Lists a level's rate history, oldest first.
///
/// # Errors
///
/// Returns `InvalidInput` for an unknown level code.
pub fn list_rate_history(
    persistence: &mut SqlitePersistence,
    level: &str,
) -> Result<Vec<RateWindowResponse>, ApiError> {
    let level: LevelCode = level.parse::<LevelCode>()?;
    let history: Vec<RateWindow> = persistence.load_level_history(level)?;
    Ok(history.iter().map(RateWindowResponse::from).collect())
}

/// Returns the rate in force on `date` for every level.
///
/// Levels without a rate on that day are listed with no window.
///
/// # Errors
///
/// Returns an error if the rate table cannot be loaded.
pub fn current_rates(
    persistence: &mut SqlitePersistence,
    date: NaiveDate,
) -> Result<Vec<CurrentRateResponse>, ApiError> {
    let table: RateTable = persistence.load_rate_table()?;
    Ok(LevelCode::ALL
        .into_iter()
        .map(|level| CurrentRateResponse {
            level,
            window: table.window_on(level, date).map(RateWindowResponse::from),
        })
        .collect())
}
