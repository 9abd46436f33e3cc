// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hourly rate history mutations.
//!
//! Each operation reads the level's history, plans the change with the domain
//! rules and applies it, all inside one immediate transaction. The partial
//! unique index on open rows rejects a second open window if two writers
//! still interleave.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::SqliteConnection;
use loadbill_domain::{
    DeletionPlan, DomainError, LevelCode, Money, RaisePlan, RateCorrection, RateRaise, RateWindow,
    plan_rate_correction, plan_rate_deletion, plan_rate_raise,
};
use tracing::{info, warn};

use crate::backend::PersistenceBackend;
use crate::backend::sqlite::is_write_conflict;
use crate::conversions::{format_date, format_timestamp};
use crate::diesel_schema::hourly_rate_history;
use crate::error::PersistenceError;
use crate::queries::catalog::lookup_level_id;
use crate::queries::rates::{find_rate_level, load_level_history};

/// Maps a lost race on the open-rate index or write lock to `ConcurrencyConflict`.
pub fn rate_conflict(level_id: i64) -> impl Fn(DieselError) -> PersistenceError {
    move |err| {
        if is_write_conflict(&err) {
            warn!(level_id, error = %err, "Concurrent rate history change");
            PersistenceError::ConcurrencyConflict(format!(
                "rate history of level {level_id} changed concurrently"
            ))
        } else {
            PersistenceError::from(err)
        }
    }
}

fn history_of(
    conn: &mut SqliteConnection,
    rate_id: i64,
) -> Result<Vec<RateWindow>, PersistenceError> {
    let level_id: i64 = find_rate_level(conn, rate_id)?
        .ok_or(PersistenceError::Domain(DomainError::RateNotFound(rate_id)))?;
    load_level_history(conn, level_id)
}

/// Starts a new open-ended rate for a level.
///
/// The currently open window is closed the day before `start_date`.
///
/// # Errors
///
/// - `Domain` if the raise breaks a history rule
/// - `NotFound` if the level is not configured
/// - `ConcurrencyConflict` if another writer changed the level concurrently
pub fn raise_rate(
    conn: &mut SqliteConnection,
    level: LevelCode,
    rate: Money,
    start_date: NaiveDate,
    created_by: &str,
    now: NaiveDateTime,
) -> Result<RateWindow, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let level_id: i64 = lookup_level_id(conn, level)?;
        let history: Vec<RateWindow> = load_level_history(conn, level_id)?;
        let plan: RaisePlan = plan_rate_raise(
            &history,
            RateRaise {
                level_id,
                rate,
                start_date,
            },
        )?;
        let on_conflict = rate_conflict(level_id);

        if let Some((closing_id, end_date)) = plan.close {
            diesel::update(hourly_rate_history::table)
                .filter(hourly_rate_history::rate_id.eq(closing_id))
                .set(hourly_rate_history::end_date.eq(Some(format_date(end_date))))
                .execute(conn)
                .map_err(&on_conflict)?;
            info!(level = %level, rate_id = closing_id, %end_date, "Closed open rate");
        }

        diesel::insert_into(hourly_rate_history::table)
            .values((
                hourly_rate_history::level_id.eq(level_id),
                hourly_rate_history::rate_cents.eq(rate.cents()),
                hourly_rate_history::start_date.eq(format_date(start_date)),
                hourly_rate_history::end_date.eq(None::<String>),
                hourly_rate_history::created_at.eq(format_timestamp(now)),
                hourly_rate_history::created_by.eq(created_by),
            ))
            .execute(conn)
            .map_err(&on_conflict)?;
        let rate_id: i64 = conn.get_last_insert_rowid()?;

        info!(level = %level, rate_id, %rate, %start_date, "Raised hourly rate");
        Ok(RateWindow {
            rate_id,
            level_id,
            rate,
            start_date,
            end_date: None,
            created_at: now,
        })
    })
}

/// Applies a partial correction to an existing rate row.
///
/// # Errors
///
/// - `Domain(RateNotFound)` if the row does not exist
/// - `Domain` if the corrected window breaks a history rule
/// - `ConcurrencyConflict` if another writer changed the level concurrently
pub fn correct_rate(
    conn: &mut SqliteConnection,
    rate_id: i64,
    correction: RateCorrection,
) -> Result<RateWindow, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let history: Vec<RateWindow> = history_of(conn, rate_id)?;
        let updated: RateWindow = plan_rate_correction(&history, rate_id, correction)?;

        diesel::update(hourly_rate_history::table)
            .filter(hourly_rate_history::rate_id.eq(rate_id))
            .set((
                hourly_rate_history::rate_cents.eq(updated.rate.cents()),
                hourly_rate_history::start_date.eq(format_date(updated.start_date)),
                hourly_rate_history::end_date.eq(updated.end_date.map(format_date)),
            ))
            .execute(conn)
            .map_err(rate_conflict(updated.level_id))?;

        info!(
            rate_id,
            rate = %updated.rate,
            start_date = %updated.start_date,
            end_date = ?updated.end_date,
            "Corrected hourly rate"
        );
        Ok(updated)
    })
}

/// Deletes a rate row created within the last 24 hours.
///
/// When the deleted row was open ended, the latest closed row of the level
/// becomes open ended again.
///
/// # Errors
///
/// - `Domain(RateNotFound)` if the row does not exist
/// - `Domain(RateDeletionWindowExpired)` if the row is too old
pub fn delete_rate(
    conn: &mut SqliteConnection,
    rate_id: i64,
    now: NaiveDateTime,
) -> Result<DeletionPlan, PersistenceError> {
    conn.immediate_transaction(|conn| {
        let history: Vec<RateWindow> = history_of(conn, rate_id)?;
        let plan: DeletionPlan = plan_rate_deletion(&history, rate_id, now)?;

        diesel::delete(hourly_rate_history::table)
            .filter(hourly_rate_history::rate_id.eq(plan.rate_id))
            .execute(conn)?;

        if let Some(reopen_id) = plan.reopen {
            diesel::update(hourly_rate_history::table)
                .filter(hourly_rate_history::rate_id.eq(reopen_id))
                .set(hourly_rate_history::end_date.eq(None::<String>))
                .execute(conn)?;
        }

        info!(rate_id, reopened = plan.reopen, "Deleted hourly rate");
        Ok(plan)
    })
}
