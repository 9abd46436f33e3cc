// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hourly rate history rules.
//!
//! Each academic level has a history of rate windows. Windows are calendar
//! day ranges with an inclusive `end_date`; `None` means the window is open
//! ended. For every level:
//!
//! - at most one window is open ended, and
//! - no two windows overlap.
//!
//! The functions here only plan a change against a snapshot of the level's
//! history. Persistence executes the plan inside the same transaction that
//! read the snapshot.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::DomainError;
use crate::types::{LevelCode, Money};

/// How long after creation a rate row may still be deleted.
pub const DELETION_WINDOW_HOURS: i64 = 24;

/// One row of a level's rate history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    /// Row identifier.
    pub rate_id: i64,
    /// Academic level the rate belongs to.
    pub level_id: i64,
    /// Hourly rate.
    pub rate: Money,
    /// First day the rate applies.
    pub start_date: NaiveDate,
    /// Last day the rate applies, or `None` when open ended.
    pub end_date: Option<NaiveDate>,
    /// When the row was created.
    pub created_at: NaiveDateTime,
}

impl RateWindow {
    /// Returns whether the window is open ended.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end_date.is_none()
    }

    /// Returns whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }

    fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        windows_overlap(self.start_date, self.end_date, start, end)
    }

    fn overlap_error(&self, start: NaiveDate, end: Option<NaiveDate>) -> DomainError {
        DomainError::RateOverlap {
            level_id: self.level_id,
            conflicting_rate_id: self.rate_id,
            conflicting_start: self.start_date,
            conflicting_end: self.end_date,
            proposed_start: start,
            proposed_end: end,
        }
    }
}

/// Returns whether two inclusive day windows share at least one day.
///
/// `None` as an end date is treated as unbounded.
#[must_use]
pub fn windows_overlap(
    s1: NaiveDate,
    e1: Option<NaiveDate>,
    s2: NaiveDate,
    e2: Option<NaiveDate>,
) -> bool {
    e2.is_none_or(|e2| s1 <= e2) && e1.is_none_or(|e1| s2 <= e1)
}

/// Verifies both history invariants for one level.
///
/// # Errors
///
/// Returns `DuplicateOpenRate` or `RateOverlap` for the first violation found.
pub fn check_history(windows: &[RateWindow]) -> Result<(), DomainError> {
    let mut open: Option<&RateWindow> = None;
    for (idx, window) in windows.iter().enumerate() {
        if window.is_open() {
            if let Some(existing) = open {
                return Err(DomainError::DuplicateOpenRate {
                    level_id: window.level_id,
                    open_rate_id: existing.rate_id,
                });
            }
            open = Some(window);
        }
        if let Some(other) = windows[idx + 1..]
            .iter()
            .find(|o| o.overlaps(window.start_date, window.end_date))
        {
            return Err(other.overlap_error(window.start_date, window.end_date));
        }
    }
    Ok(())
}

fn ensure_positive(rate: Money) -> Result<(), DomainError> {
    if rate.is_positive() {
        Ok(())
    } else {
        Err(DomainError::InvalidRate(format!(
            "Hourly rate must be greater than zero, got {rate}"
        )))
    }
}

fn single_open(windows: &[RateWindow], level_id: i64) -> Result<Option<&RateWindow>, DomainError> {
    let mut open = windows.iter().filter(|w| w.is_open());
    let first: Option<&RateWindow> = open.next();
    if let (Some(first), Some(_)) = (first, open.next()) {
        return Err(DomainError::DuplicateOpenRate {
            level_id,
            open_rate_id: first.rate_id,
        });
    }
    Ok(first)
}

/// A request to start a new rate for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRaise {
    /// Academic level.
    pub level_id: i64,
    /// New hourly rate.
    pub rate: Money,
    /// First day of the new rate.
    pub start_date: NaiveDate,
}

/// The writes a rate raise performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaisePlan {
    /// Currently open row to close, and its new end date.
    pub close: Option<(i64, NaiveDate)>,
    /// The new open-ended window.
    pub raise: RateRaise,
}

/// Plans a rate raise against the level's current history.
///
/// The open window (if any) is closed the day before `start_date` and a new
/// open window starts on `start_date`.
///
/// # Errors
///
/// - `InvalidRate` if the rate is not positive
/// - `DuplicateOpenRate` if the history already has two open windows
/// - `RaiseStartsTooEarly` if `start_date` is not after the open window's start
/// - `RateOverlap` if any other window reaches `start_date` or later
pub fn plan_rate_raise(existing: &[RateWindow], raise: RateRaise) -> Result<RaisePlan, DomainError> {
    ensure_positive(raise.rate)?;
    let open: Option<&RateWindow> = single_open(existing, raise.level_id)?;

    let close: Option<(i64, NaiveDate)> = match open {
        Some(current) => {
            // Rule: the closed window must keep at least its first day
            if raise.start_date <= current.start_date {
                return Err(DomainError::RaiseStartsTooEarly {
                    level_id: raise.level_id,
                    open_rate_id: current.rate_id,
                    open_start: current.start_date,
                    requested_start: raise.start_date,
                });
            }
            let closed_end: NaiveDate = raise.start_date.pred_opt().ok_or_else(|| {
                DomainError::DateArithmeticOverflow {
                    operation: format!("closing rate {}", current.rate_id),
                }
            })?;
            Some((current.rate_id, closed_end))
        }
        None => None,
    };

    let closing_id: Option<i64> = close.map(|(id, _)| id);
    if let Some(conflict) = existing
        .iter()
        .filter(|w| Some(w.rate_id) != closing_id)
        .find(|w| w.overlaps(raise.start_date, None))
    {
        return Err(conflict.overlap_error(raise.start_date, None));
    }

    Ok(RaisePlan { close, raise })
}

/// A partial update of an existing rate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateCorrection {
    /// New hourly rate.
    pub rate: Option<Money>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date; `Some(None)` reopens the window.
    pub end_date: Option<Option<NaiveDate>>,
}

/// Plans a correction, returning the row as it will be stored.
///
/// # Errors
///
/// - `RateNotFound` if `rate_id` is not part of the history
/// - `InvalidRate` if the new rate is not positive
/// - `InvalidRateWindow` if the resulting end is not strictly after the start
/// - `DuplicateOpenRate` if the row would become a second open window
/// - `RateOverlap` if the resulting window overlaps another row
pub fn plan_rate_correction(
    existing: &[RateWindow],
    rate_id: i64,
    correction: RateCorrection,
) -> Result<RateWindow, DomainError> {
    let target: &RateWindow = existing
        .iter()
        .find(|w| w.rate_id == rate_id)
        .ok_or(DomainError::RateNotFound(rate_id))?;

    let mut updated: RateWindow = target.clone();
    if let Some(rate) = correction.rate {
        ensure_positive(rate)?;
        updated.rate = rate;
    }
    if let Some(start) = correction.start_date {
        updated.start_date = start;
    }
    if let Some(end) = correction.end_date {
        updated.end_date = end;
    }

    match updated.end_date {
        Some(end) if end <= updated.start_date => {
            return Err(DomainError::InvalidRateWindow {
                start_date: updated.start_date,
                end_date: end,
            });
        }
        None => {
            if let Some(open) = existing
                .iter()
                .find(|w| w.rate_id != rate_id && w.is_open())
            {
                return Err(DomainError::DuplicateOpenRate {
                    level_id: updated.level_id,
                    open_rate_id: open.rate_id,
                });
            }
        }
        Some(_) => {}
    }

    if let Some(conflict) = existing
        .iter()
        .filter(|w| w.rate_id != rate_id)
        .find(|w| w.overlaps(updated.start_date, updated.end_date))
    {
        return Err(conflict.overlap_error(updated.start_date, updated.end_date));
    }

    Ok(updated)
}

/// The writes a rate deletion performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Row to delete.
    pub rate_id: i64,
    /// Preceding row to reopen when the deleted row was open ended.
    pub reopen: Option<i64>,
}

/// Plans the deletion of a recently created rate row.
///
/// # Errors
///
/// - `RateNotFound` if `rate_id` is not part of the history
/// - `RateDeletionWindowExpired` if the row is older than 24 hours
pub fn plan_rate_deletion(
    existing: &[RateWindow],
    rate_id: i64,
    now: NaiveDateTime,
) -> Result<DeletionPlan, DomainError> {
    let target: &RateWindow = existing
        .iter()
        .find(|w| w.rate_id == rate_id)
        .ok_or(DomainError::RateNotFound(rate_id))?;

    if now - target.created_at >= Duration::hours(DELETION_WINDOW_HOURS) {
        return Err(DomainError::RateDeletionWindowExpired {
            rate_id,
            created_at: target.created_at,
        });
    }

    let reopen: Option<i64> = if target.is_open() {
        existing
            .iter()
            .filter(|w| w.rate_id != rate_id)
            .filter_map(|w| w.end_date.map(|end| (end, w.rate_id)))
            .max()
            .map(|(_, id)| id)
    } else {
        None
    };

    Ok(DeletionPlan { rate_id, reopen })
}

/// Returns the window in force on `date`, if any.
#[must_use]
pub fn find_applicable_rate(windows: &[RateWindow], date: NaiveDate) -> Option<&RateWindow> {
    windows.iter().find(|w| w.contains(date))
}

/// Rate histories for every level, keyed by level code.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    histories: HashMap<LevelCode, Vec<RateWindow>>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window to a level's history.
    pub fn insert(&mut self, level: LevelCode, window: RateWindow) {
        self.histories.entry(level).or_default().push(window);
    }

    /// Returns the window in force for `level` on `date`.
    #[must_use]
    pub fn window_on(&self, level: LevelCode, date: NaiveDate) -> Option<&RateWindow> {
        self.histories
            .get(&level)
            .and_then(|h| find_applicable_rate(h, date))
    }

    /// Returns the hourly rate for `level` on `date`.
    ///
    /// # Errors
    ///
    /// Returns `RateNotDefined` if no window covers the date.
    pub fn rate_on(&self, level: LevelCode, date: NaiveDate) -> Result<Money, DomainError> {
        self.window_on(level, date)
            .map(|w| w.rate)
            .ok_or_else(|| DomainError::RateNotDefined {
                level: level.as_str().to_string(),
                date,
            })
    }
}
