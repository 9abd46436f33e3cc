// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::{NaiveDate, NaiveDateTime};

/// Errors raised when a domain rule or invariant is violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A rate amount is zero or negative.
    InvalidRate(String),
    /// A monetary amount could not be parsed.
    InvalidMoney(String),
    /// The proposed window overlaps an existing window of the same level.
    RateOverlap {
        /// The academic level whose history would be violated.
        level_id: i64,
        /// The existing row that conflicts.
        conflicting_rate_id: i64,
        /// Start of the conflicting row.
        conflicting_start: NaiveDate,
        /// End of the conflicting row (`None` is open-ended).
        conflicting_end: Option<NaiveDate>,
        /// Start of the proposed window.
        proposed_start: NaiveDate,
        /// End of the proposed window (`None` is open-ended).
        proposed_end: Option<NaiveDate>,
    },
    /// A second open-ended rate would exist for the level.
    DuplicateOpenRate {
        /// The academic level.
        level_id: i64,
        /// The row that is already open-ended.
        open_rate_id: i64,
    },
    /// A new rate must start after the start of the current open rate.
    RaiseStartsTooEarly {
        /// The academic level.
        level_id: i64,
        /// The current open-ended row.
        open_rate_id: i64,
        /// Start of the current open-ended row.
        open_start: NaiveDate,
        /// Requested start of the new rate.
        requested_start: NaiveDate,
    },
    /// The end date of a window is not strictly after its start date.
    InvalidRateWindow {
        /// Resulting start date.
        start_date: NaiveDate,
        /// Resulting end date.
        end_date: NaiveDate,
    },
    /// The rate history row does not exist.
    RateNotFound(i64),
    /// The rate row is too old to be deleted.
    RateDeletionWindowExpired {
        /// The row that was targeted.
        rate_id: i64,
        /// When the row was created.
        created_at: NaiveDateTime,
    },
    /// No rate is defined for the level on the given date.
    RateNotDefined {
        /// The academic level code.
        level: String,
        /// The date that was looked up.
        date: NaiveDate,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// An upload status transition is not permitted.
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },
    /// Unknown upload status string.
    InvalidFileStatus(String),
    /// Unknown row validation status string.
    InvalidValidationStatus(String),
    /// Unknown academic level code.
    InvalidLevelCode(String),
    /// The billing report was edited manually and a recompute was not forced.
    ReportEdited {
        /// The edited report.
        report_id: i64,
    },
    /// The term calendar is not a valid date range.
    InvalidTermCalendar {
        /// Term start.
        start_date: NaiveDate,
        /// Term end.
        end_date: NaiveDate,
    },
}

fn fmt_end(end: Option<NaiveDate>) -> String {
    end.map_or_else(|| String::from("open"), |d| d.to_string())
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRate(msg) => write!(f, "Invalid rate: {msg}"),
            Self::InvalidMoney(value) => write!(f, "Invalid monetary amount '{value}'"),
            Self::RateOverlap {
                level_id,
                conflicting_rate_id,
                conflicting_start,
                conflicting_end,
                proposed_start,
                proposed_end,
            } => write!(
                f,
                "Rate window [{proposed_start}, {}] overlaps rate {conflicting_rate_id} \
                 [{conflicting_start}, {}] for level {level_id}",
                fmt_end(*proposed_end),
                fmt_end(*conflicting_end)
            ),
            Self::DuplicateOpenRate {
                level_id,
                open_rate_id,
            } => write!(
                f,
                "Level {level_id} already has an open-ended rate (rate {open_rate_id})"
            ),
            Self::RaiseStartsTooEarly {
                level_id,
                open_rate_id,
                open_start,
                requested_start,
            } => write!(
                f,
                "New rate for level {level_id} must start after {open_start} \
                 (start of current rate {open_rate_id}), got {requested_start}"
            ),
            Self::InvalidRateWindow {
                start_date,
                end_date,
            } => write!(
                f,
                "End date {end_date} must be strictly after start date {start_date}"
            ),
            Self::RateNotFound(id) => write!(f, "Rate history row {id} not found"),
            Self::RateDeletionWindowExpired {
                rate_id,
                created_at,
            } => write!(
                f,
                "Rate {rate_id} was created at {created_at} and can no longer be deleted \
                 (deletion is allowed within 24 hours)"
            ),
            Self::RateNotDefined { level, date } => {
                write!(f, "No hourly rate defined for level {level} on {date}")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Upload cannot move from '{from}' to '{to}'")
            }
            Self::InvalidFileStatus(s) => write!(f, "Invalid upload status '{s}'"),
            Self::InvalidValidationStatus(s) => write!(f, "Invalid validation status '{s}'"),
            Self::InvalidLevelCode(s) => write!(f, "Invalid academic level code '{s}'"),
            Self::ReportEdited { report_id } => write!(
                f,
                "Billing report {report_id} has manual edits; recompute must be forced"
            ),
            Self::InvalidTermCalendar {
                start_date,
                end_date,
            } => write!(
                f,
                "Term calendar ends ({end_date}) before it starts ({start_date})"
            ),
        }
    }
}

impl std::error::Error for DomainError {}
