// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod billing;
mod catalog;
mod class_row;
mod error;
mod ingestion;
mod normalize;
mod rates;
mod text;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use billing::{
    BillableClass, BillingComputation, LevelRates, MonthlyLine, RateSnapshotLine,
    ScheduleBlock, SummaryLine, TermCalendar, compute_billing, ensure_recomputable,
    minutes_to_hours, resolve_level,
};
pub use catalog::{
    CatalogSnapshot, CoordinationRecord, PROFESSOR_MATCH_THRESHOLD, ProfessorMatch,
    ProfessorRecord, ReferenceCatalog, SubjectRecord, resolve_professor,
};
pub use class_row::{CanonicalField, NormalizedClassRow, RawClassRow};
pub use error::DomainError;
pub use ingestion::{
    ErrorsByType, FailurePolicy, MAX_SAMPLE_ERRORS, RowTally, SampleError, StrictFailureReport,
};
pub use normalize::{
    ChangeRecord, MAX_DURATION_MINUTES, Normalized, format_clock, normalize_time_range, normalize_title,
    normalize_weekdays, parse_count, parse_duration, parse_flag, parse_time_range,
    parse_weekdays, weekday_code,
};
pub use rates::{
    DELETION_WINDOW_HOURS, DeletionPlan, RaisePlan, RateCorrection, RateRaise, RateTable,
    RateWindow, check_history, find_applicable_rate, plan_rate_correction, plan_rate_deletion,
    plan_rate_raise, windows_overlap,
};
pub use text::{fold, same_text, similarity};

// Re-export public types
pub use types::{FileStatus, LevelCode, LoadContext, Money, ValidationStatus};
pub use validation::{
    CoordinationValidator, ErrorCategory, Finding, ProfessorValidator, ROMAN_STEM_THRESHOLD,
    RowValidation, SUBJECT_NAME_THRESHOLD, ScheduleValidator, Severity, SubjectValidator,
    VALIDATORS, Validator, validate_row,
};
