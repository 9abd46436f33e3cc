// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-upload accounting: row counters, the failure policy, and the
//! structured payload recorded when a strict upload is rejected.

use serde::{Deserialize, Serialize};

use crate::types::ValidationStatus;
use crate::validation::{ErrorCategory, RowValidation};

/// Maximum number of sample errors carried in a failure payload.
pub const MAX_SAMPLE_ERRORS: usize = 10;

/// Row counters for one upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTally {
    /// Data rows seen.
    pub total: i32,
    /// Rows with status `valid` or `warning`.
    pub inserted: i32,
    /// Rows with status `error`.
    pub failed: i32,
    /// Rows with status `warning`.
    pub warnings: i32,
}

impl RowTally {
    /// Counts one validated row.
    pub const fn record(&mut self, status: ValidationStatus) {
        self.total += 1;
        match status {
            ValidationStatus::Valid => self.inserted += 1,
            ValidationStatus::Warning => {
                self.inserted += 1;
                self.warnings += 1;
            }
            ValidationStatus::Error => self.failed += 1,
        }
    }
}

/// When an upload as a whole is considered failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// A strict upload fails only when no row was usable.
    #[default]
    AllRowsFailed,
}

impl FailurePolicy {
    /// Returns whether the upload must be marked failed.
    ///
    /// Lenient uploads never fail on row content. A strict upload with zero
    /// data rows has zero usable rows and therefore fails.
    #[must_use]
    pub const fn is_failed(&self, strict: bool, tally: &RowTally) -> bool {
        match self {
            Self::AllRowsFailed => strict && tally.inserted == 0,
        }
    }
}

/// Number of failed rows per error category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsByType {
    /// Rows with a coordination error.
    pub missing_coordination: i32,
    /// Rows with a subject error.
    pub missing_subject: i32,
    /// Rows with a professor error.
    pub missing_professor: i32,
    /// Rows with a schedule error.
    pub invalid_schedule: i32,
}

impl ErrorsByType {
    const fn bump(&mut self, category: ErrorCategory) {
        match category {
            ErrorCategory::MissingCoordination => self.missing_coordination += 1,
            ErrorCategory::MissingSubject => self.missing_subject += 1,
            ErrorCategory::MissingProfessor => self.missing_professor += 1,
            ErrorCategory::InvalidSchedule => self.invalid_schedule += 1,
        }
    }
}

/// One failed row as shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleError {
    /// Spreadsheet row number.
    pub row: i32,
    /// Field of the first error.
    pub field: String,
    /// Offending value, if any.
    pub value: Option<String>,
    /// All error messages for the row.
    pub reason: String,
    /// Validators that rejected the row.
    pub validators: Vec<String>,
}

/// Payload stored on a strict upload that produced no usable rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictFailureReport {
    /// Row counters.
    pub summary: RowTally,
    /// Failed rows per category. A row counts once per category it failed.
    pub errors_by_type: ErrorsByType,
    /// Up to `MAX_SAMPLE_ERRORS` failed rows.
    pub sample_errors: Vec<SampleError>,
}

impl StrictFailureReport {
    /// Builds the report from `(row number, validation)` pairs.
    #[must_use]
    pub fn build<'a, I>(tally: RowTally, rows: I) -> Self
    where
        I: IntoIterator<Item = (i32, &'a RowValidation)>,
    {
        let mut errors_by_type: ErrorsByType = ErrorsByType::default();
        let mut sample_errors: Vec<SampleError> = Vec::new();

        for (row, validation) in rows {
            let errors: Vec<_> = validation.errors().collect();
            let Some(first) = errors.first() else {
                continue;
            };

            let mut categories: Vec<ErrorCategory> = Vec::new();
            let mut validators: Vec<String> = Vec::new();
            for finding in &errors {
                if !categories.contains(&finding.category) {
                    categories.push(finding.category);
                    errors_by_type.bump(finding.category);
                }
                if !validators.contains(&finding.validator) {
                    validators.push(finding.validator.clone());
                }
            }

            if sample_errors.len() < MAX_SAMPLE_ERRORS {
                sample_errors.push(SampleError {
                    row,
                    field: first.field.clone(),
                    value: first.actual.clone(),
                    reason: errors
                        .iter()
                        .map(|f| f.message.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                    validators,
                });
            }
        }

        Self {
            summary: tally,
            errors_by_type,
            sample_errors,
        }
    }

    /// Short human-readable description for logs and the file record.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "Strict validation rejected all {} rows",
            self.summary.total
        )
    }
}
