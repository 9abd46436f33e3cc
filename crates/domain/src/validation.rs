// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row validation against the reference catalogs.
//!
//! Each [`Validator`] inspects one normalized row and reports [`Finding`]s.
//! In lenient mode nothing is worse than a warning; in strict mode an
//! `ERROR` finding excludes the row from the inserted count. Validators see
//! only the row and a catalog snapshot, so rows can be checked in any order.

use serde::{Deserialize, Serialize};

use crate::catalog::{ProfessorMatch, ReferenceCatalog, resolve_professor};
use crate::class_row::{CanonicalField, NormalizedClassRow};
use crate::normalize::{normalize_title, parse_time_range, parse_weekdays};
use crate::text::{fold, same_text, similarity, split_roman_suffix};
use crate::types::ValidationStatus;

/// Minimum similarity for a subject name to count as a typo of the catalog name.
pub const SUBJECT_NAME_THRESHOLD: f64 = 0.85;

/// Minimum stem similarity for two names to differ only in course level.
pub const ROMAN_STEM_THRESHOLD: f64 = 0.90;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Row is usable but should be reviewed.
    Warning,
    /// Row is rejected (strict mode only).
    Error,
}

impl Severity {
    /// The severity a mode-dependent rule reports: `Error` in strict mode,
    /// `Warning` otherwise.
    #[must_use]
    pub const fn for_mode(strict: bool) -> Self {
        if strict { Self::Error } else { Self::Warning }
    }

    /// Converts this severity to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Error bucket a validator reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unknown or empty coordination.
    MissingCoordination,
    /// Unknown subject or mismatched subject name.
    MissingSubject,
    /// Unknown professor or mismatched professor data.
    MissingProfessor,
    /// Unusable schedule, days or duration.
    InvalidSchedule,
}

impl ErrorCategory {
    /// Converts this category to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCoordination => "missing_coordination",
            Self::MissingSubject => "missing_subject",
            Self::MissingProfessor => "missing_professor",
            Self::InvalidSchedule => "invalid_schedule",
        }
    }
}

/// A single validator observation about one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Severity after mode semantics have been applied.
    pub level: Severity,
    /// Canonical field name the finding refers to.
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// What the catalog expected, when known.
    pub expected: Option<String>,
    /// What the row contained.
    pub actual: Option<String>,
    /// Name of the validator that produced the finding.
    pub validator: String,
    /// Error bucket of that validator.
    pub category: ErrorCategory,
}

impl Finding {
    fn new(
        validator: &dyn Validator,
        level: Severity,
        field: CanonicalField,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            field: field.field_name().to_string(),
            message: message.into(),
            expected: None,
            actual: None,
            validator: validator.name().to_string(),
            category: validator.category(),
        }
    }

    fn expected(mut self, expected: &str) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    fn actual(mut self, actual: &str) -> Self {
        self.actual = Some(actual.to_string());
        self
    }
}

/// A per-row check against the reference catalog.
///
/// Implementations are pure: the same row and catalog always produce the same
/// findings, so rows may be validated in any order or in parallel.
pub trait Validator: Sync {
    /// Stable validator name, recorded on each finding.
    fn name(&self) -> &'static str;

    /// Category used when aggregating failures.
    fn category(&self) -> ErrorCategory;

    /// Validates one row.
    fn validate(
        &self,
        row: &NormalizedClassRow,
        catalog: &dyn ReferenceCatalog,
        strict: bool,
    ) -> Vec<Finding>;
}

fn differs_only_in_level(a: &str, b: &str) -> bool {
    match (split_roman_suffix(a), split_roman_suffix(b)) {
        (Some((stem_a, level_a)), Some((stem_b, level_b))) => {
            level_a != level_b
                && strsim::normalized_levenshtein(stem_a, stem_b) >= ROMAN_STEM_THRESHOLD
        }
        _ => false,
    }
}

/// Checks the subject code and name against the subject catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectValidator;

impl Validator for SubjectValidator {
    fn name(&self) -> &'static str {
        "subject"
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::MissingSubject
    }

    fn validate(
        &self,
        row: &NormalizedClassRow,
        catalog: &dyn ReferenceCatalog,
        strict: bool,
    ) -> Vec<Finding> {
        let mode: Severity = Severity::for_mode(strict);

        // Rule: the code must exist among non-deleted subjects
        let Some(subject) = catalog.subject_by_code(&row.subject_code) else {
            let message: String = if row.subject_code.is_empty() {
                String::from("Subject code is empty")
            } else {
                format!("Subject code '{}' not found in catalog", row.subject_code)
            };
            return vec![
                Finding::new(self, mode, CanonicalField::SubjectCode, message)
                    .actual(&row.subject_code),
            ];
        };

        if same_text(&row.subject_name, &subject.name) {
            return Vec::new();
        }

        let row_name: String = fold(&row.subject_name);
        let catalog_name: String = fold(&subject.name);

        // Rule: "Calculo II" is a different course from "Calculo III"
        if differs_only_in_level(&row_name, &catalog_name) {
            return vec![
                Finding::new(
                    self,
                    mode,
                    CanonicalField::SubjectName,
                    format!(
                        "Subject name refers to a different course level than code '{}'",
                        subject.code
                    ),
                )
                .expected(&subject.name)
                .actual(&row.subject_name),
            ];
        }

        let score: f64 = similarity(&row.subject_name, &subject.name);
        let (level, message): (Severity, String) = if score >= SUBJECT_NAME_THRESHOLD {
            (
                Severity::Warning,
                format!(
                    "Subject name is likely a typo of '{}' ({:.0}% similar)",
                    subject.name,
                    score * 100.0
                ),
            )
        } else {
            (
                mode,
                format!("Subject name does not match code '{}'", subject.code),
            )
        };
        vec![
            Finding::new(self, level, CanonicalField::SubjectName, message)
                .expected(&subject.name)
                .actual(&row.subject_name),
        ]
    }
}

/// Checks the professor name, title and code against the professor catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfessorValidator;

impl Validator for ProfessorValidator {
    fn name(&self) -> &'static str {
        "professor"
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::MissingProfessor
    }

    fn validate(
        &self,
        row: &NormalizedClassRow,
        catalog: &dyn ReferenceCatalog,
        strict: bool,
    ) -> Vec<Finding> {
        let mode: Severity = Severity::for_mode(strict);
        let mut findings: Vec<Finding> = Vec::new();

        let professor = match resolve_professor(catalog, &row.professor_name) {
            Some(ProfessorMatch::Exact(p)) => p,
            Some(ProfessorMatch::Similar(p, score)) => {
                findings.push(
                    Finding::new(
                        self,
                        Severity::Warning,
                        CanonicalField::ProfessorName,
                        format!(
                            "Professor matched to catalog name '{}' ({:.0}% similar)",
                            p.full_name,
                            score * 100.0
                        ),
                    )
                    .expected(&p.full_name)
                    .actual(&row.professor_name),
                );
                p
            }
            None => {
                return vec![
                    Finding::new(
                        self,
                        mode,
                        CanonicalField::ProfessorName,
                        "Professor not found in catalog",
                    )
                    .actual(&row.professor_name),
                ];
            }
        };

        // Rule: the title on the sheet must agree with the catalog title
        let catalog_title: String = normalize_title(&professor.academic_title).value;
        if !row.title.is_empty() && !same_text(&row.title, &catalog_title) {
            findings.push(
                Finding::new(
                    self,
                    mode,
                    CanonicalField::Title,
                    "Academic title differs from catalog",
                )
                .expected(&catalog_title)
                .actual(&row.title),
            );
        }

        // Rule: the professor code must agree with the catalog code
        let row_code: &str = row.professor_code.trim();
        if row_code.is_empty() {
            findings.push(
                Finding::new(
                    self,
                    Severity::Info,
                    CanonicalField::ProfessorCode,
                    "Professor code is empty; catalog code will be used",
                )
                .expected(&professor.professor_code),
            );
        } else if !row_code.eq_ignore_ascii_case(professor.professor_code.trim()) {
            findings.push(
                Finding::new(
                    self,
                    mode,
                    CanonicalField::ProfessorCode,
                    "Professor code differs from catalog",
                )
                .expected(&professor.professor_code)
                .actual(row_code),
            );
        }

        findings
    }
}

/// Checks that the coordination code exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinationValidator;

impl Validator for CoordinationValidator {
    fn name(&self) -> &'static str {
        "coordination"
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::MissingCoordination
    }

    fn validate(
        &self,
        row: &NormalizedClassRow,
        catalog: &dyn ReferenceCatalog,
        strict: bool,
    ) -> Vec<Finding> {
        if catalog.coordination_by_code(&row.coordination_code).is_some() {
            return Vec::new();
        }
        let message: String = if row.coordination_code.is_empty() {
            String::from("Coordination code is empty")
        } else {
            format!(
                "Coordination code '{}' not found in catalog",
                row.coordination_code
            )
        };
        vec![
            Finding::new(
                self,
                Severity::for_mode(strict),
                CanonicalField::CoordinationCode,
                message,
            )
            .actual(&row.coordination_code),
        ]
    }
}

/// Checks that schedule, days and duration describe a billable session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleValidator;

impl Validator for ScheduleValidator {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::InvalidSchedule
    }

    fn validate(
        &self,
        row: &NormalizedClassRow,
        _catalog: &dyn ReferenceCatalog,
        strict: bool,
    ) -> Vec<Finding> {
        let mode: Severity = Severity::for_mode(strict);
        let mut findings: Vec<Finding> = Vec::new();

        if parse_weekdays(&row.days).is_empty() {
            findings.push(Finding::new(
                self,
                mode,
                CanonicalField::Days,
                "No weekday could be recognized",
            ));
        }

        if row.duration_minutes == 0 {
            findings.push(Finding::new(
                self,
                mode,
                CanonicalField::Duration,
                "Duration is missing or longer than a day",
            ));
        }

        match parse_time_range(&row.schedule) {
            None => findings.push(Finding::new(
                self,
                mode,
                CanonicalField::Schedule,
                "Schedule could not be interpreted as a time range",
            )),
            Some((start, end)) if end <= start => findings.push(
                Finding::new(
                    self,
                    mode,
                    CanonicalField::Schedule,
                    "Schedule ends before it starts",
                )
                .actual(&row.schedule),
            ),
            Some((start, end)) => {
                let span: u32 = end - start;
                if row.duration_minutes > 0 && span != row.duration_minutes {
                    findings.push(
                        Finding::new(
                            self,
                            Severity::Warning,
                            CanonicalField::Duration,
                            format!(
                                "Duration of {} minutes differs from the {span}-minute schedule",
                                row.duration_minutes
                            ),
                        )
                        .expected(&span.to_string())
                        .actual(&row.duration_minutes.to_string()),
                    );
                }
            }
        }

        findings
    }
}

/// The validators every row passes through, in reporting order.
pub static VALIDATORS: [&dyn Validator; 4] = [
    &SubjectValidator,
    &ProfessorValidator,
    &CoordinationValidator,
    &ScheduleValidator,
];

/// Validation result for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValidation {
    /// Aggregate status.
    pub status: ValidationStatus,
    /// All findings, in validator order.
    pub findings: Vec<Finding>,
}

impl RowValidation {
    /// Findings at `Error` level.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.level == Severity::Error)
    }

    /// Number of `Warning` findings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.level == Severity::Warning)
            .count()
    }

    /// One-line summary of error and warning messages for the row record.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .findings
            .iter()
            .filter(|f| f.level != Severity::Info)
            .map(|f| format!("[{}] {}: {}", f.level.as_str(), f.field, f.message))
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

/// Runs every validator over a row and derives its status.
///
/// In lenient mode no finding is ever reported at `Error` level.
#[must_use]
pub fn validate_row(
    row: &NormalizedClassRow,
    catalog: &dyn ReferenceCatalog,
    strict: bool,
) -> RowValidation {
    let mut findings: Vec<Finding> = VALIDATORS
        .iter()
        .flat_map(|v| v.validate(row, catalog, strict))
        .collect();

    if !strict {
        for finding in &mut findings {
            if finding.level == Severity::Error {
                finding.level = Severity::Warning;
            }
        }
    }

    let status: ValidationStatus = match findings.iter().map(|f| f.level).max() {
        Some(Severity::Error) => ValidationStatus::Error,
        Some(Severity::Warning) => ValidationStatus::Warning,
        Some(Severity::Info) | None => ValidationStatus::Valid,
    };

    RowValidation { status, findings }
}
