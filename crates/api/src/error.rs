// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use loadbill_domain::DomainError;
use loadbill_persistence::PersistenceError;

use crate::sheet::ExtractError;

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// service contract. The server maps each variant to an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A concurrent writer got there first.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
        /// Whether repeating the request can succeed.
        retryable: bool,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns whether repeating the request can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { retryable: true, .. })
    }

    pub(crate) fn not_found(resource_type: &str, message: String) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message,
        }
    }

    pub(crate) fn invalid(field: &str, message: String) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

fn rule(rule: &str, message: String) -> ApiError {
    ApiError::DomainRuleViolation {
        rule: rule.to_string(),
        message,
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::InvalidRate(_) => ApiError::invalid("rate", message),
        DomainError::InvalidMoney(_) => ApiError::invalid("amount", message),
        DomainError::RateOverlap { .. } => rule("rate_overlap", message),
        DomainError::DuplicateOpenRate { .. } => rule("single_open_rate", message),
        DomainError::RaiseStartsTooEarly { .. } => rule("raise_after_open_start", message),
        DomainError::InvalidRateWindow { .. } => ApiError::invalid("end_date", message),
        DomainError::RateNotFound(_) => ApiError::not_found("Rate", message),
        DomainError::RateDeletionWindowExpired { .. } => rule("rate_deletion_window", message),
        DomainError::RateNotDefined { .. } => rule("rate_defined", message),
        DomainError::DateArithmeticOverflow { .. } => ApiError::invalid("date", message),
        DomainError::InvalidStatusTransition { .. } => rule("load_file_lifecycle", message),
        DomainError::InvalidFileStatus(_) | DomainError::InvalidValidationStatus(_) => {
            ApiError::invalid("status", message)
        }
        DomainError::InvalidLevelCode(_) => ApiError::invalid("level", message),
        DomainError::ReportEdited { .. } => rule("edited_report", message),
        DomainError::InvalidTermCalendar { .. } => rule("term_calendar", message),
    }
}

/// Translates a persistence error into an API error.
///
/// Domain rejections keep their meaning; storage failures become `Internal`.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Domain(domain_err) => translate_domain_error(domain_err),
        PersistenceError::NotFound(message) => ApiError::not_found("Record", message),
        PersistenceError::ConcurrencyConflict(message) => ApiError::Conflict {
            message,
            retryable: true,
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

/// Translates a structural spreadsheet error into an API error.
#[must_use]
pub fn translate_extract_error(err: ExtractError) -> ApiError {
    let message: String = err.to_string();
    match err {
        ExtractError::HeaderNotFound { .. } => ApiError::invalid("header", message),
        ExtractError::UnreadableSpreadsheet(_) => ApiError::invalid("file", message),
        ExtractError::SourceMissing { .. } => ApiError::not_found("Stored file", message),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        translate_extract_error(err)
    }
}
