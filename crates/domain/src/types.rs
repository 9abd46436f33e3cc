// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The `(faculty, school, term)` key that scopes uploaded load files.
///
/// At most one active file version exists per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadContext {
    /// Faculty identifier.
    pub faculty_id: i64,
    /// School identifier.
    pub school_id: i64,
    /// Academic term identifier.
    pub term_id: i64,
}

impl LoadContext {
    /// Creates a new context key.
    #[must_use]
    pub const fn new(faculty_id: i64, school_id: i64, term_id: i64) -> Self {
        Self {
            faculty_id,
            school_id,
            term_id,
        }
    }

    /// Returns the version number the next upload in this context receives.
    ///
    /// Versions start at 1 and increase by one over the current active version.
    #[must_use]
    pub const fn next_version(previous: Option<i32>) -> i32 {
        match previous {
            Some(v) => v + 1,
            None => 1,
        }
    }
}

impl std::fmt::Display for LoadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "faculty={} school={} term={}",
            self.faculty_id, self.school_id, self.term_id
        )
    }
}

/// Processing status of an uploaded load file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Uploaded and waiting for a worker.
    #[default]
    Pending,
    /// Picked up by a worker.
    Processing,
    /// Ingested; rows are usable.
    Completed,
    /// Structural failure or (strict mode) no usable rows.
    Failed,
}

impl FileStatus {
    /// Converts this status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - `pending` → `processing`
    /// - `processing` → `completed` | `failed`
    /// - `processing` → `pending` (explicit re-queue after a crashed worker)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed | Self::Failed | Self::Pending)
        )
    }

    /// Returns whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Validates a transition, returning the target status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the move is not allowed.
    pub fn transition(self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

impl FromStr for FileStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(DomainError::InvalidFileStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one ingested class row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// No findings above INFO.
    Valid,
    /// At least one warning, no errors.
    Warning,
    /// At least one error (strict mode only).
    Error,
}

impl ValidationStatus {
    /// Converts this status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Rows in `valid` or `warning` status count as ingested and are billable.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl FromStr for ValidationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(DomainError::InvalidValidationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment tier codes, lowest to highest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelCode {
    /// Base (undergraduate degree) level.
    #[serde(rename = "GDO")]
    Grado,
    /// One master's degree.
    #[serde(rename = "M1")]
    Masters1,
    /// Two or more master's degrees.
    #[serde(rename = "M2")]
    Masters2,
    /// Doctorate.
    #[serde(rename = "DR")]
    Doctor,
    /// Bilingual class or professor.
    #[serde(rename = "BLG")]
    Bilingual,
}

impl LevelCode {
    /// All codes in ascending priority.
    pub const ALL: [Self; 5] = [
        Self::Grado,
        Self::Masters1,
        Self::Masters2,
        Self::Doctor,
        Self::Bilingual,
    ];

    /// Converts this code to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grado => "GDO",
            Self::Masters1 => "M1",
            Self::Masters2 => "M2",
            Self::Doctor => "DR",
            Self::Bilingual => "BLG",
        }
    }

    /// Payment priority (1-5), higher pays more.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        match self {
            Self::Grado => 1,
            Self::Masters1 => 2,
            Self::Masters2 => 3,
            Self::Doctor => 4,
            Self::Bilingual => 5,
        }
    }
}

impl FromStr for LevelCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GDO" => Ok(Self::Grado),
            "M1" => Ok(Self::Masters1),
            "M2" => Ok(Self::Masters2),
            "DR" => Ok(Self::Doctor),
            "BLG" => Ok(Self::Bilingual),
            _ => Err(DomainError::InvalidLevelCode(s.to_string())),
        }
    }
}

impl std::fmt::Display for LevelCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dollar amount held as integer cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies an hourly amount by a number of minutes, rounding half up to the cent.
    #[must_use]
    pub fn for_minutes(&self, minutes: u32) -> Self {
        Self((self.0 * i64::from(minutes) + 30) / 60)
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses `"12"`, `"12.5"`, `"12.50"` or `"$12.50"` into cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().trim_start_matches('$').replace(',', ".");
        let invalid = || DomainError::InvalidMoney(s.to_string());
        let (whole, frac) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let dollars: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign: &str = if self.0 < 0 { "-" } else { "" };
        let abs: i64 = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
