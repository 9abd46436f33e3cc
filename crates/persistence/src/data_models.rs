// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;

use chrono::NaiveDate;
use loadbill_domain::{
    ChangeRecord, FileStatus, Finding, LevelCode, LoadContext, MonthlyLine, NormalizedClassRow,
    RowTally, SummaryLine, ValidationStatus,
};
use serde::{Deserialize, Serialize};

/// Parameters for registering a newly uploaded load file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoadFile {
    pub context: LoadContext,
    pub uploaded_by: String,
    pub original_filename: String,
    pub storage_path: String,
    pub strict_validation: bool,
}

/// One stored version of an uploaded load file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFileData {
    pub load_file_id: i64,
    pub context: LoadContext,
    pub uploaded_by: String,
    pub original_filename: String,
    pub storage_path: String,
    pub strict_validation: bool,
    pub status: FileStatus,
    pub version: i32,
    pub is_active: bool,
    pub superseded_at: Option<String>,
    pub superseded_by: Option<i64>,
    pub tally: RowTally,
    /// Human note or, for rejected strict uploads, a JSON failure report.
    pub error_message: Option<String>,
    pub created_at: String,
    pub processed_at: Option<String>,
}

/// A validated row ready to be written, with its resolved catalog references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRowRecord {
    pub row: NormalizedClassRow,
    pub subject_id: Option<i64>,
    pub professor_id: Option<i64>,
    pub coordination_id: Option<i64>,
    pub professor_is_bilingual: bool,
    pub professor_is_doctor: bool,
    pub status: ValidationStatus,
    /// One-line summary of the findings, if any.
    pub validation_errors: Option<String>,
    pub findings: Vec<Finding>,
    pub changes: Vec<ChangeRecord>,
}

/// A stored class row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredClassRow {
    pub load_class_row_id: i64,
    pub load_file_id: i64,
    #[serde(flatten)]
    pub record: ClassRowRecord,
}

/// Parameters for registering a professor in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewProfessor {
    pub professor_code: String,
    pub full_name: String,
    pub academic_title: String,
    pub masters_count: u8,
    pub is_bilingual: bool,
    pub is_doctor: bool,
    pub is_active: bool,
}

/// An academic term with its calendar bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermData {
    pub term_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A payment tier row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicLevelData {
    pub level_id: i64,
    pub code: LevelCode,
    pub name: String,
    pub priority: i32,
    pub is_active: bool,
}

/// Header of a billing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingReportData {
    pub report_id: i64,
    pub load_file_id: i64,
    /// Permanently true once any child row was edited by hand.
    pub is_edited: bool,
    pub as_of_date: NaiveDate,
    pub generated_at: String,
}

/// A stored payment summary line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummaryData {
    pub payment_summary_id: i64,
    #[serde(flatten)]
    pub line: SummaryLine,
}

/// A stored monthly line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyItemData {
    pub monthly_item_id: i64,
    #[serde(flatten)]
    pub line: MonthlyLine,
}

/// A rate recorded as in force on the report date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshotData {
    pub level: LevelCode,
    pub rate_id: i64,
    pub rate_cents: i64,
}

/// A billing report with all of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingReportDetail {
    pub report: BillingReportData,
    pub summaries: Vec<PaymentSummaryData>,
    pub monthly: Vec<MonthlyItemData>,
    pub snapshots: Vec<RateSnapshotData>,
}

/// What a queued job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Parse, validate and store an uploaded load file.
    Ingest,
    /// Compute the billing report of a load file.
    Billing,
}

impl JobKind {
    /// Converts this kind to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Billing => "billing",
        }
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" => Ok(Self::Ingest),
            "billing" => Ok(Self::Billing),
            _ => Err(format!("Unknown job kind: {s}")),
        }
    }
}

/// Where a queued job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobState {
    /// Converts this state to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown job state: {s}")),
        }
    }
}

/// A row of the work queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobData {
    pub job_id: i64,
    pub kind: JobKind,
    /// Load file the job operates on.
    pub target_id: i64,
    pub options: serde_json::Value,
    pub state: JobState,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}
