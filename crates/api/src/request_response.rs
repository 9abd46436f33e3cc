// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use chrono::NaiveDate;
use loadbill_domain::{
    LevelCode, LevelRates, LoadContext, Money, RateCorrection, RateWindow, StrictFailureReport,
};
use loadbill_persistence::{BillingReportDetail, LoadFileData};

use crate::error::ApiError;

/// API request to register an uploaded load file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadRequest {
    /// Faculty the schedule belongs to.
    pub faculty_id: i64,
    /// School the schedule belongs to.
    pub school_id: i64,
    /// Academic term.
    pub term_id: i64,
    /// Who uploaded the file.
    pub uploaded_by: String,
    /// Name of the file as uploaded; its extension selects the parser.
    pub original_filename: String,
    /// Whether validation findings reject rows.
    #[serde(default)]
    pub strict_validation: bool,
}

impl UploadRequest {
    /// The versioning key of this upload.
    #[must_use]
    pub const fn context(&self) -> LoadContext {
        LoadContext::new(self.faculty_id, self.school_id, self.term_id)
    }
}

/// API response describing one load file version.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoadFileResponse {
    /// The stored file.
    #[serde(flatten)]
    pub file: LoadFileData,
    /// The structured strict-mode rejection, when the file carries one.
    pub failure_report: Option<StrictFailureReport>,
}

impl From<LoadFileData> for LoadFileResponse {
    fn from(file: LoadFileData) -> Self {
        let failure_report: Option<StrictFailureReport> = file
            .error_message
            .as_deref()
            .and_then(|msg| serde_json::from_str(msg).ok());
        Self {
            file,
            failure_report,
        }
    }
}

/// API response for a deleted load file version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeleteLoadFileResponse {
    /// The deleted version.
    pub load_file_id: i64,
    /// The version that became active, if the deleted one was active.
    pub promoted_load_file_id: Option<i64>,
}

/// API request to start a new rate for a level.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RaiseRateRequest {
    /// Level code (`GDO`, `M1`, `M2`, `DR`, `BLG`).
    pub level: String,
    /// Hourly rate in dollars, e.g. `"15.00"`.
    pub rate: String,
    /// First day of the new rate.
    pub start_date: NaiveDate,
    /// Who made the change.
    pub created_by: String,
}

impl RaiseRateRequest {
    /// Parses the level code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown codes.
    pub fn level_code(&self) -> Result<LevelCode, ApiError> {
        Ok(self.level.parse::<LevelCode>()?)
    }

    /// Parses the dollar amount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed amounts.
    pub fn amount(&self) -> Result<Money, ApiError> {
        Ok(self.rate.parse::<Money>()?)
    }
}

/// API request to correct an existing rate row.
///
/// Omitted fields keep their stored value. `reopen` clears the end date and
/// cannot be combined with `end_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CorrectRateRequest {
    /// New hourly rate in dollars.
    pub rate: Option<String>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// Make the row open ended.
    #[serde(default)]
    pub reopen: bool,
}

impl CorrectRateRequest {
    /// Converts the request into a correction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed amount or when `reopen` is
    /// combined with an explicit end date.
    pub fn to_correction(&self) -> Result<RateCorrection, ApiError> {
        if self.reopen && self.end_date.is_some() {
            return Err(ApiError::invalid(
                "end_date",
                String::from("cannot set an end date and reopen the rate at once"),
            ));
        }

        let rate: Option<Money> = self
            .rate
            .as_deref()
            .map(str::parse::<Money>)
            .transpose()?;
        let end_date: Option<Option<NaiveDate>> = if self.reopen {
            Some(None)
        } else {
            self.end_date.map(Some)
        };

        Ok(RateCorrection {
            rate,
            start_date: self.start_date,
            end_date,
        })
    }
}

/// One rate history row as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RateWindowResponse {
    /// Row identifier.
    pub rate_id: i64,
    /// Academic level identifier.
    pub level_id: i64,
    /// Hourly rate in cents.
    pub rate_cents: i64,
    /// Hourly rate formatted in dollars.
    pub rate: String,
    /// First day the rate applies.
    pub start_date: NaiveDate,
    /// Last day the rate applies; absent when open ended.
    pub end_date: Option<NaiveDate>,
    /// When the row was created.
    pub created_at: String,
}

impl From<&RateWindow> for RateWindowResponse {
    fn from(window: &RateWindow) -> Self {
        Self {
            rate_id: window.rate_id,
            level_id: window.level_id,
            rate_cents: window.rate.cents(),
            rate: window.rate.to_string(),
            start_date: window.start_date,
            end_date: window.end_date,
            created_at: window.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// The rate in force for one level on a given day.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrentRateResponse {
    /// Level code.
    pub level: LevelCode,
    /// The row in force, if any.
    pub window: Option<RateWindowResponse>,
}

/// API response for a deleted rate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeleteRateResponse {
    /// The deleted row.
    pub rate_id: i64,
    /// The row made open ended again, if any.
    pub reopened_rate_id: Option<i64>,
}

/// Options of a billing computation; also stored as job options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BillingRequest {
    /// Report date for rate lookups; defaults to the day of computation.
    pub as_of_date: Option<NaiveDate>,
    /// Recompute even if the report was edited by hand.
    #[serde(default)]
    pub force: bool,
}

/// API response with a full billing report.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BillingReportResponse {
    /// The report and its children.
    #[serde(flatten)]
    pub detail: BillingReportDetail,
    /// Sum of all monthly totals, in cents.
    pub total_cents: i64,
}

impl From<BillingReportDetail> for BillingReportResponse {
    fn from(detail: BillingReportDetail) -> Self {
        let total_cents: i64 = detail.monthly.iter().map(|m| m.line.total.cents()).sum();
        Self {
            detail,
            total_cents,
        }
    }
}

/// API request to overwrite a payment summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EditSummaryRequest {
    /// Number of classes in the block.
    pub class_count: i32,
    /// Rate sums per level, in cents.
    pub rates: LevelRates,
}

/// API request to overwrite a monthly line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EditMonthlyRequest {
    /// Sessions held in the month.
    pub session_count: i32,
    /// Minutes taught in the month.
    pub total_minutes: i64,
    /// Amount due, in cents.
    pub total_cents: i64,
}
