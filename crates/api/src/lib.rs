// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service layer for the academic load engine.
//!
//! Each function takes the persistence handle explicitly and returns
//! [`ApiError`] at the boundary. The HTTP server and the background worker
//! are thin callers of this crate.

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
#![allow(clippy::multiple_crate_versions)]

mod billing;
mod error;
mod ingestion;
mod jobs;
mod rates;
mod request_response;
mod sheet;

#[cfg(test)]
mod tests;

// ============================================================================
// Errors
// ============================================================================

pub use error::{
    ApiError, translate_domain_error, translate_extract_error, translate_persistence_error,
};

// ============================================================================
// Spreadsheet extraction
// ============================================================================

pub use sheet::{
    ExtractError, ExtractedSheet, HEADER_SCAN_ROWS, HeaderLocation, SheetFormat, extract_rows,
    load_grid, locate_header, read_class_rows, read_stored_file,
};

// ============================================================================
// Ingestion
// ============================================================================

pub use ingestion::{
    delete_upload, evaluate_row, evaluate_rows, get_active_version, get_load_file, list_rows,
    list_versions, process_upload, register_upload, requeue_upload,
};

// ============================================================================
// Rates
// ============================================================================

pub use rates::{correct_rate, current_rates, delete_rate, list_rate_history, raise_rate};

// ============================================================================
// Billing
// ============================================================================

pub use billing::{billable_class, compute_report, edit_monthly, edit_summary, get_report};

// ============================================================================
// Jobs
// ============================================================================

pub use jobs::{
    enqueue_billing, enqueue_ingestion, get_job, requeue_ingestion, run_job, run_next_job,
};

// ============================================================================
// Requests and responses
// ============================================================================

pub use request_response::{
    BillingReportResponse, BillingRequest, CorrectRateRequest, CurrentRateResponse,
    DeleteLoadFileResponse, DeleteRateResponse, EditMonthlyRequest, EditSummaryRequest,
    LoadFileResponse, RaiseRateRequest, RateWindowResponse, UploadRequest,
};
