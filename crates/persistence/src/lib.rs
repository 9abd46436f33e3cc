// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for academic load ingestion and billing.
//!
//! This crate stores uploaded load files and their ingested rows, the
//! reference catalogs used to validate them, the hourly rate history, billing
//! reports and the background work queue. It is built on Diesel over `SQLite`.
//!
//! ## Storage conventions
//!
//! - Dates are `YYYY-MM-DD` text, timestamps `YYYY-MM-DD HH:MM:SS` text
//! - Booleans are `0`/`1` integers
//! - Money is stored as integer cents
//!
//! ## Concurrency
//!
//! Writes that must see a consistent view (version creation, rate changes,
//! report recomputation, job claims) run in `BEGIN IMMEDIATE` transactions.
//! A writer that loses a race surfaces `PersistenceError::ConcurrencyConflict`,
//! which callers may retry.
//!
//! ## Testing
//!
//! Tests run against isolated shared in-memory databases created with
//! [`Persistence::new_in_memory`].

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

use chrono::{NaiveDate, NaiveDateTime};
use diesel::SqliteConnection;
use loadbill_domain::{
    BillingComputation, CatalogSnapshot, DeletionPlan, FileStatus, LevelCode, LevelRates,
    LoadContext, Money, RateCorrection, RateTable, RateWindow,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod conversions;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    AcademicLevelData, BillingReportData, BillingReportDetail, ClassRowRecord, JobData, JobKind,
    JobState, LoadFileData, MonthlyItemData, NewLoadFile, NewProfessor, PaymentSummaryData,
    RateSnapshotData, StoredClassRow, TermData,
};
pub use error::PersistenceError;
pub use mutations::IngestionOutcome;

use backend::PersistenceBackend;

/// Type alias kept for call sites that name the backend explicitly.
pub type SqlitePersistence = Persistence;

/// Persistence adapter owning one `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared in-memory database, so tests are
    /// isolated from each other.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Catalogs
    // ========================================================================

    /// Loads every catalog into memory for one ingestion run.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn load_catalog_snapshot(&mut self) -> Result<CatalogSnapshot, PersistenceError> {
        queries::catalog::load_catalog_snapshot(&mut self.conn)
    }

    /// Retrieves a term by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_term(&mut self, term_id: i64) -> Result<Option<TermData>, PersistenceError> {
        queries::catalog::get_term(&mut self.conn, term_id)
    }

    /// Lists holiday dates within `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_holidays_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, PersistenceError> {
        queries::catalog::list_holidays_between(&mut self.conn, start, end)
    }

    /// Lists academic levels by priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_academic_levels(&mut self) -> Result<Vec<AcademicLevelData>, PersistenceError> {
        queries::catalog::list_academic_levels(&mut self.conn)
    }

    /// Adds a coordination.
    ///
    /// # Errors
    ///
    /// Returns an error if the code exists or the insert fails.
    pub fn insert_coordination(&mut self, code: &str, name: &str) -> Result<i64, PersistenceError> {
        mutations::catalog::insert_coordination(&mut self.conn, code, name)
    }

    /// Adds a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if a live subject uses the code or the insert fails.
    pub fn insert_subject(&mut self, code: &str, name: &str) -> Result<i64, PersistenceError> {
        mutations::catalog::insert_subject(&mut self.conn, code, name)
    }

    /// Soft-deletes a subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject does not exist.
    pub fn soft_delete_subject(
        &mut self,
        subject_id: i64,
        now: NaiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::catalog::soft_delete_subject(&mut self.conn, subject_id, now)
    }

    /// Adds a professor.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_professor(&mut self, professor: &NewProfessor) -> Result<i64, PersistenceError> {
        mutations::catalog::insert_professor(&mut self.conn, professor)
    }

    /// Adds an academic term.
    ///
    /// # Errors
    ///
    /// Returns an error if the dates are inverted or the insert fails.
    pub fn insert_term(
        &mut self,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<i64, PersistenceError> {
        mutations::catalog::insert_term(&mut self.conn, name, start_date, end_date)
    }

    /// Adds a holiday.
    ///
    /// # Errors
    ///
    /// Returns an error if the date is already a holiday.
    pub fn insert_holiday(
        &mut self,
        date: NaiveDate,
        description: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::catalog::insert_holiday(&mut self.conn, date, description)
    }

    // ========================================================================
    // Load files
    // ========================================================================

    /// Registers an upload as the new active version of its context.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrencyConflict` if another upload for the same context
    /// was stored concurrently.
    pub fn create_load_file_version(
        &mut self,
        new_file: &NewLoadFile,
        now: NaiveDateTime,
    ) -> Result<LoadFileData, PersistenceError> {
        mutations::load_files::create_load_file_version(&mut self.conn, new_file, now)
    }

    /// Retrieves a load file version.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_load_file(
        &mut self,
        load_file_id: i64,
    ) -> Result<Option<LoadFileData>, PersistenceError> {
        queries::load_files::get_load_file(&mut self.conn, load_file_id)
    }

    /// Retrieves the active version of a context.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_active_load_file(
        &mut self,
        context: LoadContext,
    ) -> Result<Option<LoadFileData>, PersistenceError> {
        queries::load_files::get_active_load_file(&mut self.conn, context)
    }

    /// Lists every version of a context, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_load_file_versions(
        &mut self,
        context: LoadContext,
    ) -> Result<Vec<LoadFileData>, PersistenceError> {
        queries::load_files::list_load_file_versions(&mut self.conn, context)
    }

    /// Moves a load file to a new status.
    ///
    /// # Errors
    ///
    /// Returns `Domain(InvalidStatusTransition)` if the move is not allowed.
    pub fn transition_load_file(
        &mut self,
        load_file_id: i64,
        target: FileStatus,
        now: NaiveDateTime,
    ) -> Result<FileStatus, PersistenceError> {
        mutations::load_files::transition_load_file(&mut self.conn, load_file_id, target, now)
    }

    /// Stores processed rows and the final status of an upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not processing or a write fails.
    pub fn finish_load_file(
        &mut self,
        load_file_id: i64,
        rows: &[ClassRowRecord],
        outcome: &IngestionOutcome,
        now: NaiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::load_files::finish_load_file(&mut self.conn, load_file_id, rows, outcome, now)
    }

    /// Marks an upload failed without storing rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not processing.
    pub fn fail_load_file(
        &mut self,
        load_file_id: i64,
        note: &str,
        now: NaiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::load_files::fail_load_file(&mut self.conn, load_file_id, note, now)
    }

    /// Deletes a version, promoting the newest remaining one if needed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist.
    pub fn delete_load_file(&mut self, load_file_id: i64) -> Result<Option<i64>, PersistenceError> {
        mutations::load_files::delete_load_file(&mut self.conn, load_file_id)
    }

    /// Lists the stored rows of a load file in spreadsheet order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn list_class_rows(
        &mut self,
        load_file_id: i64,
    ) -> Result<Vec<StoredClassRow>, PersistenceError> {
        queries::class_rows::list_class_rows(&mut self.conn, load_file_id)
    }

    /// Counts the stored rows of a load file.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_class_rows(&mut self, load_file_id: i64) -> Result<i64, PersistenceError> {
        queries::class_rows::count_class_rows(&mut self.conn, load_file_id)
    }

    // ========================================================================
    // Hourly rates
    // ========================================================================

    /// Loads every level's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_rate_table(&mut self) -> Result<RateTable, PersistenceError> {
        queries::rates::load_rate_table(&mut self.conn)
    }

    /// Loads one level's history ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the level is not configured.
    pub fn load_level_history(
        &mut self,
        level: LevelCode,
    ) -> Result<Vec<RateWindow>, PersistenceError> {
        let level_id: i64 = queries::catalog::lookup_level_id(&mut self.conn, level)?;
        queries::rates::load_level_history(&mut self.conn, level_id)
    }

    /// Starts a new open-ended rate for a level.
    ///
    /// # Errors
    ///
    /// Returns `Domain` if a history rule would break.
    pub fn raise_rate(
        &mut self,
        level: LevelCode,
        rate: Money,
        start_date: NaiveDate,
        created_by: &str,
        now: NaiveDateTime,
    ) -> Result<RateWindow, PersistenceError> {
        mutations::rates::raise_rate(&mut self.conn, level, rate, start_date, created_by, now)
    }

    /// Corrects an existing rate row.
    ///
    /// # Errors
    ///
    /// Returns `Domain` if the row is missing or a history rule would break.
    pub fn correct_rate(
        &mut self,
        rate_id: i64,
        correction: RateCorrection,
    ) -> Result<RateWindow, PersistenceError> {
        mutations::rates::correct_rate(&mut self.conn, rate_id, correction)
    }

    /// Deletes a recently created rate row.
    ///
    /// # Errors
    ///
    /// Returns `Domain` if the row is missing or too old.
    pub fn delete_rate(
        &mut self,
        rate_id: i64,
        now: NaiveDateTime,
    ) -> Result<DeletionPlan, PersistenceError> {
        mutations::rates::delete_rate(&mut self.conn, rate_id, now)
    }

    // ========================================================================
    // Billing
    // ========================================================================

    /// Stores or recomputes the billing report of a load file.
    ///
    /// # Errors
    ///
    /// Returns `Domain(ReportEdited)` if the report was edited and `force` is false.
    pub fn store_billing_report(
        &mut self,
        load_file_id: i64,
        as_of_date: NaiveDate,
        computation: &BillingComputation,
        force: bool,
        now: NaiveDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::billing::store_billing_report(
            &mut self.conn,
            load_file_id,
            as_of_date,
            computation,
            force,
            now,
        )
    }

    /// Retrieves the report header of a load file.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_report_for_file(
        &mut self,
        load_file_id: i64,
    ) -> Result<Option<BillingReportData>, PersistenceError> {
        queries::billing::get_report_for_file(&mut self.conn, load_file_id)
    }

    /// Retrieves a report with all of its children.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the report does not exist.
    pub fn get_report_detail(
        &mut self,
        report_id: i64,
    ) -> Result<BillingReportDetail, PersistenceError> {
        queries::billing::get_report_detail(&mut self.conn, report_id)
    }

    /// Overwrites a payment summary line by hand.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    pub fn edit_payment_summary(
        &mut self,
        payment_summary_id: i64,
        class_count: i32,
        rates: LevelRates,
    ) -> Result<(), PersistenceError> {
        mutations::billing::edit_payment_summary(
            &mut self.conn,
            payment_summary_id,
            class_count,
            rates,
        )
    }

    /// Overwrites a monthly line by hand.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    pub fn edit_monthly_item(
        &mut self,
        monthly_item_id: i64,
        session_count: i32,
        total_minutes: i64,
        total: Money,
    ) -> Result<(), PersistenceError> {
        mutations::billing::edit_monthly_item(
            &mut self.conn,
            monthly_item_id,
            session_count,
            total_minutes,
            total,
        )
    }

    // ========================================================================
    // Work queue
    // ========================================================================

    /// Adds a job to the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn enqueue_job(
        &mut self,
        kind: JobKind,
        target_id: i64,
        options: &serde_json::Value,
        now: NaiveDateTime,
    ) -> Result<JobData, PersistenceError> {
        mutations::jobs::enqueue_job(&mut self.conn, kind, target_id, options, now)
    }

    /// Claims the oldest queued job.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub fn claim_next_job(&mut self, now: NaiveDateTime) -> Result<Option<JobData>, PersistenceError> {
        mutations::jobs::claim_next_job(&mut self.conn, now)
    }

    /// Marks a job done.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job does not exist.
    pub fn complete_job(&mut self, job_id: i64, now: NaiveDateTime) -> Result<(), PersistenceError> {
        mutations::jobs::complete_job(&mut self.conn, job_id, now)
    }

    /// Marks a job failed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job does not exist.
    pub fn fail_job(
        &mut self,
        job_id: i64,
        error: &str,
        now: NaiveDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::jobs::fail_job(&mut self.conn, job_id, error, now)
    }

    /// Puts a job back in the queue.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job does not exist.
    pub fn requeue_job(&mut self, job_id: i64) -> Result<(), PersistenceError> {
        mutations::jobs::requeue_job(&mut self.conn, job_id)
    }

    /// Retrieves a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_job(&mut self, job_id: i64) -> Result<Option<JobData>, PersistenceError> {
        queries::jobs::get_job(&mut self.conn, job_id)
    }

    /// Lists jobs of one kind for a load file, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_jobs_for_target(
        &mut self,
        kind: JobKind,
        target_id: i64,
    ) -> Result<Vec<JobData>, PersistenceError> {
        queries::jobs::list_jobs_for_target(&mut self.conn, kind, target_id)
    }
}
