// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Upload registration and the ingestion orchestrator.
//!
//! Registering an upload stores its bytes and creates a new active version
//! for the `(faculty, school, term)` context. Processing reads the stored
//! file, normalizes and validates every row against a catalog snapshot, and
//! writes the rows plus the final status in one transaction.
//!
//! Structural problems (missing file, unreadable content, header not found)
//! fail the whole upload with a human-readable note. Row problems never
//! abort the batch; they are recorded on the row. A strict upload in which
//! no row is usable fails with a JSON [`StrictFailureReport`].

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use loadbill_domain::{
    CatalogSnapshot, FailurePolicy, FileStatus, LoadContext, NormalizedClassRow, ProfessorRecord,
    RawClassRow, ReferenceCatalog, RowTally, RowValidation, StrictFailureReport,
    resolve_professor, validate_row,
};
use loadbill_persistence::{
    ClassRowRecord, IngestionOutcome, LoadFileData, NewLoadFile, SqlitePersistence,
    StoredClassRow,
};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::request_response::{DeleteLoadFileResponse, UploadRequest};
use crate::sheet::{ExtractedSheet, SheetFormat, read_stored_file};

fn io_error(err: &std::io::Error) -> ApiError {
    ApiError::Internal {
        message: format!("Failed to store upload: {err}"),
    }
}

fn load_file_not_found(load_file_id: i64) -> ApiError {
    ApiError::not_found("Load file", format!("Load file {load_file_id} does not exist"))
}

/// Retrieves a load file or reports it missing.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file does not exist.
pub fn get_load_file(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
) -> Result<LoadFileData, ApiError> {
    persistence
        .get_load_file(load_file_id)?
        .ok_or_else(|| load_file_not_found(load_file_id))
}

/// Writes the upload bytes to a unique file under `storage_dir`.
fn store_upload(
    storage_dir: &Path,
    request: &UploadRequest,
    bytes: &[u8],
) -> Result<PathBuf, ApiError> {
    std::fs::create_dir_all(storage_dir).map_err(|e| io_error(&e))?;

    let prefix: String = format!(
        "f{}-s{}-t{}-",
        request.faculty_id, request.school_id, request.term_id
    );
    let suffix: String = Path::new(&request.original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(&suffix)
        .tempfile_in(storage_dir)
        .map_err(|e| io_error(&e))?;
    file.write_all(bytes).map_err(|e| io_error(&e))?;
    let (_, path) = file.keep().map_err(|e| io_error(&e.error))?;
    Ok(path)
}

fn remove_stored(path: &Path) {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), error = %err, "Failed to remove stored upload");
        }
        _ => {}
    }
}

/// Stores an uploaded spreadsheet and registers it as the new active version
/// of its context. The previous active version is superseded.
///
/// # Errors
///
/// - `InvalidInput` if the filename has an unsupported extension or the
///   uploader is blank
/// - `Conflict` if another upload for the same context won the race
/// - `Internal` if the bytes cannot be stored
pub fn register_upload(
    persistence: &mut SqlitePersistence,
    storage_dir: &Path,
    request: &UploadRequest,
    bytes: &[u8],
    now: NaiveDateTime,
) -> Result<LoadFileData, ApiError> {
    SheetFormat::from_filename(&request.original_filename)?;
    if request.uploaded_by.trim().is_empty() {
        return Err(ApiError::invalid(
            "uploaded_by",
            String::from("Uploader must not be blank"),
        ));
    }

    let stored: PathBuf = store_upload(storage_dir, request, bytes)?;
    let new_file: NewLoadFile = NewLoadFile {
        context: request.context(),
        uploaded_by: request.uploaded_by.trim().to_string(),
        original_filename: request.original_filename.clone(),
        storage_path: stored.display().to_string(),
        strict_validation: request.strict_validation,
    };

    match persistence.create_load_file_version(&new_file, now) {
        Ok(file) => {
            info!(
                load_file_id = file.load_file_id,
                context = %file.context,
                version = file.version,
                bytes = bytes.len(),
                "Registered upload"
            );
            Ok(file)
        }
        Err(err) => {
            remove_stored(&stored);
            Err(err.into())
        }
    }
}

/// Normalizes, validates and resolves one extracted row.
///
/// Catalog ids are resolved independently of the validation outcome so a
/// row in error still records what could be matched.
#[must_use]
pub fn evaluate_row(
    raw: &RawClassRow,
    catalog: &CatalogSnapshot,
    strict: bool,
) -> (ClassRowRecord, RowValidation) {
    let (row, changes): (NormalizedClassRow, _) = NormalizedClassRow::from_raw(raw);
    let validation: RowValidation = validate_row(&row, catalog, strict);
    let professor: Option<&ProfessorRecord> =
        resolve_professor(catalog, &row.professor_name).map(|m| m.record());

    let record: ClassRowRecord = ClassRowRecord {
        subject_id: catalog.subject_by_code(&row.subject_code).map(|s| s.subject_id),
        professor_id: professor.map(|p| p.professor_id),
        coordination_id: catalog
            .coordination_by_code(&row.coordination_code)
            .map(|c| c.coordination_id),
        professor_is_bilingual: professor.is_some_and(|p| p.is_bilingual),
        professor_is_doctor: professor.is_some_and(|p| p.is_doctor),
        status: validation.status,
        validation_errors: validation.summary(),
        findings: validation.findings.clone(),
        changes,
        row,
    };
    (record, validation)
}

/// Evaluates every extracted row and derives the upload outcome.
///
/// # Errors
///
/// Returns `Internal` if the strict failure report cannot be serialized.
pub fn evaluate_rows(
    rows: &[RawClassRow],
    catalog: &CatalogSnapshot,
    strict: bool,
) -> Result<(Vec<ClassRowRecord>, IngestionOutcome), ApiError> {
    let mut tally: RowTally = RowTally::default();
    let mut records: Vec<ClassRowRecord> = Vec::with_capacity(rows.len());
    let mut validations: Vec<(i32, RowValidation)> = Vec::with_capacity(rows.len());

    for raw in rows {
        let (record, validation) = evaluate_row(raw, catalog, strict);
        tally.record(record.status);
        if !record.status.is_usable() || !record.findings.is_empty() {
            debug!(
                row = raw.row_number,
                status = %record.status,
                findings = record.findings.len(),
                "Row has findings"
            );
        }
        validations.push((raw.row_number, validation));
        records.push(record);
    }

    let policy: FailurePolicy = FailurePolicy::default();
    let outcome: IngestionOutcome = if policy.is_failed(strict, &tally) {
        let report: StrictFailureReport =
            StrictFailureReport::build(tally, validations.iter().map(|(n, v)| (*n, v)));
        warn!(
            total = tally.total,
            failed = tally.failed,
            "{}",
            report.headline()
        );
        let payload: String = serde_json::to_string(&report).map_err(|e| ApiError::Internal {
            message: format!("Failed to serialize failure report: {e}"),
        })?;
        IngestionOutcome {
            status: FileStatus::Failed,
            tally,
            error_message: Some(payload),
        }
    } else {
        IngestionOutcome {
            status: FileStatus::Completed,
            tally,
            error_message: None,
        }
    };

    Ok((records, outcome))
}

/// Processes a pending upload end to end.
///
/// # Returns
///
/// The load file after processing. A structurally unusable or fully rejected
/// upload is returned with status `failed`; that is not an error.
///
/// # Errors
///
/// - `ResourceNotFound` if the file does not exist
/// - `DomainRuleViolation` if the file is not `pending`
/// - any storage error while writing the result, after the upload has been
///   marked `failed` with a note describing it
pub fn process_upload(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    now: NaiveDateTime,
) -> Result<LoadFileData, ApiError> {
    let file: LoadFileData = get_load_file(persistence, load_file_id)?;
    persistence.transition_load_file(load_file_id, FileStatus::Processing, now)?;
    info!(
        load_file_id,
        context = %file.context,
        strict = file.strict_validation,
        "Processing upload"
    );

    if let Err(err) = ingest_stored_file(persistence, &file, now) {
        error!(load_file_id, error = %err, "Ingestion aborted");
        let note: String = format!("Ingestion aborted: {err}");
        if let Err(fail_err) = persistence.fail_load_file(load_file_id, &note, now) {
            error!(load_file_id, error = %fail_err, "Could not mark upload failed");
        }
        return Err(err);
    }

    get_load_file(persistence, load_file_id)
}

/// Everything that happens while an upload is `processing`.
fn ingest_stored_file(
    persistence: &mut SqlitePersistence,
    file: &LoadFileData,
    now: NaiveDateTime,
) -> Result<(), ApiError> {
    let load_file_id: i64 = file.load_file_id;
    let sheet: ExtractedSheet =
        match read_stored_file(Path::new(&file.storage_path), &file.original_filename) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!(load_file_id, error = %err, "Upload is structurally unusable");
                persistence.fail_load_file(load_file_id, &err.to_string(), now)?;
                return Ok(());
            }
        };
    debug!(
        load_file_id,
        header_row = sheet.header.row_index + 1,
        rows = sheet.rows.len(),
        "Extracted data rows"
    );

    let catalog: CatalogSnapshot = persistence.load_catalog_snapshot()?;
    let (records, outcome) = evaluate_rows(&sheet.rows, &catalog, file.strict_validation)?;
    persistence.finish_load_file(load_file_id, &records, &outcome, now)?;
    Ok(())
}

/// Resets an upload stuck in `processing` back to `pending`.
///
/// # Errors
///
/// Returns `DomainRuleViolation` if the file is not `processing`.
pub fn requeue_upload(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
    now: NaiveDateTime,
) -> Result<LoadFileData, ApiError> {
    get_load_file(persistence, load_file_id)?;
    persistence.transition_load_file(load_file_id, FileStatus::Pending, now)?;
    info!(load_file_id, "Upload returned to pending");
    get_load_file(persistence, load_file_id)
}

/// Deletes a version and its stored bytes.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file does not exist.
pub fn delete_upload(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
) -> Result<DeleteLoadFileResponse, ApiError> {
    let file: LoadFileData = get_load_file(persistence, load_file_id)?;
    let promoted_load_file_id: Option<i64> = persistence.delete_load_file(load_file_id)?;
    remove_stored(Path::new(&file.storage_path));

    Ok(DeleteLoadFileResponse {
        load_file_id,
        promoted_load_file_id,
    })
}

/// Lists every version of a context, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_versions(
    persistence: &mut SqlitePersistence,
    context: LoadContext,
) -> Result<Vec<LoadFileData>, ApiError> {
    Ok(persistence.list_load_file_versions(context)?)
}

/// Retrieves the active version of a context.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the context has no upload.
pub fn get_active_version(
    persistence: &mut SqlitePersistence,
    context: LoadContext,
) -> Result<LoadFileData, ApiError> {
    persistence
        .get_active_load_file(context)?
        .ok_or_else(|| ApiError::not_found("Load file", format!("No active upload for {context}")))
}

/// Lists the stored rows of a load file.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the file does not exist.
pub fn list_rows(
    persistence: &mut SqlitePersistence,
    load_file_id: i64,
) -> Result<Vec<StoredClassRow>, ApiError> {
    get_load_file(persistence, load_file_id)?;
    Ok(persistence.list_class_rows(load_file_id)?)
}
