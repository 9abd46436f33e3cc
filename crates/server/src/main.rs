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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod worker;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use loadbill_api::{
    ApiError, BillingReportResponse, BillingRequest, CorrectRateRequest, CurrentRateResponse,
    DeleteLoadFileResponse, DeleteRateResponse, EditMonthlyRequest, EditSummaryRequest,
    LoadFileResponse, RaiseRateRequest, RateWindowResponse, UploadRequest, correct_rate,
    current_rates, delete_rate, delete_upload, edit_monthly, edit_summary, enqueue_billing,
    enqueue_ingestion, get_active_version, get_job, get_load_file, get_report,
    list_rate_history, list_rows, list_versions, raise_rate, register_upload, requeue_ingestion,
};
use loadbill_domain::LoadContext;
use loadbill_persistence::{JobData, LoadFileData, SqlitePersistence, StoredClassRow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};
use worker::{WorkerState, WorkerStatus, run_worker};

/// Load Bill Server - spreadsheet ingestion and billing for academic loads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "LOADBILL_DATABASE")]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "LOADBILL_PORT", default_value_t = 3000)]
    port: u16,

    /// Directory where uploaded spreadsheets are kept
    #[arg(short, long, env = "LOADBILL_STORAGE_DIR", default_value = "uploads")]
    storage_dir: PathBuf,

    /// How often the job worker polls the queue, in milliseconds
    #[arg(long, env = "LOADBILL_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<SqlitePersistence>>,
    /// Where upload bytes are stored.
    storage_dir: Arc<PathBuf>,
    /// Counters of the background worker.
    worker: Arc<WorkerState>,
}

/// Query parameters naming a faculty/school/term context.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
struct ContextQuery {
    /// The faculty.
    faculty_id: i64,
    /// The school within the faculty.
    school_id: i64,
    /// The academic term.
    term_id: i64,
}

impl From<ContextQuery> for LoadContext {
    fn from(query: ContextQuery) -> Self {
        Self::new(query.faculty_id, query.school_id, query.term_id)
    }
}

/// Query parameters for the current-rates endpoint.
#[derive(Debug, Deserialize)]
struct CurrentRatesQuery {
    /// Day to look up; defaults to today.
    date: Option<NaiveDate>,
}

/// API response for an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UploadAcceptedResponse {
    /// The registered version, still pending.
    load_file: LoadFileResponse,
    /// The queued ingestion job.
    job: JobData,
}

/// API response for write operations without a body of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WriteResponse {
    /// Success indicator.
    success: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// Whether repeating the request can succeed.
    retryable: bool,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    /// Whether repeating the request can succeed.
    retryable: bool,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            retryable: self.retryable,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let retryable: bool = err.is_retryable();
        let status: StatusCode = match err {
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
            retryable,
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

// ============================================================================
// Load files
// ============================================================================

/// Handler for POST `/load_files` endpoint.
///
/// Stores the request body as a new version of the context named in the
/// query string and queues its ingestion.
async fn handle_upload(
    AxumState(app_state): AxumState<AppState>,
    Query(req): Query<UploadRequest>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadAcceptedResponse>), HttpError> {
    info!(
        context = %req.context(),
        filename = %req.original_filename,
        strict = req.strict_validation,
        bytes = body.len(),
        "Handling upload request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let file: LoadFileData = register_upload(
        &mut persistence,
        &app_state.storage_dir,
        &req,
        &body,
        now(),
    )?;
    let job: JobData = enqueue_ingestion(&mut persistence, file.load_file_id, now())?;
    drop(persistence);

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAcceptedResponse {
            load_file: LoadFileResponse::from(file),
            job,
        }),
    ))
}

/// Handler for GET `/load_files` endpoint.
///
/// Lists every version of a context, newest first.
async fn handle_list_versions(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<Vec<LoadFileResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let versions: Vec<LoadFileData> = list_versions(&mut persistence, query.into())?;
    drop(persistence);

    Ok(Json(
        versions.into_iter().map(LoadFileResponse::from).collect(),
    ))
}

/// Handler for GET `/load_files/active` endpoint.
async fn handle_get_active_version(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<LoadFileResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let file: LoadFileData = get_active_version(&mut persistence, query.into())?;
    drop(persistence);

    Ok(Json(LoadFileResponse::from(file)))
}

/// Handler for GET `/load_files/{load_file_id}` endpoint.
async fn handle_get_load_file(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
) -> Result<Json<LoadFileResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let file: LoadFileData = get_load_file(&mut persistence, load_file_id)?;
    drop(persistence);

    Ok(Json(LoadFileResponse::from(file)))
}

/// Handler for DELETE `/load_files/{load_file_id}` endpoint.
async fn handle_delete_load_file(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
) -> Result<Json<DeleteLoadFileResponse>, HttpError> {
    info!(load_file_id, "Handling delete load file request");

    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteLoadFileResponse = delete_upload(&mut persistence, load_file_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/load_files/{load_file_id}/requeue` endpoint.
///
/// Returns a file stuck in `processing` to `pending` and requeues its
/// interrupted ingestion job.
async fn handle_requeue_load_file(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
) -> Result<(StatusCode, Json<JobData>), HttpError> {
    info!(load_file_id, "Handling requeue request");

    let mut persistence = app_state.persistence.lock().await;
    let job: JobData = requeue_ingestion(&mut persistence, load_file_id, now())?;
    drop(persistence);

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// Handler for GET `/load_files/{load_file_id}/rows` endpoint.
async fn handle_list_rows(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
) -> Result<Json<Vec<StoredClassRow>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let rows: Vec<StoredClassRow> = list_rows(&mut persistence, load_file_id)?;
    drop(persistence);

    Ok(Json(rows))
}

// ============================================================================
// Billing
// ============================================================================

/// Handler for POST `/load_files/{load_file_id}/billing` endpoint.
///
/// Queues a billing computation.
async fn handle_enqueue_billing(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
    Json(req): Json<BillingRequest>,
) -> Result<(StatusCode, Json<JobData>), HttpError> {
    info!(
        load_file_id,
        as_of = ?req.as_of_date,
        force = req.force,
        "Handling billing request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let job: JobData = enqueue_billing(&mut persistence, load_file_id, &req, now())?;
    drop(persistence);

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// Handler for GET `/load_files/{load_file_id}/billing` endpoint.
async fn handle_get_report(
    AxumState(app_state): AxumState<AppState>,
    Path(load_file_id): Path<i64>,
) -> Result<Json<BillingReportResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let report: BillingReportResponse = get_report(&mut persistence, load_file_id)?;
    drop(persistence);

    Ok(Json(report))
}

/// Handler for PUT `/billing/summaries/{payment_summary_id}` endpoint.
async fn handle_edit_summary(
    AxumState(app_state): AxumState<AppState>,
    Path(payment_summary_id): Path<i64>,
    Json(req): Json<EditSummaryRequest>,
) -> Result<Json<WriteResponse>, HttpError> {
    info!(payment_summary_id, "Handling edit summary request");

    let mut persistence = app_state.persistence.lock().await;
    edit_summary(&mut persistence, payment_summary_id, &req)?;
    drop(persistence);

    Ok(Json(WriteResponse {
        success: true,
        message: Some(format!("Updated payment summary {payment_summary_id}")),
    }))
}

/// Handler for PUT `/billing/monthly/{monthly_item_id}` endpoint.
async fn handle_edit_monthly(
    AxumState(app_state): AxumState<AppState>,
    Path(monthly_item_id): Path<i64>,
    Json(req): Json<EditMonthlyRequest>,
) -> Result<Json<WriteResponse>, HttpError> {
    info!(monthly_item_id, "Handling edit monthly item request");

    let mut persistence = app_state.persistence.lock().await;
    edit_monthly(&mut persistence, monthly_item_id, &req)?;
    drop(persistence);

    Ok(Json(WriteResponse {
        success: true,
        message: Some(format!("Updated monthly item {monthly_item_id}")),
    }))
}

// ============================================================================
// Rates
// ============================================================================

/// Handler for POST `/rates` endpoint.
async fn handle_raise_rate(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RaiseRateRequest>,
) -> Result<(StatusCode, Json<RateWindowResponse>), HttpError> {
    info!(
        level = %req.level,
        start_date = %req.start_date,
        created_by = %req.created_by,
        "Handling raise rate request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let window: RateWindowResponse = raise_rate(&mut persistence, &req, now())?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(window)))
}

/// Handler for PUT `/rates/{rate_id}` endpoint.
async fn handle_correct_rate(
    AxumState(app_state): AxumState<AppState>,
    Path(rate_id): Path<i64>,
    Json(req): Json<CorrectRateRequest>,
) -> Result<Json<RateWindowResponse>, HttpError> {
    info!(rate_id, "Handling correct rate request");

    let mut persistence = app_state.persistence.lock().await;
    let window: RateWindowResponse = correct_rate(&mut persistence, rate_id, &req)?;
    drop(persistence);

    Ok(Json(window))
}

/// Handler for DELETE `/rates/{rate_id}` endpoint.
async fn handle_delete_rate(
    AxumState(app_state): AxumState<AppState>,
    Path(rate_id): Path<i64>,
) -> Result<Json<DeleteRateResponse>, HttpError> {
    info!(rate_id, "Handling delete rate request");

    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteRateResponse = delete_rate(&mut persistence, rate_id, now())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/rates/current` endpoint.
async fn handle_current_rates(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<CurrentRatesQuery>,
) -> Result<Json<Vec<CurrentRateResponse>>, HttpError> {
    let date: NaiveDate = query.date.unwrap_or_else(|| now().date());

    let mut persistence = app_state.persistence.lock().await;
    let rates: Vec<CurrentRateResponse> = current_rates(&mut persistence, date)?;
    drop(persistence);

    Ok(Json(rates))
}

/// Handler for GET `/levels/{level}/rates` endpoint.
async fn handle_rate_history(
    AxumState(app_state): AxumState<AppState>,
    Path(level): Path<String>,
) -> Result<Json<Vec<RateWindowResponse>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let history: Vec<RateWindowResponse> = list_rate_history(&mut persistence, &level)?;
    drop(persistence);

    Ok(Json(history))
}

// ============================================================================
// Jobs
// ============================================================================

/// Handler for GET `/jobs/{job_id}` endpoint.
async fn handle_get_job(
    AxumState(app_state): AxumState<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobData>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let job: JobData = get_job(&mut persistence, job_id)?;
    drop(persistence);

    Ok(Json(job))
}

/// Handler for GET `/worker` endpoint.
#[allow(clippy::unused_async)]
async fn handle_worker_status(AxumState(app_state): AxumState<AppState>) -> Json<WorkerStatus> {
    Json(app_state.worker.status())
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/load_files", post(handle_upload).get(handle_list_versions))
        .route("/load_files/active", get(handle_get_active_version))
        .route(
            "/load_files/{load_file_id}",
            get(handle_get_load_file).delete(handle_delete_load_file),
        )
        .route(
            "/load_files/{load_file_id}/requeue",
            post(handle_requeue_load_file),
        )
        .route("/load_files/{load_file_id}/rows", get(handle_list_rows))
        .route(
            "/load_files/{load_file_id}/billing",
            post(handle_enqueue_billing).get(handle_get_report),
        )
        .route(
            "/billing/summaries/{payment_summary_id}",
            put(handle_edit_summary),
        )
        .route("/billing/monthly/{monthly_item_id}", put(handle_edit_monthly))
        .route("/rates", post(handle_raise_rate))
        .route("/rates/current", get(handle_current_rates))
        .route(
            "/rates/{rate_id}",
            put(handle_correct_rate).delete(handle_delete_rate),
        )
        .route("/levels/{level}/rates", get(handle_rate_history))
        .route("/jobs/{job_id}", get(handle_get_job))
        .route("/worker", get(handle_worker_status))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Load Bill Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: SqlitePersistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        SqlitePersistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        SqlitePersistence::new_in_memory()?
    };

    std::fs::create_dir_all(&args.storage_dir)?;
    info!("Storing uploads in: {}", args.storage_dir.display());

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        storage_dir: Arc::new(args.storage_dir),
        worker: WorkerState::shared(),
    };

    // Start the job worker
    tokio::spawn(run_worker(
        Arc::clone(&app_state.persistence),
        Arc::clone(&app_state.worker),
        Duration::from_millis(args.poll_interval_ms),
    ));

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
