// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Router test fixtures.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use loadbill_domain::CanonicalField;
use loadbill_persistence::{NewProfessor, SqlitePersistence};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::worker::{WorkerState, drain_queue};
use crate::{AppState, build_router};

/// A router over a seeded in-memory database.
pub struct TestServer {
    pub app_state: AppState,
    pub term_id: i64,
    _storage: TempDir,
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Seeds a two-week term (2026-02-02 to 2026-02-13, Monday the 9th off),
/// coordination `SIS`, subject `MAT101` and professor Luis Gomez.
pub fn create_test_server() -> TestServer {
    let mut persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
    let term_id: i64 = persistence
        .insert_term("2026-Intensivo", date(2026, 2, 2), date(2026, 2, 13))
        .unwrap();
    persistence
        .insert_holiday(date(2026, 2, 9), "Carnaval")
        .unwrap();
    persistence.insert_coordination("SIS", "Sistemas").unwrap();
    persistence.insert_subject("MAT101", "Calculo I").unwrap();
    persistence
        .insert_professor(&NewProfessor {
            professor_code: String::from("P-002"),
            full_name: String::from("Luis Gomez"),
            academic_title: String::from("Ing."),
            is_active: true,
            ..NewProfessor::default()
        })
        .unwrap();

    let storage: TempDir = TempDir::new().unwrap();
    TestServer {
        app_state: AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            storage_dir: Arc::new(PathBuf::from(storage.path())),
            worker: WorkerState::shared(),
        },
        term_id,
        _storage: storage,
    }
}

impl TestServer {
    pub fn router(&self) -> Router {
        build_router(self.app_state.clone())
    }

    /// Runs every queued job.
    pub async fn drain(&self) -> usize {
        drain_queue(&self.app_state.persistence, &self.app_state.worker).await
    }

    pub fn upload_uri(&self, filename: &str, strict: bool) -> String {
        format!(
            "/load_files?faculty_id=1&school_id=10&term_id={}&uploaded_by=coord&original_filename={filename}&strict_validation={strict}",
            self.term_id
        )
    }
}

/// A CSV with the full header and one row per `(section, coordination)`.
pub fn create_test_csv(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut lines: Vec<String> = vec![
        CanonicalField::ALL
            .iter()
            .map(|f| f.header())
            .collect::<Vec<_>>()
            .join(","),
    ];
    for (index, (section, coordination)) in rows.iter().enumerate() {
        let cells: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|field| match field {
                CanonicalField::Sequence => (index + 1).to_string(),
                CanonicalField::CoordinationCode => (*coordination).to_string(),
                CanonicalField::SubjectCode => String::from("MAT101"),
                CanonicalField::SubjectName => String::from("Calculo I"),
                CanonicalField::Section => (*section).to_string(),
                CanonicalField::Duration => String::from("120"),
                CanonicalField::Schedule => String::from("07:00-09:00"),
                CanonicalField::Days => String::from("Lu-Mi"),
                CanonicalField::Title => String::from("Ing."),
                CanonicalField::ProfessorName => String::from("Luis Gomez"),
                CanonicalField::ProfessorCode => String::from("P-002"),
                CanonicalField::MastersCount => String::from("0"),
                _ => String::new(),
            })
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n").into_bytes()
}

/// Sends a request and decodes the JSON body (`Null` when not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status: StatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
    (status, value)
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    json: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(
        app,
        method,
        uri,
        Body::from(serde_json::to_string(json).unwrap()),
        Some("application/json"),
    )
    .await
}

pub async fn send_empty(app: &Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, method, uri, Body::empty(), None).await
}
