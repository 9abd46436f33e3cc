// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::json;

use crate::tests::create_test_now;
use crate::{JobData, JobKind, JobState, PersistenceError, SqlitePersistence};

#[test]
fn test_jobs_are_claimed_in_fifo_order() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let first: JobData = persistence
        .enqueue_job(JobKind::Ingest, 1, &json!({}), create_test_now())
        .unwrap();
    let second: JobData = persistence
        .enqueue_job(JobKind::Billing, 1, &json!({"force": true}), create_test_now())
        .unwrap();

    let claimed: JobData = persistence.claim_next_job(create_test_now()).unwrap().unwrap();
    assert_eq!(claimed.job_id, first.job_id);
    assert_eq!(claimed.state, JobState::Running);
    assert_eq!(claimed.attempts, 1);
    assert!(claimed.started_at.is_some());

    let next: JobData = persistence.claim_next_job(create_test_now()).unwrap().unwrap();
    assert_eq!(next.job_id, second.job_id);
    assert_eq!(next.options, json!({"force": true}));

    assert!(persistence.claim_next_job(create_test_now()).unwrap().is_none());
}

#[test]
fn test_complete_and_fail_record_outcome() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let ok: JobData = persistence
        .enqueue_job(JobKind::Ingest, 1, &json!({}), create_test_now())
        .unwrap();
    let bad: JobData = persistence
        .enqueue_job(JobKind::Ingest, 2, &json!({}), create_test_now())
        .unwrap();
    persistence.claim_next_job(create_test_now()).unwrap();
    persistence.claim_next_job(create_test_now()).unwrap();

    persistence.complete_job(ok.job_id, create_test_now()).unwrap();
    persistence
        .fail_job(bad.job_id, "spreadsheet unreadable", create_test_now())
        .unwrap();

    let done: JobData = persistence.get_job(ok.job_id).unwrap().unwrap();
    assert_eq!(done.state, JobState::Done);
    assert!(done.finished_at.is_some());

    let failed: JobData = persistence.get_job(bad.job_id).unwrap().unwrap();
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.last_error.as_deref(), Some("spreadsheet unreadable"));
}

#[test]
fn test_requeued_job_is_claimed_again() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let job: JobData = persistence
        .enqueue_job(JobKind::Billing, 4, &json!({}), create_test_now())
        .unwrap();
    persistence.claim_next_job(create_test_now()).unwrap();

    persistence.requeue_job(job.job_id).unwrap();
    let again: JobData = persistence.claim_next_job(create_test_now()).unwrap().unwrap();

    assert_eq!(again.job_id, job.job_id);
    assert_eq!(again.attempts, 2);
}

#[test]
fn test_jobs_are_listed_per_target() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    persistence
        .enqueue_job(JobKind::Ingest, 1, &json!({}), create_test_now())
        .unwrap();
    persistence
        .enqueue_job(JobKind::Ingest, 2, &json!({}), create_test_now())
        .unwrap();
    persistence
        .enqueue_job(JobKind::Billing, 1, &json!({}), create_test_now())
        .unwrap();

    let ingest: Vec<JobData> = persistence.list_jobs_for_target(JobKind::Ingest, 1).unwrap();
    assert_eq!(ingest.len(), 1);
    assert_eq!(ingest[0].kind, JobKind::Ingest);
}

#[test]
fn test_unknown_job_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    assert!(matches!(
        persistence.complete_job(5, create_test_now()),
        Err(PersistenceError::NotFound(_))
    ));
    assert!(matches!(
        persistence.requeue_job(5),
        Err(PersistenceError::NotFound(_))
    ));
}
