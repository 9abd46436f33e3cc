// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use loadbill_domain::{DomainError, FileStatus, LoadContext, RowTally, ValidationStatus};

use crate::tests::{
    create_test_class_row, create_test_now, create_test_persistence, create_test_upload,
};
use crate::{
    ClassRowRecord, IngestionOutcome, LoadFileData, PersistenceError, SqlitePersistence,
    StoredClassRow,
};

fn start_processing(persistence: &mut SqlitePersistence, load_file_id: i64) {
    persistence
        .transition_load_file(load_file_id, FileStatus::Processing, create_test_now())
        .unwrap();
}

fn completed_outcome(rows: &[ClassRowRecord]) -> IngestionOutcome {
    let warnings: i32 = i32::try_from(
        rows.iter()
            .filter(|r| r.status == ValidationStatus::Warning)
            .count(),
    )
    .unwrap();
    let total: i32 = i32::try_from(rows.len()).unwrap();
    IngestionOutcome {
        status: FileStatus::Completed,
        tally: RowTally {
            total,
            inserted: total,
            failed: 0,
            warnings,
        },
        error_message: None,
    }
}

#[test]
fn test_first_upload_is_version_one_and_active() {
    let (mut persistence, term_id) = create_test_persistence();

    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "carga.xlsx"), create_test_now())
        .unwrap();

    assert_eq!(file.version, 1);
    assert!(file.is_active);
    assert_eq!(file.status, FileStatus::Pending);
    assert!(file.superseded_at.is_none());
    assert!(file.superseded_by.is_none());
    assert_eq!(file.created_at, "2026-01-10 09:30:00");
}

#[test]
fn test_reupload_supersedes_previous_version() {
    let (mut persistence, term_id) = create_test_persistence();
    let first: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();

    let second: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v2.xlsx"), create_test_now())
        .unwrap();

    assert_eq!(second.version, 2);
    assert!(second.is_active);

    let previous: LoadFileData = persistence
        .get_load_file(first.load_file_id)
        .unwrap()
        .unwrap();
    assert!(!previous.is_active);
    assert_eq!(previous.superseded_by, Some(second.load_file_id));
    assert!(previous.superseded_at.is_some());

    let active: LoadFileData = persistence
        .get_active_load_file(second.context)
        .unwrap()
        .unwrap();
    assert_eq!(active.load_file_id, second.load_file_id);
}

#[test]
fn test_contexts_are_versioned_independently() {
    let (mut persistence, term_id) = create_test_persistence();
    persistence
        .create_load_file_version(&create_test_upload(term_id, "a.xlsx"), create_test_now())
        .unwrap();

    let mut other = create_test_upload(term_id, "b.xlsx");
    other.context = LoadContext::new(1, 11, term_id);
    let file: LoadFileData = persistence
        .create_load_file_version(&other, create_test_now())
        .unwrap();

    assert_eq!(file.version, 1);
    assert!(file.is_active);
}

#[test]
fn test_exactly_one_active_version_after_many_uploads() {
    let (mut persistence, term_id) = create_test_persistence();
    for n in 0..5 {
        persistence
            .create_load_file_version(
                &create_test_upload(term_id, &format!("v{n}.xlsx")),
                create_test_now(),
            )
            .unwrap();
    }

    let versions: Vec<LoadFileData> = persistence
        .list_load_file_versions(LoadContext::new(1, 10, term_id))
        .unwrap();

    assert_eq!(versions.len(), 5);
    assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);
    assert_eq!(versions[0].version, 5);
    assert!(versions[0].is_active);
}

#[test]
fn test_upload_for_unknown_term_fails() {
    let (mut persistence, term_id) = create_test_persistence();
    let result = persistence
        .create_load_file_version(&create_test_upload(term_id + 50, "x.xlsx"), create_test_now());
    assert!(result.is_err());
}

#[test]
fn test_status_lifecycle_is_enforced() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();

    let skipped = persistence.transition_load_file(
        file.load_file_id,
        FileStatus::Completed,
        create_test_now(),
    );
    assert!(matches!(
        skipped,
        Err(PersistenceError::Domain(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));

    start_processing(&mut persistence, file.load_file_id);
    let reloaded: LoadFileData = persistence
        .get_load_file(file.load_file_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, FileStatus::Processing);
    assert!(reloaded.processed_at.is_none());
}

#[test]
fn test_finish_stores_rows_and_counters() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    start_processing(&mut persistence, file.load_file_id);

    let rows: Vec<ClassRowRecord> = vec![
        create_test_class_row(7, ValidationStatus::Valid),
        create_test_class_row(8, ValidationStatus::Warning),
        create_test_class_row(9, ValidationStatus::Valid),
    ];
    persistence
        .finish_load_file(
            file.load_file_id,
            &rows,
            &completed_outcome(&rows),
            create_test_now(),
        )
        .unwrap();

    let stored: Vec<StoredClassRow> = persistence.list_class_rows(file.load_file_id).unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(
        stored.iter().map(|r| r.record.row.row_number).collect::<Vec<_>>(),
        vec![7, 8, 9]
    );
    assert_eq!(stored[1].record, rows[1]);

    let finished: LoadFileData = persistence
        .get_load_file(file.load_file_id)
        .unwrap()
        .unwrap();
    assert_eq!(finished.status, FileStatus::Completed);
    assert_eq!(finished.tally.total, 3);
    assert_eq!(finished.tally.warnings, 1);
    assert!(finished.processed_at.is_some());
}

#[test]
fn test_finish_stores_large_uploads_in_batches() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "big.xlsx"), create_test_now())
        .unwrap();
    start_processing(&mut persistence, file.load_file_id);

    let rows: Vec<ClassRowRecord> = (2..=451)
        .map(|n| create_test_class_row(n, ValidationStatus::Valid))
        .collect();
    persistence
        .finish_load_file(
            file.load_file_id,
            &rows,
            &completed_outcome(&rows),
            create_test_now(),
        )
        .unwrap();

    assert_eq!(persistence.count_class_rows(file.load_file_id).unwrap(), 450);
}

#[test]
fn test_completed_file_cannot_be_finished_again() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    start_processing(&mut persistence, file.load_file_id);

    let rows: Vec<ClassRowRecord> = vec![
        create_test_class_row(2, ValidationStatus::Valid),
        create_test_class_row(3, ValidationStatus::Valid),
    ];
    persistence
        .finish_load_file(
            file.load_file_id,
            &rows,
            &completed_outcome(&rows),
            create_test_now(),
        )
        .unwrap();

    // A completed file cannot be finished again
    let again = persistence.finish_load_file(
        file.load_file_id,
        &rows,
        &completed_outcome(&rows),
        create_test_now(),
    );
    assert!(again.is_err());
    assert_eq!(persistence.count_class_rows(file.load_file_id).unwrap(), 2);
}

#[test]
fn test_failed_upload_stores_no_rows() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    start_processing(&mut persistence, file.load_file_id);

    persistence
        .fail_load_file(
            file.load_file_id,
            "Missing required columns: HORARIO",
            create_test_now(),
        )
        .unwrap();

    let failed: LoadFileData = persistence
        .get_load_file(file.load_file_id)
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, FileStatus::Failed);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("Missing required columns: HORARIO")
    );
    assert_eq!(persistence.count_class_rows(file.load_file_id).unwrap(), 0);
    // A failed version stays the active one
    assert!(failed.is_active);
}

#[test]
fn test_deleting_active_version_promotes_previous() {
    let (mut persistence, term_id) = create_test_persistence();
    let first: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    let second: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v2.xlsx"), create_test_now())
        .unwrap();

    let promoted: Option<i64> = persistence.delete_load_file(second.load_file_id).unwrap();

    assert_eq!(promoted, Some(first.load_file_id));
    let restored: LoadFileData = persistence
        .get_load_file(first.load_file_id)
        .unwrap()
        .unwrap();
    assert!(restored.is_active);
    assert!(restored.superseded_by.is_none());
    assert!(restored.superseded_at.is_none());
    assert!(persistence.get_load_file(second.load_file_id).unwrap().is_none());
}

#[test]
fn test_deleting_superseded_version_keeps_active() {
    let (mut persistence, term_id) = create_test_persistence();
    let first: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    let second: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v2.xlsx"), create_test_now())
        .unwrap();

    let promoted: Option<i64> = persistence.delete_load_file(first.load_file_id).unwrap();

    assert!(promoted.is_none());
    let active: LoadFileData = persistence
        .get_active_load_file(second.context)
        .unwrap()
        .unwrap();
    assert_eq!(active.load_file_id, second.load_file_id);
}

#[test]
fn test_deleting_version_cascades_rows() {
    let (mut persistence, term_id) = create_test_persistence();
    let file: LoadFileData = persistence
        .create_load_file_version(&create_test_upload(term_id, "v1.xlsx"), create_test_now())
        .unwrap();
    start_processing(&mut persistence, file.load_file_id);
    let rows: Vec<ClassRowRecord> = vec![create_test_class_row(2, ValidationStatus::Valid)];
    persistence
        .finish_load_file(
            file.load_file_id,
            &rows,
            &completed_outcome(&rows),
            create_test_now(),
        )
        .unwrap();

    persistence.delete_load_file(file.load_file_id).unwrap();

    assert_eq!(persistence.count_class_rows(file.load_file_id).unwrap(), 0);
}

#[test]
fn test_deleting_missing_version_is_not_found() {
    let (mut persistence, _) = create_test_persistence();
    assert!(matches!(
        persistence.delete_load_file(42),
        Err(PersistenceError::NotFound(_))
    ));
}
