// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Two connections writing to one database file.

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use loadbill_domain::{LevelCode, LoadContext, Money};
use tempfile::TempDir;

use crate::backend::sqlite::is_write_conflict;
use crate::diesel_schema::{hourly_rate_history, load_files};
use crate::mutations::load_files::conflict_aware;
use crate::mutations::rates::rate_conflict;
use crate::queries::catalog::lookup_level_id;
use crate::tests::{create_test_date, create_test_now, create_test_upload};
use crate::{LoadFileData, PersistenceError, SqlitePersistence};

/// Two handles on the same file, the first seeded with one term.
fn open_pair(dir: &TempDir) -> (SqlitePersistence, SqlitePersistence, i64) {
    let path = dir.path().join("loadbill.db");
    let mut first: SqlitePersistence = SqlitePersistence::new_with_file(&path).unwrap();
    let term_id: i64 = first
        .insert_term(
            "2026-I",
            create_test_date(2026, 1, 5),
            create_test_date(2026, 5, 29),
        )
        .unwrap();
    let mut second: SqlitePersistence = SqlitePersistence::new_with_file(&path).unwrap();
    diesel::sql_query("PRAGMA busy_timeout = 50")
        .execute(&mut second.conn)
        .unwrap();
    (first, second, term_id)
}

fn hold_write_lock(persistence: &mut SqlitePersistence) {
    diesel::sql_query("BEGIN IMMEDIATE")
        .execute(&mut persistence.conn)
        .unwrap();
}

fn release_write_lock(persistence: &mut SqlitePersistence) {
    diesel::sql_query("ROLLBACK")
        .execute(&mut persistence.conn)
        .unwrap();
}

#[test]
fn test_version_creation_behind_a_writer_is_retryable() {
    let dir: TempDir = TempDir::new().unwrap();
    let (mut first, mut second, term_id) = open_pair(&dir);

    hold_write_lock(&mut first);
    let blocked =
        second.create_load_file_version(&create_test_upload(term_id, "a.csv"), create_test_now());
    release_write_lock(&mut first);

    let Err(err) = blocked else {
        panic!("expected the second writer to be refused");
    };
    assert!(matches!(err, PersistenceError::ConcurrencyConflict(_)));
    assert!(err.is_retryable());

    let retried: LoadFileData = second
        .create_load_file_version(&create_test_upload(term_id, "a.csv"), create_test_now())
        .unwrap();
    assert_eq!(retried.version, 1);
    assert!(retried.is_active);
}

#[test]
fn test_rate_raise_behind_a_writer_is_retryable() {
    let dir: TempDir = TempDir::new().unwrap();
    let (mut first, mut second, _) = open_pair(&dir);

    hold_write_lock(&mut first);
    let blocked = second.raise_rate(
        LevelCode::Grado,
        Money::from_cents(1000),
        create_test_date(2026, 1, 1),
        "finance",
        create_test_now(),
    );
    release_write_lock(&mut first);

    assert!(matches!(blocked, Err(PersistenceError::ConcurrencyConflict(_))));
    assert!(first.load_level_history(LevelCode::Grado).unwrap().is_empty());
}

#[test]
fn test_second_active_version_is_refused_by_the_index() {
    let dir: TempDir = TempDir::new().unwrap();
    let (mut first, mut second, term_id) = open_pair(&dir);
    let context: LoadContext = LoadContext::new(1, 10, term_id);
    first
        .create_load_file_version(&create_test_upload(term_id, "a.csv"), create_test_now())
        .unwrap();

    // A writer that skipped the supersession step
    let err: DieselError = diesel::insert_into(load_files::table)
        .values((
            load_files::faculty_id.eq(context.faculty_id),
            load_files::school_id.eq(context.school_id),
            load_files::term_id.eq(context.term_id),
            load_files::uploaded_by.eq("coordinator@example.edu"),
            load_files::original_filename.eq("b.csv"),
            load_files::storage_path.eq("/var/lib/loadbill/b.csv"),
            load_files::strict_validation.eq(0),
            load_files::status.eq("pending"),
            load_files::version.eq(2),
            load_files::is_active.eq(1),
            load_files::created_at.eq("2026-01-10 09:30:00"),
        ))
        .execute(&mut second.conn)
        .unwrap_err();

    assert!(is_write_conflict(&err));
    let mapped: PersistenceError = conflict_aware(context)(err);
    assert!(matches!(mapped, PersistenceError::ConcurrencyConflict(_)));
    assert!(mapped.is_retryable());

    let versions: Vec<LoadFileData> = first.list_load_file_versions(context).unwrap();
    assert_eq!(versions.len(), 1);
}

#[test]
fn test_second_open_rate_is_refused_by_the_index() {
    let dir: TempDir = TempDir::new().unwrap();
    let (mut first, mut second, _) = open_pair(&dir);
    first
        .raise_rate(
            LevelCode::Grado,
            Money::from_cents(1000),
            create_test_date(2026, 1, 1),
            "finance",
            create_test_now(),
        )
        .unwrap();
    let level_id: i64 = lookup_level_id(&mut second.conn, LevelCode::Grado).unwrap();

    let err: DieselError = diesel::insert_into(hourly_rate_history::table)
        .values((
            hourly_rate_history::level_id.eq(level_id),
            hourly_rate_history::rate_cents.eq(1200),
            hourly_rate_history::start_date.eq("2026-03-01"),
            hourly_rate_history::end_date.eq(None::<String>),
            hourly_rate_history::created_at.eq("2026-01-10 09:30:00"),
            hourly_rate_history::created_by.eq("finance"),
        ))
        .execute(&mut second.conn)
        .unwrap_err();

    assert!(is_write_conflict(&err));
    assert!(matches!(
        rate_conflict(level_id)(err),
        PersistenceError::ConcurrencyConflict(_)
    ));
    assert_eq!(first.load_level_history(LevelCode::Grado).unwrap().len(), 1);
}
