// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.

use loadbill_domain::{LevelCode, ReferenceCatalog};

use crate::tests::create_test_persistence;
use crate::{AcademicLevelData, SqlitePersistence};

#[test]
fn test_persistence_initialization() {
    let result: Result<SqlitePersistence, crate::error::PersistenceError> =
        SqlitePersistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let (mut db1, _) = create_test_persistence();
    let mut db2 = SqlitePersistence::new_in_memory().unwrap();

    db1.insert_coordination("SIS", "Sistemas").unwrap();

    let snapshot1 = db1.load_catalog_snapshot().unwrap();
    let snapshot2 = db2.load_catalog_snapshot().unwrap();

    assert!(snapshot1.coordination_by_code("SIS").is_some());
    assert!(snapshot2.coordination_by_code("SIS").is_none());
}

#[test]
fn test_migrations_seed_academic_levels() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let levels: Vec<AcademicLevelData> = persistence.list_academic_levels().unwrap();

    let codes: Vec<LevelCode> = levels.iter().map(|l| l.code).collect();
    assert_eq!(codes, LevelCode::ALL.to_vec());
    assert!(levels.iter().all(|l| l.is_active));
    assert_eq!(levels[0].priority, 1);
    assert_eq!(levels[4].priority, 5);
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loadbill.db");

    {
        let mut persistence = SqlitePersistence::new_with_file(&path).unwrap();
        persistence.insert_coordination("SIS", "Sistemas").unwrap();
    }

    let mut reopened = SqlitePersistence::new_with_file(&path).unwrap();
    let snapshot = reopened.load_catalog_snapshot().unwrap();
    assert!(snapshot.coordination_by_code("SIS").is_some());
}
