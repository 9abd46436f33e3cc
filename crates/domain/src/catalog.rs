// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only reference catalog accessors.
//!
//! Validators consult the catalog through the `ReferenceCatalog` trait. The
//! persistence layer loads a `CatalogSnapshot` once per ingestion job so that
//! row validation is a pure function of `(row, snapshot)`.

use std::collections::HashMap;

use crate::text::{fold, similarity};

/// A subject (course) catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    /// Canonical identifier.
    pub subject_id: i64,
    /// Subject code as printed on the load sheet.
    pub code: String,
    /// Catalog subject name.
    pub name: String,
    /// Soft-deleted subjects are invisible to validation.
    pub is_deleted: bool,
}

/// A professor catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfessorRecord {
    /// Canonical identifier.
    pub professor_id: i64,
    /// Institutional professor code (national id or staff number).
    pub professor_code: String,
    /// Full display name.
    pub full_name: String,
    /// Academic title as stored in the catalog (not normalized).
    pub academic_title: String,
    /// Number of master's degrees on record.
    pub masters_count: u8,
    /// Whether the professor is certified to teach bilingual classes.
    pub is_bilingual: bool,
    /// Whether the professor holds a doctorate.
    pub is_doctor: bool,
    /// Inactive professors are not considered for fuzzy matching.
    pub is_active: bool,
}

/// A coordination catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationRecord {
    /// Canonical identifier.
    pub coordination_id: i64,
    /// Coordination code as printed on the load sheet.
    pub code: String,
    /// Coordination name.
    pub name: String,
}

/// Lookups used by validators and reference resolution.
pub trait ReferenceCatalog: Sync {
    /// Finds a non-deleted subject by code (case-insensitive).
    fn subject_by_code(&self, code: &str) -> Option<&SubjectRecord>;

    /// Finds a professor whose name equals `name` after folding.
    fn professor_by_name(&self, name: &str) -> Option<&ProfessorRecord>;

    /// Returns all active professors.
    fn active_professors(&self) -> Vec<&ProfessorRecord>;

    /// Finds a coordination by code (case-insensitive).
    fn coordination_by_code(&self, code: &str) -> Option<&CoordinationRecord>;
}

/// How a professor name on the sheet was matched to the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfessorMatch<'a> {
    /// Folded names are identical.
    Exact(&'a ProfessorRecord),
    /// Best fuzzy candidate above the acceptance threshold.
    Similar(&'a ProfessorRecord, f64),
}

impl<'a> ProfessorMatch<'a> {
    /// The matched catalog entry.
    #[must_use]
    pub const fn record(&self) -> &'a ProfessorRecord {
        match self {
            Self::Exact(r) | Self::Similar(r, _) => r,
        }
    }
}

/// Minimum similarity for accepting a fuzzy professor match.
pub const PROFESSOR_MATCH_THRESHOLD: f64 = 0.85;

/// Resolves a professor by exact name first, then by best similarity.
#[must_use]
pub fn resolve_professor<'a>(
    catalog: &'a dyn ReferenceCatalog,
    name: &str,
) -> Option<ProfessorMatch<'a>> {
    if name.trim().is_empty() {
        return None;
    }
    if let Some(record) = catalog.professor_by_name(name) {
        return Some(ProfessorMatch::Exact(record));
    }

    catalog
        .active_professors()
        .into_iter()
        .map(|p| (p, similarity(name, &p.full_name)))
        .filter(|(_, score)| *score >= PROFESSOR_MATCH_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, score)| ProfessorMatch::Similar(p, score))
}

/// In-memory catalog built from the reference tables.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    subjects: HashMap<String, SubjectRecord>,
    professors: Vec<ProfessorRecord>,
    professors_by_name: HashMap<String, usize>,
    coordinations: HashMap<String, CoordinationRecord>,
}

impl CatalogSnapshot {
    /// Builds a snapshot, dropping soft-deleted subjects.
    #[must_use]
    pub fn new(
        subjects: Vec<SubjectRecord>,
        professors: Vec<ProfessorRecord>,
        coordinations: Vec<CoordinationRecord>,
    ) -> Self {
        let subjects: HashMap<String, SubjectRecord> = subjects
            .into_iter()
            .filter(|s| !s.is_deleted)
            .map(|s| (s.code.trim().to_uppercase(), s))
            .collect();

        let mut professors_by_name: HashMap<String, usize> = HashMap::new();
        for (idx, p) in professors.iter().enumerate() {
            // First entry wins so lookups stay deterministic on duplicate names
            professors_by_name.entry(fold(&p.full_name)).or_insert(idx);
        }

        let coordinations: HashMap<String, CoordinationRecord> = coordinations
            .into_iter()
            .map(|c| (c.code.trim().to_uppercase(), c))
            .collect();

        Self {
            subjects,
            professors,
            professors_by_name,
            coordinations,
        }
    }

    /// Number of visible subjects.
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Number of professors (active and inactive).
    #[must_use]
    pub fn professor_count(&self) -> usize {
        self.professors.len()
    }
}

impl ReferenceCatalog for CatalogSnapshot {
    fn subject_by_code(&self, code: &str) -> Option<&SubjectRecord> {
        self.subjects.get(&code.trim().to_uppercase())
    }

    fn professor_by_name(&self, name: &str) -> Option<&ProfessorRecord> {
        self.professors_by_name
            .get(&fold(name))
            .and_then(|&idx| self.professors.get(idx))
    }

    fn active_professors(&self) -> Vec<&ProfessorRecord> {
        self.professors.iter().filter(|p| p.is_active).collect()
    }

    fn coordination_by_code(&self, code: &str) -> Option<&CoordinationRecord> {
        self.coordinations.get(&code.trim().to_uppercase())
    }
}
