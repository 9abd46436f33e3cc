// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Typed class rows.
//!
//! The extractor maps each spreadsheet data row into a `RawClassRow` exactly
//! once. Normalization turns it into a `NormalizedClassRow`, which is what
//! validators and persistence work with.

use serde::{Deserialize, Serialize};

use crate::normalize::{
    ChangeRecord, Normalized, normalize_time_range, normalize_title, normalize_weekdays,
    parse_count, parse_duration, parse_flag,
};
use crate::text::fold;

/// Every column the load sheet must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    /// Sheet sequence number.
    Sequence,
    /// Coordination code.
    CoordinationCode,
    /// Subject code.
    SubjectCode,
    /// Subject name.
    SubjectName,
    /// Section.
    Section,
    /// Parallel.
    Parallel,
    /// Bilingual flag.
    Bilingual,
    /// Class duration.
    Duration,
    /// Schedule (time range).
    Schedule,
    /// Days of the week.
    Days,
    /// Class type.
    ClassType,
    /// Professor's institute.
    Institute,
    /// Professor's academic title.
    Title,
    /// Professor's full name.
    ProfessorName,
    /// Contact name.
    Contact,
    /// Phone number.
    Phone,
    /// Professor code.
    ProfessorCode,
    /// Professor category.
    Category,
    /// Payment status.
    PaymentStatus,
    /// Professor profile.
    Profile,
    /// Final grade.
    FinalGrade,
    /// Number of master's degrees.
    MastersCount,
    /// Institutional email.
    InstitutionalEmail,
    /// Personal email.
    PersonalEmail,
    /// Free-text observations.
    Observations,
    /// Microsoft Teams owner.
    TeamsOwner,
}

impl CanonicalField {
    /// All required columns in sheet order.
    pub const ALL: [Self; 26] = [
        Self::Sequence,
        Self::CoordinationCode,
        Self::SubjectCode,
        Self::SubjectName,
        Self::Section,
        Self::Parallel,
        Self::Bilingual,
        Self::Duration,
        Self::Schedule,
        Self::Days,
        Self::ClassType,
        Self::Institute,
        Self::Title,
        Self::ProfessorName,
        Self::Contact,
        Self::Phone,
        Self::ProfessorCode,
        Self::Category,
        Self::PaymentStatus,
        Self::Profile,
        Self::FinalGrade,
        Self::MastersCount,
        Self::InstitutionalEmail,
        Self::PersonalEmail,
        Self::Observations,
        Self::TeamsOwner,
    ];

    /// Columns that, when all blank, mark the end of the data region.
    pub const KEY_FIELDS: [Self; 3] = [Self::SubjectCode, Self::SubjectName, Self::CoordinationCode];

    /// The column header as printed on the sheet.
    #[must_use]
    pub const fn header(&self) -> &'static str {
        match self {
            Self::Sequence => "N°",
            Self::CoordinationCode => "COD COORDINACION",
            Self::SubjectCode => "COD ASIGNATURA",
            Self::SubjectName => "ASIGNATURA",
            Self::Section => "SECCION",
            Self::Parallel => "PARALELO",
            Self::Bilingual => "BILINGUE",
            Self::Duration => "DURACION",
            Self::Schedule => "HORARIO",
            Self::Days => "DIAS",
            Self::ClassType => "TIPO CLASE",
            Self::Institute => "INSTITUTO",
            Self::Title => "TITULO",
            Self::ProfessorName => "DOCENTE",
            Self::Contact => "CONTACTO",
            Self::Phone => "TELEFONO",
            Self::ProfessorCode => "ID DOCENTE",
            Self::Category => "CATEGORIA",
            Self::PaymentStatus => "ESTADO PAGO",
            Self::Profile => "PERFIL",
            Self::FinalGrade => "NOTA FINAL",
            Self::MastersCount => "NUM MAESTRIAS",
            Self::InstitutionalEmail => "CORREO INSTITUCIONAL",
            Self::PersonalEmail => "CORREO PERSONAL",
            Self::Observations => "OBSERVACIONES",
            Self::TeamsOwner => "PROPIETARIO TEAMS",
        }
    }

    /// Field name used in findings and change records.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::CoordinationCode => "coordination_code",
            Self::SubjectCode => "subject_code",
            Self::SubjectName => "subject_name",
            Self::Section => "section",
            Self::Parallel => "parallel",
            Self::Bilingual => "bilingual",
            Self::Duration => "duration",
            Self::Schedule => "schedule",
            Self::Days => "days",
            Self::ClassType => "class_type",
            Self::Institute => "institute",
            Self::Title => "title",
            Self::ProfessorName => "professor_name",
            Self::Contact => "contact",
            Self::Phone => "phone",
            Self::ProfessorCode => "professor_code",
            Self::Category => "category",
            Self::PaymentStatus => "payment_status",
            Self::Profile => "profile",
            Self::FinalGrade => "final_grade",
            Self::MastersCount => "masters_count",
            Self::InstitutionalEmail => "institutional_email",
            Self::PersonalEmail => "personal_email",
            Self::Observations => "observations",
            Self::TeamsOwner => "teams_owner",
        }
    }

    /// Matches a header cell against the required columns.
    ///
    /// Comparison ignores case, surrounding and repeated whitespace, and accents.
    #[must_use]
    pub fn from_header(cell: &str) -> Option<Self> {
        let folded: String = fold(cell);
        Self::ALL
            .into_iter()
            .find(|field| fold(field.header()) == folded)
    }
}

/// One data row exactly as read from the sheet, keyed by canonical field.
///
/// Cell text is trimmed but otherwise untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClassRow {
    /// 1-based spreadsheet row number.
    pub row_number: i32,
    /// Sequence number column (`N°`).
    pub sequence: String,
    /// Coordination code.
    pub coordination_code: String,
    /// Subject code.
    pub subject_code: String,
    /// Subject name as typed in the sheet.
    pub subject_name: String,
    /// Section.
    pub section: String,
    /// Parallel group.
    pub parallel: String,
    /// Bilingual flag cell.
    pub bilingual: String,
    /// Duration cell, any unit.
    pub duration: String,
    /// Time range cell.
    pub schedule: String,
    /// Weekday list cell.
    pub days: String,
    /// Class type.
    pub class_type: String,
    /// Institute.
    pub institute: String,
    /// Academic title cell.
    pub title: String,
    /// Professor full name.
    pub professor_name: String,
    /// Contact.
    pub contact: String,
    /// Phone.
    pub phone: String,
    /// Professor code (`ID DOCENTE`).
    pub professor_code: String,
    /// Professor category.
    pub category: String,
    /// Payment status.
    pub payment_status: String,
    /// Profile.
    pub profile: String,
    /// Final grade.
    pub final_grade: String,
    /// Master's degree count cell.
    pub masters_count: String,
    /// Institutional email.
    pub institutional_email: String,
    /// Personal email.
    pub personal_email: String,
    /// Free-text observations.
    pub observations: String,
    /// Teams owner.
    pub teams_owner: String,
}

impl RawClassRow {
    /// Creates an empty row for the given spreadsheet row number.
    #[must_use]
    pub fn new(row_number: i32) -> Self {
        Self {
            row_number,
            ..Self::default()
        }
    }

    const fn slot(&mut self, field: CanonicalField) -> &mut String {
        match field {
            CanonicalField::Sequence => &mut self.sequence,
            CanonicalField::CoordinationCode => &mut self.coordination_code,
            CanonicalField::SubjectCode => &mut self.subject_code,
            CanonicalField::SubjectName => &mut self.subject_name,
            CanonicalField::Section => &mut self.section,
            CanonicalField::Parallel => &mut self.parallel,
            CanonicalField::Bilingual => &mut self.bilingual,
            CanonicalField::Duration => &mut self.duration,
            CanonicalField::Schedule => &mut self.schedule,
            CanonicalField::Days => &mut self.days,
            CanonicalField::ClassType => &mut self.class_type,
            CanonicalField::Institute => &mut self.institute,
            CanonicalField::Title => &mut self.title,
            CanonicalField::ProfessorName => &mut self.professor_name,
            CanonicalField::Contact => &mut self.contact,
            CanonicalField::Phone => &mut self.phone,
            CanonicalField::ProfessorCode => &mut self.professor_code,
            CanonicalField::Category => &mut self.category,
            CanonicalField::PaymentStatus => &mut self.payment_status,
            CanonicalField::Profile => &mut self.profile,
            CanonicalField::FinalGrade => &mut self.final_grade,
            CanonicalField::MastersCount => &mut self.masters_count,
            CanonicalField::InstitutionalEmail => &mut self.institutional_email,
            CanonicalField::PersonalEmail => &mut self.personal_email,
            CanonicalField::Observations => &mut self.observations,
            CanonicalField::TeamsOwner => &mut self.teams_owner,
        }
    }

    /// Stores the trimmed cell text for a field.
    pub fn set(&mut self, field: CanonicalField, value: &str) {
        *self.slot(field) = value.trim().to_string();
    }

    /// Returns the cell text for a field.
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Sequence => &self.sequence,
            CanonicalField::CoordinationCode => &self.coordination_code,
            CanonicalField::SubjectCode => &self.subject_code,
            CanonicalField::SubjectName => &self.subject_name,
            CanonicalField::Section => &self.section,
            CanonicalField::Parallel => &self.parallel,
            CanonicalField::Bilingual => &self.bilingual,
            CanonicalField::Duration => &self.duration,
            CanonicalField::Schedule => &self.schedule,
            CanonicalField::Days => &self.days,
            CanonicalField::ClassType => &self.class_type,
            CanonicalField::Institute => &self.institute,
            CanonicalField::Title => &self.title,
            CanonicalField::ProfessorName => &self.professor_name,
            CanonicalField::Contact => &self.contact,
            CanonicalField::Phone => &self.phone,
            CanonicalField::ProfessorCode => &self.professor_code,
            CanonicalField::Category => &self.category,
            CanonicalField::PaymentStatus => &self.payment_status,
            CanonicalField::Profile => &self.profile,
            CanonicalField::FinalGrade => &self.final_grade,
            CanonicalField::MastersCount => &self.masters_count,
            CanonicalField::InstitutionalEmail => &self.institutional_email,
            CanonicalField::PersonalEmail => &self.personal_email,
            CanonicalField::Observations => &self.observations,
            CanonicalField::TeamsOwner => &self.teams_owner,
        }
    }

    /// Returns whether every key column is blank (end of data marker).
    #[must_use]
    pub fn is_key_blank(&self) -> bool {
        CanonicalField::KEY_FIELDS
            .iter()
            .all(|f| self.get(*f).trim().is_empty())
    }
}

/// A class row after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedClassRow {
    /// 1-based spreadsheet row number.
    pub row_number: i32,
    /// Sequence number column (`N°`).
    pub sequence: String,
    /// Coordination code.
    pub coordination_code: String,
    /// Subject code.
    pub subject_code: String,
    /// Subject name as typed in the sheet.
    pub subject_name: String,
    /// Section.
    pub section: String,
    /// Parallel group.
    pub parallel: String,
    /// Whether the class is taught bilingually.
    pub is_bilingual: bool,
    /// Duration in minutes; zero when unparseable or longer than a day.
    pub duration_minutes: u32,
    /// `HH:MM-HH:MM`, or empty when unparseable.
    pub schedule: String,
    /// `Lu-Mi` style weekday codes.
    pub days: String,
    /// Class type.
    pub class_type: String,
    /// Institute.
    pub institute: String,
    /// Abbreviated title (`Ing.`, `Lic.`, ...).
    pub title: String,
    /// Professor full name.
    pub professor_name: String,
    /// Contact.
    pub contact: String,
    /// Phone.
    pub phone: String,
    /// Professor code as typed in the sheet.
    pub professor_code: String,
    /// Professor category.
    pub category: String,
    /// Payment status.
    pub payment_status: String,
    /// Profile.
    pub profile: String,
    /// Final grade.
    pub final_grade: String,
    /// Number of master's degrees; zero when unparseable.
    pub masters_count: u8,
    /// Institutional email.
    pub institutional_email: String,
    /// Personal email.
    pub personal_email: String,
    /// Free-text observations.
    pub observations: String,
    /// Teams owner.
    pub teams_owner: String,
}

impl NormalizedClassRow {
    /// Normalizes a raw row, returning every change made along the way.
    #[must_use]
    pub fn from_raw(raw: &RawClassRow) -> (Self, Vec<ChangeRecord>) {
        let mut changes: Vec<ChangeRecord> = Vec::new();

        let days: String = record(&mut changes, normalize_weekdays(&raw.days));
        let schedule: String = record(&mut changes, normalize_time_range(&raw.schedule));
        let title: String = record(&mut changes, normalize_title(&raw.title));
        let duration_minutes: u32 = record(&mut changes, parse_duration(&raw.duration));
        let is_bilingual: bool = record(
            &mut changes,
            parse_flag(CanonicalField::Bilingual.field_name(), &raw.bilingual),
        );
        let masters_count: u8 = record(
            &mut changes,
            parse_count(CanonicalField::MastersCount.field_name(), &raw.masters_count),
        );

        let row = Self {
            row_number: raw.row_number,
            sequence: raw.sequence.clone(),
            coordination_code: raw.coordination_code.trim().to_uppercase(),
            subject_code: raw.subject_code.trim().to_uppercase(),
            subject_name: raw.subject_name.clone(),
            section: raw.section.clone(),
            parallel: raw.parallel.clone(),
            is_bilingual,
            duration_minutes,
            schedule,
            days,
            class_type: raw.class_type.clone(),
            institute: raw.institute.clone(),
            title,
            professor_name: raw.professor_name.split_whitespace().collect::<Vec<_>>().join(" "),
            contact: raw.contact.clone(),
            phone: raw.phone.clone(),
            professor_code: raw.professor_code.clone(),
            category: raw.category.clone(),
            payment_status: raw.payment_status.clone(),
            profile: raw.profile.clone(),
            final_grade: raw.final_grade.clone(),
            masters_count,
            institutional_email: raw.institutional_email.to_lowercase(),
            personal_email: raw.personal_email.to_lowercase(),
            observations: raw.observations.clone(),
            teams_owner: raw.teams_owner.clone(),
        };
        (row, changes)
    }
}

fn record<T>(changes: &mut Vec<ChangeRecord>, normalized: Normalized<T>) -> T {
    changes.extend(normalized.change);
    normalized.value
}
