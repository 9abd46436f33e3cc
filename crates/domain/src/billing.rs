// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing aggregation.
//!
//! Billable classes are grouped into schedule blocks by their exact
//! `(days, schedule, duration)` triple. For each block the engine produces a
//! payment summary (rate sums per level on the report date) and monthly
//! items (sessions actually held in each calendar month of the term).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::normalize::parse_weekdays;
use crate::rates::RateTable;
use crate::types::{LevelCode, Money, ValidationStatus};

/// Picks the payment level for a class.
///
/// Bilingual wins over doctorate, which wins over master's degrees.
#[must_use]
pub const fn resolve_level(
    class_is_bilingual: bool,
    professor_is_bilingual: bool,
    professor_is_doctor: bool,
    masters_count: u8,
) -> LevelCode {
    if class_is_bilingual || professor_is_bilingual {
        LevelCode::Bilingual
    } else if professor_is_doctor {
        LevelCode::Doctor
    } else if masters_count >= 2 {
        LevelCode::Masters2
    } else if masters_count >= 1 {
        LevelCode::Masters1
    } else {
        LevelCode::Grado
    }
}

/// The grouping key for billing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleBlock {
    /// Weekday codes, e.g. `Lu-Mi`.
    pub days: String,
    /// `HH:MM-HH:MM`.
    pub schedule: String,
    /// Session length in minutes.
    pub duration_minutes: u32,
}

/// One ingested class as seen by billing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillableClass {
    /// Source row identifier.
    pub row_id: i64,
    /// Grouping key.
    pub block: ScheduleBlock,
    /// Resolved payment level.
    pub level: LevelCode,
    /// Row validation status; only usable rows are billed.
    pub status: ValidationStatus,
}

/// The days on which classes of a term are held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCalendar {
    start_date: NaiveDate,
    end_date: NaiveDate,
    holidays: BTreeSet<NaiveDate>,
}

impl TermCalendar {
    /// Creates a calendar covering `start_date..=end_date`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTermCalendar` if the term ends before it starts.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::InvalidTermCalendar {
                start_date,
                end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            holidays: holidays.into_iter().collect(),
        })
    }

    /// Every non-holiday date in the term falling on one of `weekdays`.
    pub fn sessions<'a>(&'a self, weekdays: &'a [Weekday]) -> impl Iterator<Item = NaiveDate> + 'a {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
            .filter(move |d| weekdays.contains(&d.weekday()) && !self.holidays.contains(d))
    }
}

/// Sum of hourly rates per level column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRates {
    /// `GDO` column.
    pub grado: Money,
    /// `M1` column.
    pub m1: Money,
    /// `M2` column.
    pub m2: Money,
    /// `DR` column.
    pub dr: Money,
    /// `BLG` column.
    pub blg: Money,
}

impl LevelRates {
    /// Adds a rate to the level's column.
    pub fn add(&mut self, level: LevelCode, rate: Money) {
        match level {
            LevelCode::Grado => self.grado += rate,
            LevelCode::Masters1 => self.m1 += rate,
            LevelCode::Masters2 => self.m2 += rate,
            LevelCode::Doctor => self.dr += rate,
            LevelCode::Bilingual => self.blg += rate,
        }
    }
}

/// Payment summary for one schedule block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    /// Grouping key.
    pub block: ScheduleBlock,
    /// Billable classes in the block.
    pub class_count: i32,
    /// Rate sums per level on the report date.
    pub rates: LevelRates,
}

/// Sessions of one block within one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLine {
    /// Grouping key.
    pub block: ScheduleBlock,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Sessions held.
    pub session_count: i32,
    /// Minutes taught.
    pub total_minutes: i64,
    /// Hours taught, rounded to two decimals.
    pub class_hours: f64,
    /// Amount owed.
    pub total: Money,
}

/// The rate in force for a level on the report date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshotLine {
    /// Academic level.
    pub level: LevelCode,
    /// Rate history row used.
    pub rate_id: i64,
    /// Hourly rate.
    pub rate: Money,
}

/// Everything a billing report holds besides its header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingComputation {
    /// One line per schedule block.
    pub summaries: Vec<SummaryLine>,
    /// One line per block and calendar month.
    pub monthly: Vec<MonthlyLine>,
    /// Rates in force on the report date.
    pub snapshots: Vec<RateSnapshotLine>,
}

impl BillingComputation {
    /// Grand total across all monthly lines.
    #[must_use]
    pub fn total(&self) -> Money {
        self.monthly.iter().map(|m| m.total).sum()
    }
}

/// Converts minutes to hours rounded half up to two decimals.
#[must_use]
pub fn minutes_to_hours(minutes: i64) -> f64 {
    let hundredths: i64 = (minutes * 100 + 30) / 60;
    hundredths.to_f64().unwrap_or_default() / 100.0
}

#[derive(Default)]
struct MonthAccumulator {
    session_count: i32,
    total_minutes: i64,
    total: Money,
}

/// Refuses to recompute a manually edited report unless forced.
///
/// # Errors
///
/// Returns `ReportEdited` when `is_edited` is set and `force` is not.
pub const fn ensure_recomputable(
    report_id: i64,
    is_edited: bool,
    force: bool,
) -> Result<(), DomainError> {
    if is_edited && !force {
        Err(DomainError::ReportEdited { report_id })
    } else {
        Ok(())
    }
}

/// Computes every child row of a billing report.
///
/// # Errors
///
/// Returns `RateNotDefined` when a billable class needs a rate on a date no
/// rate window covers (the report date or any session date).
pub fn compute_billing(
    classes: &[BillableClass],
    rates: &RateTable,
    calendar: &TermCalendar,
    as_of: NaiveDate,
) -> Result<BillingComputation, DomainError> {
    let mut summaries: BTreeMap<&ScheduleBlock, (i32, LevelRates)> = BTreeMap::new();
    let mut months: BTreeMap<(&ScheduleBlock, i32, u32), MonthAccumulator> = BTreeMap::new();

    for class in classes.iter().filter(|c| c.status.is_usable()) {
        let rate: Money = rates.rate_on(class.level, as_of)?;
        let entry = summaries.entry(&class.block).or_default();
        entry.0 += 1;
        entry.1.add(class.level, rate);

        let weekdays: Vec<Weekday> = parse_weekdays(&class.block.days);
        let minutes: u32 = class.block.duration_minutes;
        for date in calendar.sessions(&weekdays) {
            let session_rate: Money = rates.rate_on(class.level, date)?;
            let acc = months
                .entry((&class.block, date.year(), date.month()))
                .or_default();
            acc.session_count += 1;
            acc.total_minutes += i64::from(minutes);
            acc.total += session_rate.for_minutes(minutes);
        }
    }

    let summaries: Vec<SummaryLine> = summaries
        .into_iter()
        .map(|(block, (class_count, rates))| SummaryLine {
            block: block.clone(),
            class_count,
            rates,
        })
        .collect();

    let monthly: Vec<MonthlyLine> = months
        .into_iter()
        .map(|((block, year, month), acc)| MonthlyLine {
            block: block.clone(),
            year,
            month,
            session_count: acc.session_count,
            total_minutes: acc.total_minutes,
            class_hours: minutes_to_hours(acc.total_minutes),
            total: acc.total,
        })
        .collect();

    let snapshots: Vec<RateSnapshotLine> = LevelCode::ALL
        .into_iter()
        .filter_map(|level| {
            rates.window_on(level, as_of).map(|w| RateSnapshotLine {
                level,
                rate_id: w.rate_id,
                rate: w.rate,
            })
        })
        .collect();

    Ok(BillingComputation {
        summaries,
        monthly,
        snapshots,
    })
}
