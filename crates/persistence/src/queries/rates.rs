// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Hourly rate history queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use loadbill_domain::{LevelCode, Money, RateTable, RateWindow};

use crate::conversions::{parse_date, parse_optional_date, parse_stored, parse_timestamp};
use crate::diesel_schema::{academic_levels, hourly_rate_history};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = hourly_rate_history)]
struct RateRow {
    rate_id: i64,
    level_id: i64,
    rate_cents: i64,
    start_date: String,
    end_date: Option<String>,
    created_at: String,
}

impl TryFrom<RateRow> for RateWindow {
    type Error = PersistenceError;

    fn try_from(row: RateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            rate_id: row.rate_id,
            level_id: row.level_id,
            rate: Money::from_cents(row.rate_cents),
            start_date: parse_date("hourly_rate_history.start_date", &row.start_date)?,
            end_date: parse_optional_date("hourly_rate_history.end_date", row.end_date.as_deref())?,
            created_at: parse_timestamp("hourly_rate_history.created_at", &row.created_at)?,
        })
    }
}

/// Loads the full history of one level ordered by start date.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn load_level_history(
    conn: &mut SqliteConnection,
    level_id: i64,
) -> Result<Vec<RateWindow>, PersistenceError> {
    let rows: Vec<RateRow> = hourly_rate_history::table
        .filter(hourly_rate_history::level_id.eq(level_id))
        .order(hourly_rate_history::start_date.asc())
        .select(RateRow::as_select())
        .load(conn)?;
    rows.into_iter().map(RateWindow::try_from).collect()
}

/// Finds the level a rate row belongs to.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_rate_level(
    conn: &mut SqliteConnection,
    rate_id: i64,
) -> Result<Option<i64>, PersistenceError> {
    Ok(hourly_rate_history::table
        .filter(hourly_rate_history::rate_id.eq(rate_id))
        .select(hourly_rate_history::level_id)
        .first(conn)
        .optional()?)
}

/// Loads every level's history into a lookup table keyed by level code.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn load_rate_table(conn: &mut SqliteConnection) -> Result<RateTable, PersistenceError> {
    let rows: Vec<(String, RateRow)> = hourly_rate_history::table
        .inner_join(academic_levels::table)
        .order((
            academic_levels::priority.asc(),
            hourly_rate_history::start_date.asc(),
        ))
        .select((academic_levels::code, RateRow::as_select()))
        .load(conn)?;

    let mut table: RateTable = RateTable::new();
    for (code, row) in rows {
        let level: LevelCode = parse_stored("academic_levels.code", &code)?;
        table.insert(level, RateWindow::try_from(row)?);
    }
    Ok(table)
}
