// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Column encodings shared by queries and mutations.
//!
//! Dates are stored as `YYYY-MM-DD` text, timestamps as
//! `YYYY-MM-DD HH:MM:SS` text (the `CURRENT_TIMESTAMP` layout), and booleans
//! as `0`/`1` integers.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use num_traits::ToPrimitive;

use crate::error::PersistenceError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_date(column: &'static str, raw: &str) -> Result<NaiveDate, PersistenceError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| corrupt(column, raw))
}

pub fn parse_optional_date(
    column: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, PersistenceError> {
    raw.map(|r| parse_date(column, r)).transpose()
}

pub fn parse_timestamp(column: &'static str, raw: &str) -> Result<NaiveDateTime, PersistenceError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| corrupt(column, raw))
}

/// Parses a stored enum string through its `FromStr` implementation.
pub fn parse_stored<T: FromStr>(column: &'static str, raw: &str) -> Result<T, PersistenceError> {
    raw.parse::<T>().map_err(|_| corrupt(column, raw))
}

pub fn flag(value: bool) -> i32 {
    i32::from(value)
}

pub const fn is_set(value: i32) -> bool {
    value != 0
}

pub fn to_i32(column: &'static str, value: u32) -> Result<i32, PersistenceError> {
    value.to_i32().ok_or_else(|| corrupt(column, &value.to_string()))
}

pub fn to_u32(column: &'static str, value: i32) -> Result<u32, PersistenceError> {
    value.to_u32().ok_or_else(|| corrupt(column, &value.to_string()))
}

pub fn to_u8(column: &'static str, value: i32) -> Result<u8, PersistenceError> {
    value.to_u8().ok_or_else(|| corrupt(column, &value.to_string()))
}

fn corrupt(column: &'static str, raw: &str) -> PersistenceError {
    PersistenceError::CorruptValue {
        column,
        value: raw.to_string(),
    }
}
