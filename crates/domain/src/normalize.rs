// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Normalization of free-text spreadsheet cells into canonical values.
//!
//! Every transform is pure. A transform returns the canonical value together
//! with an optional `ChangeRecord` describing what was rewritten, so the
//! ingestion log can show operators exactly how a cell was interpreted.

use std::sync::LazyLock;

use chrono::Weekday;
use num_traits::ToPrimitive;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::fold;

/// A single rewrite applied during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Canonical field name the change applies to.
    pub field: String,
    /// Raw input text.
    pub from: String,
    /// Stored canonical text.
    pub to: String,
    /// Short explanation.
    pub reason: String,
}

/// A normalized value plus the change made to reach it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    /// The canonical value.
    pub value: T,
    /// Present when the canonical text differs from the raw text.
    pub change: Option<ChangeRecord>,
}

impl<T> Normalized<T> {
    fn new(value: T, field: &str, from: &str, to: &str, reason: &str) -> Self {
        let change = (from != to).then(|| ChangeRecord {
            field: field.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        });
        Self { value, change }
    }
}

/// Two-letter Spanish code for a weekday, as stored in `days`.
#[must_use]
pub const fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lu",
        Weekday::Tue => "Ma",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Ju",
        Weekday::Fri => "Vi",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Do",
    }
}

/// Maps one folded token to a weekday.
///
/// Accepts the full Spanish name, its 3-letter and its 2-letter abbreviation.
fn weekday_from_token(token: &str) -> Option<Weekday> {
    match token {
        "lunes" | "lun" | "lu" => Some(Weekday::Mon),
        "martes" | "mar" | "ma" => Some(Weekday::Tue),
        "miercoles" | "mie" | "mi" => Some(Weekday::Wed),
        "jueves" | "jue" | "ju" => Some(Weekday::Thu),
        "viernes" | "vie" | "vi" => Some(Weekday::Fri),
        "sabado" | "sab" | "sa" => Some(Weekday::Sat),
        "domingo" | "dom" | "do" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parses a stored `Lu-Mi-Vi` list back into weekdays, ignoring unknown codes.
#[must_use]
pub fn parse_weekdays(days: &str) -> Vec<Weekday> {
    fold(days)
        .split(|c: char| !c.is_alphabetic())
        .filter_map(weekday_from_token)
        .fold(Vec::new(), |mut acc, d| {
            if !acc.contains(&d) {
                acc.push(d);
            }
            acc
        })
}

/// Normalizes a free-text weekday list to `Lu-Ma-Mi-Ju-Vi-Sa-Do` codes.
///
/// Tokens that are not weekdays are dropped. Duplicates keep their first
/// position. Applying the transform twice yields the same result.
#[must_use]
pub fn normalize_weekdays(raw: &str) -> Normalized<String> {
    let codes: Vec<&str> = parse_weekdays(raw).into_iter().map(weekday_code).collect();
    let value: String = codes.join("-");
    Normalized::new(value.clone(), "days", raw.trim(), &value, "weekday list normalized")
}

#[allow(clippy::expect_used)]
static CANONICAL_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d-([01]\d|2[0-3]):[0-5]\d$")
        .expect("canonical time range pattern is valid")
});

#[allow(clippy::expect_used)]
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?:[:h.](\d{2}))?\s*(a\.?\s?m\.?|p\.?\s?m\.?)?")
        .expect("time token pattern is valid")
});

/// A clock time expressed in minutes since midnight.
fn token_minutes(caps: &regex::Captures<'_>) -> Option<u32> {
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());
    let meridiem: Option<char> = caps
        .get(3)
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_lowercase());

    // A bare number is a count, not a time
    if minute.is_none() && meridiem.is_none() {
        return None;
    }
    let minute: u32 = minute.unwrap_or(0);
    if minute > 59 {
        return None;
    }

    let hour: u32 = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (m, hour) {
                ('a', 12) => 0,
                ('p', 12) | ('a', _) => hour,
                _ => hour + 12,
            }
        }
        None if hour <= 23 => hour,
        None => return None,
    };
    Some(hour * 60 + minute)
}

/// Formats minutes since midnight as `HH:MM`.
#[must_use]
pub fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Normalizes a schedule cell into `HH:MM-HH:MM` (24-hour).
///
/// Already-canonical values pass through untouched. Otherwise the first two
/// valid time tokens are used; fewer than two yields an empty string.
#[must_use]
pub fn normalize_time_range(raw: &str) -> Normalized<String> {
    let trimmed: &str = raw.trim();
    if CANONICAL_RANGE.is_match(trimmed) {
        return Normalized {
            value: trimmed.to_string(),
            change: None,
        };
    }

    let times: Vec<u32> = TIME_TOKEN
        .captures_iter(trimmed)
        .filter_map(|caps| token_minutes(&caps))
        .take(2)
        .collect();

    let value: String = match times.as_slice() {
        [start, end] => format!("{}-{}", format_clock(*start), format_clock(*end)),
        _ => String::new(),
    };
    let reason: &str = if value.is_empty() {
        "schedule not recognized"
    } else {
        "schedule converted to 24-hour range"
    };
    Normalized::new(value.clone(), "schedule", trimmed, &value, reason)
}

/// Splits a canonical `HH:MM-HH:MM` range into minutes since midnight.
#[must_use]
pub fn parse_time_range(range: &str) -> Option<(u32, u32)> {
    if !CANONICAL_RANGE.is_match(range) {
        return None;
    }
    let (start, end) = range.split_once('-')?;
    Some((clock_minutes(start)?, clock_minutes(end)?))
}

fn clock_minutes(clock: &str) -> Option<u32> {
    let (h, m) = clock.split_once(':')?;
    Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
}

/// Normalizes an academic title to its abbreviation.
#[must_use]
pub fn normalize_title(raw: &str) -> Normalized<String> {
    let trimmed: &str = raw.trim();
    let folded: String = fold(trimmed);
    let canonical: Option<&str> = match folded.trim_end_matches('.') {
        "ing" | "ingeniero" | "ingeniera" | "ingenieria" => Some("Ing."),
        "lic" | "licenciado" | "licenciada" | "licenciatura" => Some("Lic."),
        "dr" | "doctor" | "phd" => Some("Dr."),
        "dra" | "doctora" => Some("Dra."),
        "arq" | "arquitecto" | "arquitecta" => Some("Arq."),
        "tec" | "tecnico" | "tecnica" | "tecnologo" | "tecnologa" => Some("Tec."),
        _ => None,
    };
    let value: String = canonical.map_or_else(|| trimmed.to_string(), str::to_string);
    Normalized::new(value.clone(), "title", trimmed, &value, "academic title abbreviated")
}

/// Longest class a single session may run, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Parses a class duration in minutes.
///
/// Accepts `"90"`, `"90 min"`, `"1.5h"` and `"2 horas"`. Unparseable input
/// and anything longer than [`MAX_DURATION_MINUTES`] yield zero, which the
/// schedule validator reports.
#[must_use]
pub fn parse_duration(raw: &str) -> Normalized<u32> {
    let trimmed: &str = raw.trim();
    let folded: String = fold(trimmed).replace(',', ".");
    let number: String = folded
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let unit: &str = folded[number.len()..].trim();

    let minutes: Option<u32> = number.parse::<f64>().ok().and_then(|n| {
        let factor: f64 = if unit.starts_with('h') { 60.0 } else { 1.0 };
        (n * factor).round().to_u32()
    });
    let minutes: Option<u32> = minutes.filter(|m| *m <= MAX_DURATION_MINUTES);
    let value: u32 = minutes.unwrap_or(0);
    Normalized::new(
        value,
        "duration",
        trimmed,
        &value.to_string(),
        "duration converted to minutes",
    )
}

/// Parses a yes/no spreadsheet flag.
#[must_use]
pub fn parse_flag(field: &str, raw: &str) -> Normalized<bool> {
    let trimmed: &str = raw.trim();
    let value: bool = matches!(
        fold(trimmed).as_str(),
        "si" | "s" | "x" | "yes" | "y" | "true" | "1" | "verdadero"
    );
    let to: &str = if value { "true" } else { "false" };
    let mut normalized = Normalized::new(value, field, trimmed, to, "flag interpreted");
    if trimmed.is_empty() && !value {
        normalized.change = None;
    }
    normalized
}

/// Parses a non-negative count such as the number of master's degrees.
#[must_use]
pub fn parse_count(field: &str, raw: &str) -> Normalized<u8> {
    let trimmed: &str = raw.trim();
    let value: u8 = trimmed
        .split(['.', ','])
        .next()
        .and_then(|whole| whole.trim().parse::<u8>().ok())
        .unwrap_or(0);
    let mut normalized = Normalized::new(
        value,
        field,
        trimmed,
        &value.to_string(),
        "count interpreted",
    );
    if trimmed.is_empty() {
        normalized.change = None;
    }
    normalized
}
