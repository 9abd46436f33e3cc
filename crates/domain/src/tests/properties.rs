// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Property tests for normalization, rate history and level resolution.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use super::helpers::{create_test_window, date, dollars};
use crate::{
    LevelCode, RateRaise, RateWindow, check_history, normalize_time_range, normalize_weekdays,
    plan_rate_raise, resolve_level, windows_overlap,
};

const DAY_SPELLINGS: [[&str; 4]; 7] = [
    ["Lunes", "lun", "LU", "lúnes"],
    ["Martes", "mar", "MA", "martes"],
    ["Miércoles", "mie", "MI", "MIERCOLES"],
    ["Jueves", "jue", "JU", "jueves"],
    ["Viernes", "vie", "VI", "VIERNES"],
    ["Sábado", "sab", "SA", "sabado"],
    ["Domingo", "dom", "DO", "DOMINGO"],
];

const SEPARATORS: [&str; 6] = ["-", ", ", " y ", "/", " ", ";"];

fn weekday_text() -> impl Strategy<Value = String> {
    prop::collection::vec((0usize..7, 0usize..4, 0usize..SEPARATORS.len()), 0..8).prop_map(
        |parts| {
            parts
                .into_iter()
                .map(|(day, spelling, sep)| {
                    format!("{}{}", DAY_SPELLINGS[day][spelling], SEPARATORS[sep])
                })
                .collect::<String>()
        },
    )
}

fn base_date() -> NaiveDate {
    date(2020, 1, 1)
}

/// A random window: start offset in days, optional length in days.
fn window_strategy() -> impl Strategy<Value = (i64, Option<i64>)> {
    (0i64..400, prop::option::weighted(0.8, 1i64..120))
}

/// Days past `base_date` that every generated window start and end falls within.
const HORIZON_DAYS: i64 = 600;

/// Whether two windows share at least one calendar day before the horizon.
fn share_a_day(a: &RateWindow, b: &RateWindow) -> bool {
    let covers = |w: &RateWindow, day: NaiveDate| -> bool {
        w.start_date <= day && w.end_date.is_none_or(|end| day <= end)
    };
    (0..HORIZON_DAYS)
        .map(|offset| base_date() + Duration::days(offset))
        .any(|day| covers(a, day) && covers(b, day))
}

fn build_window(id: i64, (offset, len): (i64, Option<i64>)) -> RateWindow {
    let start: NaiveDate = base_date() + Duration::days(offset);
    let end: Option<NaiveDate> = len.map(|l| start + Duration::days(l));
    create_test_window(id, 10 + id, start, end)
}

proptest! {
    #[test]
    fn weekday_normalization_is_idempotent(text in weekday_text()) {
        let once: String = normalize_weekdays(&text).value;
        let twice = normalize_weekdays(&once);
        prop_assert_eq!(&twice.value, &once);
        prop_assert!(twice.change.is_none());
    }

    #[test]
    fn canonical_time_ranges_pass_through(
        h1 in 0u32..24, m1 in 0u32..60, h2 in 0u32..24, m2 in 0u32..60
    ) {
        let canonical: String = format!("{h1:02}:{m1:02}-{h2:02}:{m2:02}");
        let normalized = normalize_time_range(&canonical);
        prop_assert_eq!(normalized.value, canonical);
        prop_assert!(normalized.change.is_none());
    }

    #[test]
    fn level_resolution_is_total_and_ordered(
        class_bilingual in any::<bool>(),
        professor_bilingual in any::<bool>(),
        doctor in any::<bool>(),
        masters in 0u8..5,
    ) {
        let level: LevelCode = resolve_level(class_bilingual, professor_bilingual, doctor, masters);
        prop_assert!(LevelCode::ALL.contains(&level));
        prop_assert_eq!(level, resolve_level(class_bilingual, professor_bilingual, doctor, masters));

        let expected: LevelCode = if class_bilingual || professor_bilingual {
            LevelCode::Bilingual
        } else if doctor {
            LevelCode::Doctor
        } else if masters >= 2 {
            LevelCode::Masters2
        } else if masters == 1 {
            LevelCode::Masters1
        } else {
            LevelCode::Grado
        };
        prop_assert_eq!(level, expected);
    }

    /// Accepting windows one by one keeps the history valid, and every
    /// rejected window overlaps something already accepted.
    #[test]
    fn history_check_rejects_exactly_overlapping_windows(
        specs in prop::collection::vec(window_strategy(), 1..12)
    ) {
        let mut accepted: Vec<RateWindow> = Vec::new();
        for (idx, spec) in specs.into_iter().enumerate() {
            let candidate: RateWindow = build_window(i64::try_from(idx).unwrap() + 1, spec);
            let conflicts: bool = accepted.iter().any(|w| share_a_day(w, &candidate))
                || (candidate.is_open() && accepted.iter().any(RateWindow::is_open));

            let mut trial: Vec<RateWindow> = accepted.clone();
            trial.push(candidate);
            prop_assert_eq!(check_history(&trial).is_err(), conflicts);
            if !conflicts {
                accepted = trial;
            }
        }
        prop_assert!(accepted.iter().filter(|w| w.is_open()).count() <= 1);
    }

    /// The interval formula agrees with day-by-day intersection.
    #[test]
    fn overlap_matches_shared_days(a in window_strategy(), b in window_strategy()) {
        let first: RateWindow = build_window(1, a);
        let second: RateWindow = build_window(2, b);
        prop_assert_eq!(
            windows_overlap(first.start_date, first.end_date, second.start_date, second.end_date),
            share_a_day(&first, &second)
        );
    }

    /// A sequence of raises never produces overlapping or duplicate open rows.
    #[test]
    fn raises_preserve_history_invariants(offsets in prop::collection::vec(0i64..60, 1..10)) {
        let mut history: Vec<RateWindow> = Vec::new();
        let mut start: NaiveDate = base_date();
        for (idx, offset) in offsets.into_iter().enumerate() {
            start += Duration::days(offset);
            let raise: RateRaise = RateRaise {
                level_id: 4,
                rate: dollars(10 + i64::try_from(idx).unwrap()),
                start_date: start,
            };
            let Ok(plan) = plan_rate_raise(&history, raise) else {
                // Only a start on or before the open row's start is refused
                let open_start = history.iter().find(|w| w.is_open()).map(|w| w.start_date);
                prop_assert!(open_start.is_some_and(|s| start <= s));
                continue;
            };
            let closing = plan.close.and_then(|(id, end)| {
                history.iter_mut().find(|w| w.rate_id == id).map(|row| (row, end))
            });
            if let Some((row, end)) = closing {
                row.end_date = Some(end);
            }
            let new_id: i64 = i64::try_from(history.len()).unwrap() + 1;
            history.push(create_test_window(new_id, 10, plan.raise.start_date, None));
            prop_assert!(check_history(&history).is_ok());
        }
    }
}
