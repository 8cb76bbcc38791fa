// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Calendar arithmetic for recurring rules.
//!
//! Everything here works on calendar dates; there is no time-of-day and no
//! timezone, so a rule anchored on the 31st stays on the 31st wherever the
//! user is.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::Frequency;

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Builds `year-month-day`, pulling `day` back to the month's last day.
fn clamped(year: i32, month: u32, day: u32, fallback: NaiveDate) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    // Only out of range past chrono's maximum year.
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(fallback)
}

/// Moves `date` by `months` calendar months (negative goes back), keeping
/// the day of month where the target month allows it.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    shift_months_to_day(date, months, date.day())
}

fn shift_months_to_day(date: NaiveDate, months: i32, day: u32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    clamped(year, month, day, date)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The occurrence following `current` for a rule with `frequency`.
///
/// Monthly and yearly rules land on `anchor_day` (or `current`'s day when no
/// anchor is set), clamped to the length of the target month:
/// 2024-01-31 monthly becomes 2024-02-29, 2024-02-29 yearly becomes 2025-02-28.
pub fn next_occurrence(
    current: NaiveDate,
    frequency: Frequency,
    anchor_day: Option<u32>,
) -> NaiveDate {
    match frequency {
        Frequency::Daily => current + Duration::days(1),
        Frequency::Weekly => current + Duration::weeks(1),
        Frequency::Monthly => {
            shift_months_to_day(current, 1, anchor_day.unwrap_or(current.day()))
        }
        Frequency::Yearly => {
            shift_months_to_day(current, 12, anchor_day.unwrap_or(current.day()))
        }
    }
}

/// First due date of a rule that starts without an initial transaction.
///
/// Never earlier than `max(start, today)`. Monthly rules with an anchor are
/// moved onto the anchor day, rolling into the next month when this
/// month's anchor has already passed.
pub fn first_run_date(
    start: NaiveDate,
    today: NaiveDate,
    frequency: Frequency,
    anchor_day: Option<u32>,
) -> NaiveDate {
    let base = start.max(today);
    match (frequency, anchor_day) {
        (Frequency::Monthly, Some(anchor)) => {
            let aligned = clamped(base.year(), base.month(), anchor, base);
            if aligned < base {
                shift_months_to_day(aligned, 1, anchor)
            } else {
                aligned
            }
        }
        _ => base,
    }
}
