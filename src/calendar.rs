// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

pub fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// Most recent Sunday at midnight. Sunday week start is a fixed convention
/// here, not user-configurable.
pub fn start_of_week(at: NaiveDateTime) -> NaiveDateTime {
    let back = at.date().weekday().num_days_from_sunday();
    (at.date() - chrono::Duration::days(i64::from(back))).and_time(NaiveTime::MIN)
}

/// Every calendar day of `date`'s month, in order.
pub fn month_days(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let (year, month) = (date.year(), date.month());
    (1..=days_in_month(date)).filter_map(move |day| NaiveDate::from_ymd_opt(year, month, day))
}
