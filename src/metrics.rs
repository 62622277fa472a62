// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::calendar::{is_workday, month_days, start_of_day, start_of_week};
use crate::models::{
    Account, Bucket, BucketKind, DayConstraint, Period, RolloverSnapshot, Transaction,
    TransactionKind,
};

/// Filtered sum over a transaction snapshot. Decimal accumulation keeps the
/// total independent of iteration order across repeated recomputation.
pub fn sum_amount<P>(transactions: &[Transaction], predicate: P) -> Decimal
where
    P: Fn(&Transaction) -> bool,
{
    transactions
        .iter()
        .filter(|t| predicate(t))
        .map(|t| t.amount)
        .sum()
}

fn is_bucket_expense(t: &Transaction, bucket_id: i64) -> bool {
    t.kind == TransactionKind::Expense && t.bucket_id == Some(bucket_id)
}

fn in_current_month(date: NaiveDateTime, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

fn matches_constraint(constraint: DayConstraint, date: NaiveDate) -> bool {
    match constraint {
        DayConstraint::All => true,
        DayConstraint::Workdays => is_workday(date),
        DayConstraint::Weekends => !is_workday(date),
    }
}

/// Half-open period window containment relative to `now`. Monthly matches by
/// calendar month; daily and weekly compare midnight instants so a
/// transaction at exactly 00:00 lands in one window only.
fn in_period(period: Period, date: NaiveDateTime, now: NaiveDateTime) -> bool {
    match period {
        Period::Daily => {
            let today = start_of_day(now);
            date >= today && date < today + Duration::days(1)
        }
        Period::Weekly => {
            let week = start_of_week(now);
            date >= week && date < week + Duration::days(7)
        }
        Period::Monthly => in_current_month(date, now.date()),
    }
}

/// Day 1, unless the bucket was created in the current month; a bucket
/// created mid-month accrues no allowance for days before its creation.
fn effective_start_day(created_at: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match created_at {
        Some(c) if c.year() == today.year() && c.month() == today.month() => c.day(),
        _ => 1,
    }
}

/// Accumulated unspent daily allowance from prior days this month, at the
/// current rate unless a valid rate-change snapshot overrides the elapsed
/// part. Negative means prior days overspent their allowance; the value is
/// never clamped at zero.
pub fn rollover_balance(
    bucket_id: i64,
    daily_allowance: Decimal,
    snapshot: Option<&RolloverSnapshot>,
    created_at: Option<NaiveDate>,
    transactions: &[Transaction],
    now: NaiveDateTime,
) -> Decimal {
    let today_start = start_of_day(now);
    let today = today_start.date();

    // A snapshot dated outside the current month is stale and ignored;
    // the whole elapsed month is recomputed at the current rate.
    if let Some(snap) = snapshot {
        if snap.date.year() == today.year() && snap.date.month() == today.month() {
            let snap_start = snap.date.and_time(NaiveTime::MIN);
            let wd_since_snap = month_days(today)
                .filter(|d| is_workday(*d))
                .filter(|d| {
                    let ds = d.and_time(NaiveTime::MIN);
                    ds >= snap_start && ds < today_start
                })
                .count();
            let spent_since_snap = sum_amount(transactions, |t| {
                is_bucket_expense(t, bucket_id) && t.date >= snap_start && t.date < today_start
            });
            return snap.value + Decimal::from(wd_since_snap as u64) * daily_allowance
                - spent_since_snap;
        }
    }

    let start_day = effective_start_day(created_at, today);
    let workdays_prior = month_days(today)
        .filter(|d| d.day() >= start_day && is_workday(*d))
        .filter(|d| d.and_time(NaiveTime::MIN) < today_start)
        .count();
    let spent_prior = sum_amount(transactions, |t| {
        is_bucket_expense(t, bucket_id) && in_current_month(t.date, today) && t.date < today_start
    });
    Decimal::from(workdays_prior as u64) * daily_allowance - spent_prior
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Empty,
    Partial,
    Full,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub workday: bool,
    pub spent: Decimal,
    pub status: DayStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FundingCheck {
    pub account_id: i64,
    pub balance: Decimal,
    pub required: Decimal,
    pub insufficient: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandardMetrics {
    pub spent: Decimal,
    pub remaining: Decimal,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealTrackerMetrics {
    pub daily_allowance: Decimal,
    pub workdays_count: u32,
    pub workdays_prior: u32,
    pub spent_prior: Decimal,
    pub spent_today: Decimal,
    pub rollover: Decimal,
    pub available_today: Decimal,
    pub remaining_today: Decimal,
    pub remaining_workdays_after_today: u32,
    pub remaining_monthly: Decimal,
    pub monthly_total: Decimal,
    pub grid: Vec<DayCell>,
    pub funding: Option<FundingCheck>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketMetrics {
    Standard(StandardMetrics),
    MealTracker(MealTrackerMetrics),
}

/// The one operation the engine exposes: a pure function of
/// (bucket, transaction snapshot, account for the funding check, now).
/// Callers must pass a freshly sampled `now` and must not cache results
/// across a calendar-day boundary.
pub fn compute_bucket_metrics(
    bucket: &Bucket,
    transactions: &[Transaction],
    account: Option<&Account>,
    now: NaiveDateTime,
) -> BucketMetrics {
    match &bucket.kind {
        BucketKind::Standard {
            period,
            constraint,
            limit,
        } => {
            let spent = sum_amount(transactions, |t| {
                is_bucket_expense(t, bucket.id)
                    && in_period(*period, t.date, now)
                    && matches_constraint(*constraint, t.date.date())
            });
            BucketMetrics::Standard(StandardMetrics {
                spent,
                remaining: *limit - spent,
                over_budget: spent > *limit,
            })
        }
        BucketKind::MealTracker {
            daily_allowance,
            snapshot,
        } => BucketMetrics::MealTracker(meal_tracker_metrics(
            bucket,
            *daily_allowance,
            snapshot.as_ref(),
            transactions,
            account,
            now,
        )),
    }
}

fn day_status(spent: Decimal, daily_allowance: Decimal) -> DayStatus {
    if spent.is_zero() {
        DayStatus::Empty
    } else if daily_allowance > Decimal::ZERO && spent < daily_allowance {
        DayStatus::Partial
    } else {
        // Any nonzero spend fills the day when the allowance is zero or
        // negative.
        DayStatus::Full
    }
}

fn meal_tracker_metrics(
    bucket: &Bucket,
    daily_allowance: Decimal,
    snapshot: Option<&RolloverSnapshot>,
    transactions: &[Transaction],
    account: Option<&Account>,
    now: NaiveDateTime,
) -> MealTrackerMetrics {
    let today_start = start_of_day(now);
    let today = today_start.date();
    let start_day = effective_start_day(bucket.created_at, today);

    let workdays_count = month_days(today)
        .filter(|d| d.day() >= start_day && is_workday(*d))
        .count() as u32;
    let workdays_prior = month_days(today)
        .filter(|d| d.day() >= start_day && is_workday(*d))
        .filter(|d| d.and_time(NaiveTime::MIN) < today_start)
        .count() as u32;

    let spent_prior = sum_amount(transactions, |t| {
        is_bucket_expense(t, bucket.id) && in_current_month(t.date, today) && t.date < today_start
    });
    let spent_today = sum_amount(transactions, |t| {
        is_bucket_expense(t, bucket.id)
            && t.date >= today_start
            && t.date < today_start + Duration::days(1)
    });

    let rollover = rollover_balance(
        bucket.id,
        daily_allowance,
        snapshot,
        bucket.created_at,
        transactions,
        now,
    );
    let available_today = daily_allowance + rollover;
    let remaining_today = available_today - spent_today;

    let today_is_workday = u32::from(is_workday(today) && today.day() >= start_day);
    let remaining_workdays_after_today = (i64::from(workdays_count)
        - i64::from(workdays_prior)
        - i64::from(today_is_workday))
    .max(0) as u32;
    let remaining_monthly =
        remaining_today + Decimal::from(remaining_workdays_after_today) * daily_allowance;
    let monthly_total = spent_prior + spent_today + remaining_monthly;

    let grid = month_days(today)
        .map(|d| {
            let ds = d.and_time(NaiveTime::MIN);
            let spent = sum_amount(transactions, |t| {
                is_bucket_expense(t, bucket.id) && t.date >= ds && t.date < ds + Duration::days(1)
            });
            DayCell {
                day: d.day(),
                workday: is_workday(d),
                spent,
                status: day_status(spent, daily_allowance),
            }
        })
        .collect();

    // The funding requirement is floored at zero; a surplus never turns
    // into a negative ask on the linked account.
    let funding = bucket.target_account_id.and_then(|account_id| {
        let account = account.filter(|a| a.id == account_id)?;
        let required = remaining_monthly.max(Decimal::ZERO);
        Some(FundingCheck {
            account_id,
            balance: account.balance,
            required,
            insufficient: account.balance < required,
        })
    });

    MealTrackerMetrics {
        daily_allowance,
        workdays_count,
        workdays_prior,
        spent_prior,
        spent_today,
        rollover,
        available_today,
        remaining_today,
        remaining_workdays_after_today,
        remaining_monthly,
        monthly_total,
        grid,
        funding,
    }
}
