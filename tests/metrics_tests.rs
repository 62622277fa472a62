// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use dompet::calendar::is_workday;
use dompet::metrics::{
    compute_bucket_metrics, rollover_balance, sum_amount, BucketMetrics, DayStatus,
    MealTrackerMetrics, StandardMetrics,
};
use dompet::models::{
    Account, AccountKind, Bucket, BucketKind, DayConstraint, Period, RolloverSnapshot,
    Transaction, TransactionKind,
};
use rust_decimal::Decimal;

const BUCKET_ID: i64 = 7;

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn dt(year: i32, month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
    d(year, month, day).and_hms_opt(hour, min, 0).unwrap()
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn tx(id: i64, kind: TransactionKind, bucket: Option<i64>, date: NaiveDateTime, amount: i64) -> Transaction {
    Transaction {
        id,
        amount: dec(amount),
        kind,
        category_id: None,
        bucket_id: bucket,
        account_id: 1,
        to_account_id: None,
        date,
        note: None,
    }
}

fn expense(id: i64, date: NaiveDateTime, amount: i64) -> Transaction {
    tx(id, TransactionKind::Expense, Some(BUCKET_ID), date, amount)
}

fn meal_bucket(allowance: i64, snapshot: Option<RolloverSnapshot>, created_at: NaiveDate) -> Bucket {
    Bucket {
        id: BUCKET_ID,
        name: "Lunch".into(),
        kind: BucketKind::MealTracker {
            daily_allowance: dec(allowance),
            snapshot,
        },
        category_ids: vec![],
        color: "#F97316".into(),
        rollover: false,
        created_at: Some(created_at),
        target_account_id: None,
    }
}

fn standard_bucket(period: Period, constraint: DayConstraint, limit: i64) -> Bucket {
    Bucket {
        id: BUCKET_ID,
        name: "Groceries".into(),
        kind: BucketKind::Standard {
            period,
            constraint,
            limit: dec(limit),
        },
        category_ids: vec![],
        color: "#10B981".into(),
        rollover: false,
        created_at: Some(d(2025, 1, 1)),
        target_account_id: None,
    }
}

fn account(id: i64, balance: i64) -> Account {
    Account {
        id,
        name: "BCA".into(),
        kind: AccountKind::Bank,
        balance: dec(balance),
        color: "#3B82F6".into(),
    }
}

fn meal(metrics: BucketMetrics) -> MealTrackerMetrics {
    match metrics {
        BucketMetrics::MealTracker(m) => m,
        BucketMetrics::Standard(_) => panic!("expected meal tracker metrics"),
    }
}

fn standard(metrics: BucketMetrics) -> StandardMetrics {
    match metrics {
        BucketMetrics::Standard(m) => m,
        BucketMetrics::MealTracker(_) => panic!("expected standard metrics"),
    }
}

// September 2025: the 1st is a Monday, 30 days, 22 workdays, weekends on
// 6/7, 13/14, 20/21, 27/28.

#[test]
fn no_spend_banks_prior_workday_allowance() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let now = dt(2025, 9, 10, 12, 0); // Wednesday; 7 workdays before it
    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));

    assert_eq!(m.workdays_count, 22);
    assert_eq!(m.workdays_prior, 7);
    assert_eq!(m.rollover, dec(350_000));
    assert_eq!(m.spent_today, Decimal::ZERO);
    assert_eq!(m.available_today, dec(400_000));
    assert_eq!(m.remaining_today, dec(400_000));
    assert_eq!(m.remaining_workdays_after_today, 14);
    assert_eq!(m.remaining_monthly, dec(1_100_000));
    // With nothing spent the projection is exactly allowance x workdays
    assert_eq!(m.monthly_total, dec(22 * 50_000));
}

#[test]
fn prior_spend_reduces_rollover() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let txns = vec![expense(1, dt(2025, 9, 5, 12, 30), 70_000)]; // Friday
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent_prior, dec(70_000));
    assert_eq!(m.rollover, dec(7 * 50_000 - 70_000));
    assert_eq!(m.remaining_today, dec(50_000 + 280_000));
}

#[test]
fn snapshot_resumes_accrual_at_the_new_rate() {
    // Rate went 50000 -> 80000 on Sep 15; rollover 120000 frozen then.
    let snapshot = RolloverSnapshot {
        value: dec(120_000),
        date: d(2025, 9, 15),
    };
    let bucket = meal_bucket(80_000, Some(snapshot), d(2025, 9, 1));
    let now = dt(2025, 9, 19, 9, 0); // Friday; workdays 15..18 since snapshot
    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));

    assert_eq!(m.rollover, dec(120_000 + 4 * 80_000));
}

#[test]
fn snapshot_spend_window_is_half_open() {
    let snapshot = RolloverSnapshot {
        value: dec(100_000),
        date: d(2025, 9, 15),
    };
    let bucket = meal_bucket(80_000, Some(snapshot), d(2025, 9, 1));
    let txns = vec![
        expense(1, dt(2025, 9, 14, 20, 0), 999_999), // before snapshot: frozen value covers it
        expense(2, dt(2025, 9, 15, 0, 0), 30_000),   // snapshot midnight: counted
        expense(3, dt(2025, 9, 19, 0, 0), 40_000),   // today midnight: excluded
    ];
    let now = dt(2025, 9, 19, 9, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.rollover, dec(100_000 + 4 * 80_000 - 30_000));
}

#[test]
fn stale_snapshot_is_ignored() {
    let snapshot = RolloverSnapshot {
        value: dec(999_999),
        date: d(2025, 8, 15),
    };
    let bucket = meal_bucket(50_000, Some(snapshot), d(2025, 9, 1));
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));

    // Recomputed from scratch for the whole elapsed month
    assert_eq!(m.rollover, dec(7 * 50_000));
}

#[test]
fn bucket_created_mid_month_accrues_from_creation() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 8)); // Monday
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));

    assert_eq!(m.workdays_count, 17);
    assert_eq!(m.workdays_prior, 2); // the 8th and 9th
    assert_eq!(m.rollover, dec(2 * 50_000));
    assert_eq!(m.remaining_workdays_after_today, 14);
}

#[test]
fn spent_today_uses_the_calendar_day_window() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let txns = vec![
        expense(1, dt(2025, 9, 9, 23, 59), 10_000),
        expense(2, dt(2025, 9, 10, 0, 0), 20_000),
        expense(3, dt(2025, 9, 10, 21, 0), 15_000),
    ];
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent_today, dec(35_000));
    assert_eq!(m.spent_prior, dec(10_000));
}

#[test]
fn rollover_is_not_clamped_when_overspent() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let txns = vec![expense(1, dt(2025, 9, 2, 12, 0), 500_000)];
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.rollover, dec(350_000 - 500_000));
    assert_eq!(m.remaining_today, dec(50_000 + 350_000 - 500_000));
}

#[test]
fn other_kinds_and_other_buckets_never_count() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let txns = vec![
        tx(1, TransactionKind::Income, Some(BUCKET_ID), dt(2025, 9, 2, 9, 0), 70_000),
        tx(2, TransactionKind::Transfer, Some(BUCKET_ID), dt(2025, 9, 3, 9, 0), 70_000),
        tx(3, TransactionKind::Expense, Some(999), dt(2025, 9, 4, 9, 0), 70_000),
        tx(4, TransactionKind::Expense, None, dt(2025, 9, 5, 9, 0), 70_000),
    ];
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent_prior, Decimal::ZERO);
    assert_eq!(m.rollover, dec(350_000));
}

// -- Standard buckets ------------------------------------------------------

#[test]
fn weekly_workday_bucket_skips_weekend_spend() {
    let bucket = standard_bucket(Period::Weekly, DayConstraint::Workdays, 500_000);
    let txns = vec![
        expense(1, dt(2025, 9, 15, 12, 0), 100_000), // Monday
        expense(2, dt(2025, 9, 16, 12, 0), 100_000), // Tuesday
        expense(3, dt(2025, 9, 20, 12, 0), 100_000), // Saturday
    ];
    let now = dt(2025, 9, 20, 18, 0); // same week (Sun Sep 14 .. Sat Sep 20)
    let m = standard(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent, dec(200_000));
    assert_eq!(m.remaining, dec(300_000));
    assert!(!m.over_budget);
}

#[test]
fn monthly_bucket_counts_only_the_current_month() {
    let bucket = standard_bucket(Period::Monthly, DayConstraint::All, 300_000);
    let txns = vec![
        expense(1, dt(2025, 8, 30, 12, 0), 999_000), // last month
        expense(2, dt(2025, 9, 2, 12, 0), 100_000),
        expense(3, dt(2025, 9, 18, 12, 0), 250_000),
    ];
    let now = dt(2025, 9, 25, 8, 0);
    let m = standard(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent, dec(350_000));
    assert_eq!(m.remaining, dec(-50_000));
    assert!(m.over_budget);
}

#[test]
fn daily_bucket_window_is_today_only() {
    let bucket = standard_bucket(Period::Daily, DayConstraint::All, 50_000);
    let txns = vec![
        expense(1, dt(2025, 9, 9, 23, 59), 40_000),
        expense(2, dt(2025, 9, 10, 0, 0), 30_000),
    ];
    let now = dt(2025, 9, 10, 19, 0);
    let m = standard(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent, dec(30_000));
}

#[test]
fn weekend_bucket_counts_only_weekends() {
    let bucket = standard_bucket(Period::Monthly, DayConstraint::Weekends, 400_000);
    let txns = vec![
        expense(1, dt(2025, 9, 6, 12, 0), 150_000),  // Saturday
        expense(2, dt(2025, 9, 10, 12, 0), 999_000), // Wednesday
        expense(3, dt(2025, 9, 21, 12, 0), 100_000), // Sunday
    ];
    let now = dt(2025, 9, 25, 8, 0);
    let m = standard(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.spent, dec(250_000));
}

// -- Funding check ---------------------------------------------------------

#[test]
fn underfunded_account_is_flagged() {
    // Crafted so remaining_monthly lands on exactly 250000 at month end:
    // 21 prior workdays x 50000 = 1050000 allowance, 850000 spent.
    let mut bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    bucket.target_account_id = Some(3);
    let txns = vec![expense(1, dt(2025, 9, 10, 12, 0), 850_000)];
    let now = dt(2025, 9, 30, 12, 0); // Tuesday, the last workday
    let acct = account(3, 100_000);
    let m = meal(compute_bucket_metrics(&bucket, &txns, Some(&acct), now));

    assert_eq!(m.remaining_monthly, dec(250_000));
    let funding = m.funding.expect("funding check should run");
    assert_eq!(funding.required, dec(250_000));
    assert!(funding.insufficient);
}

#[test]
fn funding_requirement_is_floored_at_zero() {
    let mut bucket = meal_bucket(10_000, None, d(2025, 9, 1));
    bucket.target_account_id = Some(3);
    let txns = vec![expense(1, dt(2025, 9, 10, 12, 0), 10_000_000)];
    let now = dt(2025, 9, 30, 12, 0);
    let acct = account(3, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, Some(&acct), now));

    assert!(m.remaining_monthly < Decimal::ZERO);
    let funding = m.funding.expect("funding check should run");
    assert_eq!(funding.required, Decimal::ZERO);
    assert!(!funding.insufficient);
}

#[test]
fn funding_check_skipped_without_matching_account() {
    let mut bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    bucket.target_account_id = Some(3);
    let now = dt(2025, 9, 10, 12, 0);

    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));
    assert!(m.funding.is_none());

    // An account other than the linked one is not compared
    let other = account(4, 1);
    let m = meal(compute_bucket_metrics(&bucket, &[], Some(&other), now));
    assert!(m.funding.is_none());
}

// -- Day grid --------------------------------------------------------------

#[test]
fn grid_has_one_cell_per_calendar_day() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &[], None, now));

    assert_eq!(m.grid.len(), 30);
    for (i, cell) in m.grid.iter().enumerate() {
        assert_eq!(cell.day, i as u32 + 1);
        assert_eq!(cell.workday, is_workday(d(2025, 9, cell.day)));
        assert_eq!(cell.status, DayStatus::Empty);
    }
}

#[test]
fn grid_classifies_partial_and_full_days() {
    let bucket = meal_bucket(50_000, None, d(2025, 9, 1));
    let txns = vec![
        expense(1, dt(2025, 9, 3, 12, 0), 20_000),
        expense(2, dt(2025, 9, 4, 12, 0), 50_000), // exactly the allowance
        expense(3, dt(2025, 9, 5, 12, 0), 80_000),
    ];
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.grid[2].status, DayStatus::Partial);
    assert_eq!(m.grid[3].status, DayStatus::Full);
    assert_eq!(m.grid[4].status, DayStatus::Full);
    assert_eq!(m.grid[5].status, DayStatus::Empty);
}

#[test]
fn zero_allowance_marks_any_spend_full() {
    let bucket = meal_bucket(0, None, d(2025, 9, 1));
    let txns = vec![expense(1, dt(2025, 9, 3, 12, 0), 5_000)];
    let now = dt(2025, 9, 10, 12, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.grid[2].status, DayStatus::Full);
    assert_eq!(m.grid[3].status, DayStatus::Empty);
}

// -- Degenerate months -----------------------------------------------------

#[test]
fn zero_workdays_collapses_the_projection() {
    // November 2025 ends on Sat 29 / Sun 30; a bucket created on the 29th
    // never sees a workday.
    let bucket = meal_bucket(50_000, None, d(2025, 11, 29));
    let txns = vec![expense(1, dt(2025, 11, 29, 12, 0), 25_000)];
    let now = dt(2025, 11, 30, 10, 0);
    let m = meal(compute_bucket_metrics(&bucket, &txns, None, now));

    assert_eq!(m.workdays_count, 0);
    assert_eq!(m.workdays_prior, 0);
    assert_eq!(m.remaining_workdays_after_today, 0);
    assert_eq!(m.rollover, dec(-25_000));
    assert_eq!(m.monthly_total, m.spent_prior + m.spent_today + m.remaining_monthly);
}

// -- Properties ------------------------------------------------------------

#[test]
fn spend_is_additive_over_split_windows() {
    let txns = vec![
        expense(1, dt(2025, 9, 2, 9, 0), 10_000),
        expense(2, dt(2025, 9, 10, 0, 0), 20_000), // exactly on the split point
        expense(3, dt(2025, 9, 20, 17, 0), 30_000),
    ];
    let window = |a: NaiveDateTime, b: NaiveDateTime| {
        sum_amount(&txns, |t| t.date >= a && t.date < b)
    };
    let start = dt(2025, 9, 1, 0, 0);
    let split = dt(2025, 9, 10, 0, 0);
    let end = dt(2025, 10, 1, 0, 0);

    assert_eq!(window(start, end), window(start, split) + window(split, end));
    assert_eq!(window(start, end), dec(60_000));
}

#[test]
fn rollover_advances_one_day_at_a_time() {
    let allowance = dec(50_000);
    let txns = vec![
        expense(1, dt(2025, 9, 3, 12, 0), 30_000),
        expense(2, dt(2025, 9, 8, 12, 0), 80_000),
    ];
    for day in 2..=12 {
        let today = rollover_balance(BUCKET_ID, allowance, None, None, &txns, dt(2025, 9, day, 8, 0));
        let yesterday =
            rollover_balance(BUCKET_ID, allowance, None, None, &txns, dt(2025, 9, day - 1, 8, 0));
        let accrued = if is_workday(d(2025, 9, day - 1)) {
            allowance
        } else {
            Decimal::ZERO
        };
        let spent_on_prev = sum_amount(&txns, |t| {
            t.date >= dt(2025, 9, day - 1, 0, 0) && t.date < dt(2025, 9, day, 0, 0)
        });
        assert_eq!(today, yesterday + accrued - spent_on_prev, "day {}", day);
    }
}

#[test]
fn snapshotting_at_a_constant_rate_changes_nothing() {
    let allowance = dec(60_000);
    let txns = vec![
        expense(1, dt(2025, 9, 3, 12, 0), 30_000),
        expense(2, dt(2025, 9, 10, 12, 0), 45_000),
        expense(3, dt(2025, 9, 16, 12, 0), 120_000),
    ];
    let snap_day = dt(2025, 9, 12, 9, 0);
    let later = dt(2025, 9, 24, 9, 0);

    let frozen = rollover_balance(BUCKET_ID, allowance, None, None, &txns, snap_day);
    let snapshot = RolloverSnapshot {
        value: frozen,
        date: d(2025, 9, 12),
    };
    let via_snapshot =
        rollover_balance(BUCKET_ID, allowance, Some(&snapshot), None, &txns, later);
    let from_scratch = rollover_balance(BUCKET_ID, allowance, None, None, &txns, later);

    assert_eq!(via_snapshot, from_scratch);
}

#[test]
fn summation_is_order_independent() {
    let mut txns = vec![
        expense(1, dt(2025, 9, 2, 9, 0), 12_345),
        expense(2, dt(2025, 9, 3, 9, 0), 67_890),
        expense(3, dt(2025, 9, 4, 9, 0), 11_111),
    ];
    let forward = sum_amount(&txns, |_| true);
    txns.reverse();
    let backward = sum_amount(&txns, |_| true);
    assert_eq!(forward, backward);
}
