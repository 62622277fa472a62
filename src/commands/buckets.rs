// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{accounts, transactions};
use crate::metrics::{
    compute_bucket_metrics, rollover_balance, BucketMetrics, DayCell, DayStatus,
};
use crate::models::{Bucket, BucketKind, DayConstraint, Period, RolloverSnapshot};
use crate::utils::{
    fmt_money, id_for_account, id_for_bucket, id_for_category, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let now = Local::now().naive_local();
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub, now)?,
        Some(("edit", sub)) => edit(conn, sub, now)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("status", sub)) => status(conn, sub, now)?,
        _ => {}
    }
    Ok(())
}

fn link_categories(conn: &Connection, bucket_id: i64, names: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM bucket_categories WHERE bucket_id=?1",
        params![bucket_id],
    )?;
    for name in names.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let cat_id = id_for_category(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO bucket_categories(bucket_id, category_id) VALUES (?1, ?2)",
            params![bucket_id, cat_id],
        )?;
    }
    Ok(())
}

pub fn add(conn: &Connection, sub: &clap::ArgMatches, now: NaiveDateTime) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let kind_s = sub.get_one::<String>("kind").unwrap().as_str();
    let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;

    // Creation presets matching the three bucket types of the app UI.
    let (is_meal_tracker, preset_constraint, preset_color) = match kind_s {
        "meal-tracker" => (true, DayConstraint::Workdays, "#F97316"),
        "weekend-flex" => (false, DayConstraint::Weekends, "#8B5CF6"),
        _ => (false, DayConstraint::All, "#10B981"),
    };
    let period: Period = sub.get_one::<String>("period").unwrap().parse()?;
    let constraint = match sub.get_one::<String>("constraint") {
        Some(s) => s.parse()?,
        None => preset_constraint,
    };
    let color = sub
        .get_one::<String>("color")
        .map(String::as_str)
        .unwrap_or(preset_color);
    let rollover = sub.get_flag("rollover");
    let target_account_id = sub
        .get_one::<String>("account")
        .map(|n| id_for_account(conn, n))
        .transpose()?;

    conn.execute(
        "INSERT INTO buckets(name, limit_amount, period, day_constraint, rollover, is_meal_tracker, color, created_at, target_account_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            name,
            limit.to_string(),
            period.as_str(),
            constraint.as_str(),
            rollover,
            is_meal_tracker,
            color,
            now.date().format("%Y-%m-%d").to_string(),
            target_account_id
        ],
    )?;
    let bucket_id = conn.last_insert_rowid();
    if let Some(cats) = sub.get_one::<String>("categories") {
        link_categories(conn, bucket_id, cats)?;
    }

    if is_meal_tracker {
        println!("Created meal tracker '{}' ({} per workday)", name, fmt_money(&limit));
    } else {
        println!(
            "Created bucket '{}' ({} {}, {})",
            name,
            fmt_money(&limit),
            period,
            constraint
        );
    }
    Ok(())
}

/// Edits apply in place, with one exception owned here: when a meal
/// tracker's daily allowance changes, the rollover accrued so far is
/// computed at the old rate and frozen as a snapshot dated today, so the
/// new rate only applies from today forward.
pub fn edit(conn: &Connection, sub: &clap::ArgMatches, now: NaiveDateTime) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let bucket = load_bucket(conn, name)?;

    let new_limit = sub
        .get_one::<String>("limit")
        .map(|s| parse_decimal(s))
        .transpose()?;

    if let (
        BucketKind::MealTracker {
            daily_allowance,
            snapshot,
        },
        Some(limit),
    ) = (&bucket.kind, new_limit)
    {
        if limit != *daily_allowance {
            let txns = transactions::load_transactions(conn)?;
            let frozen = rollover_balance(
                bucket.id,
                *daily_allowance,
                snapshot.as_ref(),
                bucket.created_at,
                &txns,
                now,
            );
            conn.execute(
                "UPDATE buckets SET rollover_snapshot=?1, rollover_snapshot_date=?2 WHERE id=?3",
                params![
                    frozen.to_string(),
                    now.date().format("%Y-%m-%d").to_string(),
                    bucket.id
                ],
            )?;
            println!(
                "Allowance changed; rollover {} frozen as of {}",
                fmt_money(&frozen),
                now.date()
            );
        }
    }

    if let Some(limit) = new_limit {
        conn.execute(
            "UPDATE buckets SET limit_amount=?1 WHERE id=?2",
            params![limit.to_string(), bucket.id],
        )?;
    }
    if let Some(period) = sub.get_one::<String>("period") {
        let period: Period = period.parse()?;
        conn.execute(
            "UPDATE buckets SET period=?1 WHERE id=?2",
            params![period.as_str(), bucket.id],
        )?;
    }
    if let Some(constraint) = sub.get_one::<String>("constraint") {
        let constraint: DayConstraint = constraint.parse()?;
        conn.execute(
            "UPDATE buckets SET day_constraint=?1 WHERE id=?2",
            params![constraint.as_str(), bucket.id],
        )?;
    }
    if let Some(color) = sub.get_one::<String>("color") {
        conn.execute(
            "UPDATE buckets SET color=?1 WHERE id=?2",
            params![color, bucket.id],
        )?;
    }
    if let Some(account) = sub.get_one::<String>("account") {
        let account_id = id_for_account(conn, account)?;
        conn.execute(
            "UPDATE buckets SET target_account_id=?1 WHERE id=?2",
            params![account_id, bucket.id],
        )?;
    }
    if let Some(cats) = sub.get_one::<String>("categories") {
        link_categories(conn, bucket.id, cats)?;
    }
    if let Some(new_name) = sub.get_one::<String>("rename") {
        conn.execute(
            "UPDATE buckets SET name=?1 WHERE id=?2",
            params![new_name, bucket.id],
        )?;
    }
    println!("Updated bucket '{}'", name);
    Ok(())
}

#[derive(Serialize)]
struct BucketRow {
    name: String,
    kind: String,
    limit: String,
    period: String,
    constraint: String,
    categories: String,
    created: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let buckets = load_buckets(conn)?;
    let mut data = Vec::new();
    for b in &buckets {
        let mut stmt = conn.prepare(
            "SELECT c.name FROM bucket_categories bc JOIN categories c ON bc.category_id=c.id
             WHERE bc.bucket_id=?1 ORDER BY c.name",
        )?;
        let names: Vec<String> = stmt
            .query_map(params![b.id], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        let (kind, period, constraint) = match &b.kind {
            BucketKind::Standard {
                period, constraint, ..
            } => ("standard", period.as_str(), constraint.as_str()),
            BucketKind::MealTracker { .. } => ("meal tracker", "monthly", "workdays"),
        };
        data.push(BucketRow {
            name: b.name.clone(),
            kind: kind.to_string(),
            limit: fmt_money(&b.kind.limit()),
            period: period.to_string(),
            constraint: constraint.to_string(),
            categories: names.join(", "),
            created: b.created_at.map(|d| d.to_string()).unwrap_or_default(),
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .into_iter()
            .map(|r| {
                vec![
                    r.name,
                    r.kind,
                    r.limit,
                    r.period,
                    r.constraint,
                    r.categories,
                    r.created,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Kind", "Limit", "Period", "Constraint", "Categories", "Created"],
                rows
            )
        );
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let id = id_for_bucket(conn, name)?;
    conn.execute("DELETE FROM buckets WHERE id=?1", params![id])?;
    println!("Removed bucket '{}'", name);
    Ok(())
}

#[derive(Serialize)]
pub struct StatusReport {
    pub bucket: String,
    pub metrics: BucketMetrics,
}

pub fn status(conn: &Connection, sub: &clap::ArgMatches, now: NaiveDateTime) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let buckets = match sub.get_one::<String>("name") {
        Some(name) => vec![load_bucket(conn, name)?],
        None => load_buckets(conn)?,
    };
    let txns = transactions::load_transactions(conn)?;

    let mut reports = Vec::new();
    for bucket in &buckets {
        let account = match bucket.target_account_id {
            Some(id) => accounts::load_account(conn, id)?,
            None => None,
        };
        let metrics = compute_bucket_metrics(bucket, &txns, account.as_ref(), now);
        reports.push(StatusReport {
            bucket: bucket.name.clone(),
            metrics,
        });
    }

    if maybe_print_json(json_flag, jsonl_flag, &reports)? {
        return Ok(());
    }
    for report in &reports {
        render_status(report);
    }
    if reports.is_empty() {
        println!("No buckets yet");
    }
    Ok(())
}

fn render_grid(cells: &[DayCell]) -> String {
    cells
        .iter()
        .map(|c| match c.status {
            DayStatus::Full => '#',
            DayStatus::Partial => 'o',
            DayStatus::Empty if c.workday => '.',
            DayStatus::Empty => '_',
        })
        .collect()
}

fn render_status(report: &StatusReport) {
    match &report.metrics {
        BucketMetrics::Standard(m) => {
            println!("{}", report.bucket);
            println!(
                "  Spent     : {} ({} remaining)",
                fmt_money(&m.spent),
                fmt_money(&m.remaining)
            );
            if m.over_budget {
                println!("  [!] over budget by {}", fmt_money(&-m.remaining));
            }
        }
        BucketMetrics::MealTracker(m) => {
            println!("{} (meal tracker)", report.bucket);
            println!(
                "  Allowance : {} per workday, {} of {} workdays elapsed",
                fmt_money(&m.daily_allowance),
                m.workdays_prior,
                m.workdays_count
            );
            println!(
                "  Today     : spent {}, remaining {}",
                fmt_money(&m.spent_today),
                fmt_money(&m.remaining_today)
            );
            println!("  Rollover  : {}", fmt_money(&m.rollover));
            println!(
                "  Month     : spent {}, projected {}",
                fmt_money(&(m.spent_prior + m.spent_today)),
                fmt_money(&m.monthly_total)
            );
            println!("  Grid      : {}   (#=full o=partial .=workday _=weekend)", render_grid(&m.grid));
            if let Some(f) = &m.funding {
                if f.insufficient {
                    println!(
                        "  [!] linked account underfunded: balance {} < required {}",
                        fmt_money(&f.balance),
                        fmt_money(&f.required)
                    );
                }
            }
        }
    }
}

fn snapshot_from_columns(
    value: Option<String>,
    date: Option<String>,
) -> Option<RolloverSnapshot> {
    // Jointly present or ignored; a half-written pair is legacy data, not
    // an error.
    let value = value?.parse().ok()?;
    let date = parse_date(&date?).ok()?;
    Some(RolloverSnapshot { value, date })
}

struct BucketColumns {
    id: i64,
    name: String,
    limit: String,
    period: String,
    constraint: String,
    rollover: bool,
    is_meal_tracker: bool,
    color: String,
    created_at: Option<String>,
    target_account_id: Option<i64>,
    snapshot_value: Option<String>,
    snapshot_date: Option<String>,
}

const BUCKET_COLS: &str = "id, name, limit_amount, period, day_constraint, rollover, is_meal_tracker, color, created_at, target_account_id, rollover_snapshot, rollover_snapshot_date";

fn bucket_columns(r: &rusqlite::Row<'_>) -> rusqlite::Result<BucketColumns> {
    Ok(BucketColumns {
        id: r.get(0)?,
        name: r.get(1)?,
        limit: r.get(2)?,
        period: r.get(3)?,
        constraint: r.get(4)?,
        rollover: r.get(5)?,
        is_meal_tracker: r.get(6)?,
        color: r.get(7)?,
        created_at: r.get(8)?,
        target_account_id: r.get(9)?,
        snapshot_value: r.get(10)?,
        snapshot_date: r.get(11)?,
    })
}

fn assemble_bucket(conn: &Connection, cols: BucketColumns) -> Result<Bucket> {
    let limit = cols
        .limit
        .parse()
        .with_context(|| format!("Invalid limit '{}' for bucket '{}'", cols.limit, cols.name))?;
    let kind = if cols.is_meal_tracker {
        BucketKind::MealTracker {
            daily_allowance: limit,
            snapshot: snapshot_from_columns(cols.snapshot_value, cols.snapshot_date),
        }
    } else {
        BucketKind::Standard {
            period: cols.period.parse()?,
            constraint: cols.constraint.parse()?,
            limit,
        }
    };
    let created_at = cols.created_at.and_then(|s| parse_date(&s).ok());
    let mut stmt =
        conn.prepare("SELECT category_id FROM bucket_categories WHERE bucket_id=?1")?;
    let category_ids: Vec<i64> = stmt
        .query_map(params![cols.id], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(Bucket {
        id: cols.id,
        name: cols.name,
        kind,
        category_ids,
        color: cols.color,
        rollover: cols.rollover,
        created_at,
        target_account_id: cols.target_account_id,
    })
}

pub fn load_bucket(conn: &Connection, name: &str) -> Result<Bucket> {
    let cols = conn
        .query_row(
            &format!("SELECT {} FROM buckets WHERE name=?1", BUCKET_COLS),
            params![name],
            bucket_columns,
        )
        .optional()?
        .with_context(|| format!("Bucket '{}' not found", name))?;
    assemble_bucket(conn, cols)
}

pub fn load_buckets(conn: &Connection) -> Result<Vec<Bucket>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM buckets ORDER BY name", BUCKET_COLS))?;
    let rows = stmt.query_map([], bucket_columns)?;
    let mut buckets = Vec::new();
    for row in rows {
        buckets.push(assemble_bucket(conn, row?)?);
    }
    Ok(buckets)
}
