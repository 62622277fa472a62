// Copyright (c) Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use chrono::{Datelike, Local};
use rusqlite::Connection;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Dangling references from transactions
    for (issue, sql) in [
        (
            "missing_account",
            "SELECT t.id FROM transactions t LEFT JOIN accounts a ON t.account_id=a.id WHERE a.id IS NULL",
        ),
        (
            "missing_category",
            "SELECT t.id FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
             WHERE t.category_id IS NOT NULL AND c.id IS NULL",
        ),
        (
            "missing_bucket",
            "SELECT t.id FROM transactions t LEFT JOIN buckets b ON t.bucket_id=b.id
             WHERE t.bucket_id IS NOT NULL AND b.id IS NULL",
        ),
        (
            "transfer_no_target",
            "SELECT id FROM transactions WHERE kind='transfer' AND to_account_id IS NULL",
        ),
    ] {
        let mut stmt = conn.prepare(sql)?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            rows.push(vec![issue.into(), format!("transaction {}", id)]);
        }
    }

    // 2) Half-written snapshot pairs (the engine ignores these)
    let mut stmt = conn.prepare(
        "SELECT name FROM buckets
         WHERE (rollover_snapshot IS NULL) != (rollover_snapshot_date IS NULL)",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["snapshot_incomplete".into(), format!("bucket '{}'", name)]);
    }

    // 3) Snapshots dated outside the current month are stale: harmless to
    // the engine, but worth clearing on the next allowance edit.
    let now = Local::now().naive_local().date();
    let prefix = format!("{:04}-{:02}", now.year(), now.month());
    let mut stmt = conn.prepare(
        "SELECT name, rollover_snapshot_date FROM buckets
         WHERE rollover_snapshot_date IS NOT NULL AND substr(rollover_snapshot_date,1,7) != ?1",
    )?;
    let mut cur = stmt.query([&prefix])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        let date: String = r.get(1)?;
        rows.push(vec![
            "snapshot_stale".into(),
            format!("bucket '{}' frozen {}", name, date),
        ]);
    }

    // 4) Expenses in a bucket's linked categories but not linked to the
    // bucket itself: spend totals key by the explicit link, so these do
    // not count anywhere.
    let mut stmt = conn.prepare(
        "SELECT DISTINCT t.id, b.name FROM transactions t
         JOIN bucket_categories bc ON bc.category_id = t.category_id
         JOIN buckets b ON b.id = bc.bucket_id
         WHERE t.kind='expense' AND t.bucket_id IS NULL",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let bucket: String = r.get(1)?;
        rows.push(vec![
            "unlinked_bucket_expense".into(),
            format!("transaction {} matches categories of '{}'", id, bucket),
        ]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
