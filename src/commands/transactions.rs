// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Transaction, TransactionKind};
use crate::utils::{
    fmt_money, id_for_account, id_for_bucket, id_for_category, maybe_print_json, parse_datetime,
    parse_decimal, pretty_table,
};
use anyhow::{bail, Context, Result};
use chrono::Local;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn balance_of(conn: &Connection, account_id: i64) -> Result<Decimal> {
    let s: String = conn.query_row(
        "SELECT balance FROM accounts WHERE id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    s.parse()
        .with_context(|| format!("Invalid balance '{}' for account id {}", s, account_id))
}

fn write_balance(conn: &Connection, account_id: i64, balance: Decimal) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![balance.to_string(), account_id],
    )?;
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount < Decimal::ZERO {
        bail!("Amount must be non-negative; use --kind to pick the direction");
    }
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_datetime(s)?,
        None => Local::now().naive_local(),
    };
    let account_name = sub.get_one::<String>("account").unwrap();
    let account_id = id_for_account(conn, account_name)?;

    let to_account_id = match (kind, sub.get_one::<String>("to-account")) {
        (TransactionKind::Transfer, Some(name)) => {
            let id = id_for_account(conn, name)?;
            if id == account_id {
                bail!("Transfer source and target must differ");
            }
            Some(id)
        }
        (TransactionKind::Transfer, None) => bail!("Transfers require --to-account"),
        (_, Some(_)) => bail!("--to-account only applies to transfers"),
        (_, None) => None,
    };

    let category_id = match sub.get_one::<String>("category") {
        Some(name) if kind == TransactionKind::Transfer => {
            bail!("Transfers do not take a category ('{}' given)", name)
        }
        Some(name) => Some(id_for_category(conn, name)?),
        None => None,
    };

    let bucket_id = match sub.get_one::<String>("bucket") {
        Some(name) if kind != TransactionKind::Expense => {
            bail!("Only expenses can be linked to a bucket ('{}' given)", name)
        }
        Some(name) => Some(id_for_bucket(conn, name)?),
        None => None,
    };

    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    // Post the transaction and its balance deltas atomically.
    let tx = conn.transaction()?;
    let balance = balance_of(&tx, account_id)?;
    let new_balance = match kind {
        TransactionKind::Income => balance + amount,
        TransactionKind::Expense | TransactionKind::Transfer => balance - amount,
    };
    write_balance(&tx, account_id, new_balance)?;
    if let Some(to_id) = to_account_id {
        let to_balance = balance_of(&tx, to_id)?;
        write_balance(&tx, to_id, to_balance + amount)?;
    }
    tx.execute(
        "INSERT INTO transactions(date, kind, amount, account_id, to_account_id, category_id, bucket_id, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            date.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind.as_str(),
            amount.to_string(),
            account_id,
            to_account_id,
            category_id,
            bucket_id,
            note
        ],
    )?;
    tx.commit()?;

    println!(
        "Recorded {} {} on {} (acct: {})",
        kind,
        fmt_money(&amount),
        date.format("%Y-%m-%d"),
        account_name
    );
    Ok(())
}

fn rm(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();

    let tx = conn.transaction()?;
    let (kind_s, amount_s, account_id, to_account_id): (String, String, i64, Option<i64>) = tx
        .query_row(
            "SELECT kind, amount, account_id, to_account_id FROM transactions WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .with_context(|| format!("Transaction {} not found", id))?;
    let kind: TransactionKind = kind_s.parse()?;
    let amount: Decimal = amount_s
        .parse()
        .with_context(|| format!("Invalid amount '{}' in transaction {}", amount_s, id))?;

    // Undo the posting before deleting the row.
    let balance = balance_of(&tx, account_id)?;
    let restored = match kind {
        TransactionKind::Income => balance - amount,
        TransactionKind::Expense | TransactionKind::Transfer => balance + amount,
    };
    write_balance(&tx, account_id, restored)?;
    if kind == TransactionKind::Transfer {
        if let Some(to_id) = to_account_id {
            let to_balance = balance_of(&tx, to_id)?;
            write_balance(&tx, to_id, to_balance - amount)?;
        }
    }
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;

    println!("Deleted transaction {} and reverted its posting", id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    r.account.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.bucket.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Kind", "Account", "Amount", "Category", "Bucket", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub account: String,
    pub amount: String,
    pub category: String,
    pub bucket: String,
    pub note: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, a.name, t.amount, c.name, b.name, t.note
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         LEFT JOIN buckets b ON t.bucket_id=b.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    if let Some(bucket) = sub.get_one::<String>("bucket") {
        sql.push_str(" AND b.name=?");
        params_vec.push(bucket.into());
    }
    if let Some(kind) = sub.get_one::<String>("kind") {
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let account: Option<String> = r.get(3)?;
        let amount: String = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        let bucket: Option<String> = r.get(6)?;
        let note: Option<String> = r.get(7)?;
        data.push(TransactionRow {
            id,
            date,
            kind,
            account: account.unwrap_or_default(),
            amount,
            category: category.unwrap_or_default(),
            bucket: bucket.unwrap_or_default(),
            note: note.unwrap_or_default(),
        });
    }
    Ok(data)
}

/// One consistent snapshot of the whole transaction table, parsed into
/// domain records for the metrics engine.
pub fn load_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, kind, category_id, bucket_id, account_id, to_account_id, date, note
         FROM transactions ORDER BY date, id",
    )?;
    let mut rows = stmt.query([])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let kind_s: String = r.get(2)?;
        let amount: Decimal = amount_s
            .parse()
            .with_context(|| format!("Invalid amount '{}' in transaction {}", amount_s, id))?;
        let kind: TransactionKind = kind_s.parse()?;
        let date_s: String = r.get(7)?;
        let date = parse_datetime(&date_s)
            .with_context(|| format!("Invalid date '{}' in transaction {}", date_s, id))?;
        data.push(Transaction {
            id,
            amount,
            kind,
            category_id: r.get(3)?,
            bucket_id: r.get(4)?,
            account_id: r.get(5)?,
            to_account_id: r.get(6)?,
            date,
            note: r.get(8)?,
        });
    }
    Ok(data)
}
