// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, AccountKind};
use crate::utils::{fmt_money, id_for_account, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: AccountKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let color = sub.get_one::<String>("color").unwrap();
            conn.execute(
                "INSERT INTO accounts(name, kind, balance, color) VALUES (?1, ?2, ?3, ?4)",
                params![name, kind.as_str(), balance.to_string(), color],
            )?;
            println!("Added account '{}' ({}, {})", name, kind, fmt_money(&balance));
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let accounts = load_accounts(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &accounts)? {
                let rows = accounts
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            a.kind.to_string(),
                            fmt_money(&a.balance),
                            a.color.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Name", "Kind", "Balance", "Color"], rows)
                );
            }
        }
        Some(("set-balance", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let id = id_for_account(conn, name)?;
            conn.execute(
                "UPDATE accounts SET balance=?1 WHERE id=?2",
                params![amount.to_string(), id],
            )?;
            println!("Balance of '{}' set to {}", name, fmt_money(&amount));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("DELETE FROM accounts WHERE name=?1", params![name])?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn row_to_account(r: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String, String)> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
    ))
}

fn parse_account(raw: (i64, String, String, String, String)) -> Result<Account> {
    let (id, name, kind_s, balance_s, color) = raw;
    let kind: AccountKind = kind_s.parse()?;
    let balance = balance_s
        .parse()
        .with_context(|| format!("Invalid balance '{}' for account '{}'", balance_s, name))?;
    Ok(Account {
        id,
        name,
        kind,
        balance,
        color,
    })
}

pub fn load_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt =
        conn.prepare("SELECT id, name, kind, balance, color FROM accounts ORDER BY name")?;
    let rows = stmt.query_map([], row_to_account)?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(parse_account(row?)?);
    }
    Ok(accounts)
}

pub fn load_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let raw = conn
        .query_row(
            "SELECT id, name, kind, balance, color FROM accounts WHERE id=?1",
            params![id],
            row_to_account,
        )
        .optional()?;
    raw.map(parse_account).transpose()
}
