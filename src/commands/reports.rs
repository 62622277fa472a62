// Copyright (c) Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        Some(("daily", sub)) => daily(conn, sub)?,
        Some(("spend-by-category", sub)) => spend_by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7) AS month, kind, amount
         FROM transactions WHERE kind IN ('income','expense')
         ORDER BY date DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;

    // Transfers move money between accounts and are not cashflow.
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for row in rows {
        let (month, kind, amount_s) = row?;
        let amount: Decimal = amount_s
            .parse()
            .with_context(|| format!("Invalid amount '{}' in {}", amount_s, month))?;
        let entry = map.entry(month).or_insert((Decimal::ZERO, Decimal::ZERO));
        if kind == "income" {
            entry.0 += amount;
        } else {
            entry.1 += amount;
        }
    }
    let mut data = Vec::new();
    for (month, (income, expense)) in map.iter().rev().take(months) {
        data.push(vec![
            month.clone(),
            format!("{:.2}", income),
            format!("{:.2}", expense),
            format!("{:.2}", income - expense),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Net"], data)
        );
    }
    Ok(())
}

fn daily(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let mut stmt = conn.prepare(
        "SELECT substr(date,9,2) AS day, amount FROM transactions
         WHERE kind='expense' AND substr(date,1,7)=?1",
    )?;
    let rows = stmt.query_map([&month], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut map: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (day, amount_s) = row?;
        let amount: Decimal = amount_s
            .parse()
            .with_context(|| format!("Invalid amount '{}' on {}-{}", amount_s, month, day))?;
        *map.entry(day).or_insert(Decimal::ZERO) += amount;
    }
    let mut data = Vec::new();
    for (day, amount) in &map {
        data.push(vec![format!("{}-{}", month, day), format!("{:.2}", amount)]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Date", "Expense"], data));
    }
    Ok(())
}

fn spend_by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let mut stmt = conn.prepare(
        "SELECT c.name, t.amount FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.kind='expense' AND substr(t.date,1,7)=?1",
    )?;
    let rows = stmt.query_map([&month], |r| {
        Ok((r.get::<_, Option<String>>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (cat, amount_s) = row?;
        let cat = cat.unwrap_or_else(|| "(uncategorized)".into());
        let amount: Decimal = amount_s
            .parse()
            .with_context(|| format!("Invalid amount '{}' for {}", amount_s, cat))?;
        *agg.entry(cat).or_insert(Decimal::ZERO) += amount;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(cat, amount)| vec![cat, format!("{:.2}", amount)])
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}
