// Copyright (c) Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CategoryKind;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Serialize)]
pub struct CategoryRow {
    pub name: String,
    pub kind: String,
    pub color: String,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: CategoryKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let color = sub.get_one::<String>("color").unwrap();
            conn.execute(
                "INSERT INTO categories(name, kind, color) VALUES (?1, ?2, ?3)",
                params![name, kind.as_str(), color],
            )?;
            println!("Added category '{}' ({})", name, kind);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let mut stmt =
                conn.prepare("SELECT name, kind, color FROM categories ORDER BY kind, name")?;
            let rows = stmt.query_map([], |r| {
                Ok(CategoryRow {
                    name: r.get(0)?,
                    kind: r.get(1)?,
                    color: r.get(2)?,
                })
            })?;
            let mut data = Vec::new();
            for row in rows {
                data.push(row?);
            }
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| vec![c.name, c.kind, c.color])
                    .collect();
                println!("{}", pretty_table(&["Category", "Kind", "Color"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("DELETE FROM categories WHERE name=?1", params![name])?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
