// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dompet::{cli, commands::transactions, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO accounts(name, kind, balance) VALUES ('Wallet','cash','100000')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO accounts(name, kind, balance) VALUES ('Bank','bank','500000')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO categories(name, kind) VALUES ('Food','expense')",
        [],
    )
    .unwrap();
    conn
}

fn run_tx(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args.iter().copied());
    if let Some(("tx", sub)) = matches.subcommand() {
        transactions::handle(conn, sub)
    } else {
        panic!("tx command not parsed");
    }
}

fn balance(conn: &Connection, name: &str) -> String {
    conn.query_row(
        "SELECT balance FROM accounts WHERE name=?1",
        [name],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn expense_posts_against_the_account() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "expense", "--amount", "30000", "--account",
            "Wallet", "--category", "Food", "--date", "2025-09-05",
        ],
    )
    .unwrap();
    assert_eq!(balance(&conn, "Wallet"), "70000");
}

#[test]
fn income_posts_into_the_account() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "income", "--amount", "250000", "--account",
            "Bank", "--date", "2025-09-01",
        ],
    )
    .unwrap();
    assert_eq!(balance(&conn, "Bank"), "750000");
}

#[test]
fn transfer_moves_between_accounts() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "transfer", "--amount", "50000", "--account",
            "Wallet", "--to-account", "Bank", "--date", "2025-09-02",
        ],
    )
    .unwrap();
    assert_eq!(balance(&conn, "Wallet"), "50000");
    assert_eq!(balance(&conn, "Bank"), "550000");
}

#[test]
fn deleting_a_transaction_reverts_its_posting() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--amount", "30000", "--account", "Wallet", "--date",
            "2025-09-05",
        ],
    )
    .unwrap();
    assert_eq!(balance(&conn, "Wallet"), "70000");

    run_tx(&mut conn, &["dompet", "tx", "rm", "--id", "1"]).unwrap();
    assert_eq!(balance(&conn, "Wallet"), "100000");
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 0);
}

#[test]
fn deleting_a_transfer_reverts_both_sides() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "transfer", "--amount", "50000", "--account",
            "Wallet", "--to-account", "Bank", "--date", "2025-09-02",
        ],
    )
    .unwrap();
    run_tx(&mut conn, &["dompet", "tx", "rm", "--id", "1"]).unwrap();
    assert_eq!(balance(&conn, "Wallet"), "100000");
    assert_eq!(balance(&conn, "Bank"), "500000");
}

#[test]
fn transfer_requires_a_target_account() {
    let mut conn = setup();
    let err = run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "transfer", "--amount", "50000", "--account",
            "Wallet",
        ],
    );
    assert!(err.is_err());
    assert_eq!(balance(&conn, "Wallet"), "100000");
}

#[test]
fn transfers_do_not_take_a_category() {
    let mut conn = setup();
    let err = run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "transfer", "--amount", "50000", "--account",
            "Wallet", "--to-account", "Bank", "--category", "Food",
        ],
    );
    assert!(err.is_err());
}

#[test]
fn only_expenses_link_to_buckets() {
    let mut conn = setup();
    let err = run_tx(
        &mut conn,
        &[
            "dompet", "tx", "add", "--kind", "income", "--amount", "50000", "--account",
            "Bank", "--bucket", "Lunch",
        ],
    );
    assert!(err.is_err());
}

#[test]
fn list_limit_respected() {
    let mut conn = setup();
    for day in ["2025-01-01", "2025-01-02", "2025-01-03"] {
        run_tx(
            &mut conn,
            &[
                "dompet", "tx", "add", "--amount", "10000", "--account", "Wallet", "--date",
                day,
            ],
        )
        .unwrap();
    }
    let matches = cli::build_cli().get_matches_from(["dompet", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert!(rows[0].date.starts_with("2025-01-03"));
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn list_filters_by_account() {
    let mut conn = setup();
    run_tx(
        &mut conn,
        &["dompet", "tx", "add", "--amount", "10000", "--account", "Wallet", "--date", "2025-09-01"],
    )
    .unwrap();
    run_tx(
        &mut conn,
        &["dompet", "tx", "add", "--amount", "20000", "--account", "Bank", "--date", "2025-09-02"],
    )
    .unwrap();
    let matches =
        cli::build_cli().get_matches_from(["dompet", "tx", "list", "--account", "Bank"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].account, "Bank");
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}
