// Copyright (c) 2025 Dompet Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn with_json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Emit pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Emit one JSON object per line"),
    )
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts (bank, cash, e-wallet)")
        .subcommand(
            Command::new("add")
                .about("Add an account")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["bank", "cash", "ewallet"])
                        .default_value("bank"),
                )
                .arg(
                    Arg::new("balance")
                        .long("balance")
                        .default_value("0")
                        .help("Opening balance"),
                )
                .arg(Arg::new("color").long("color").default_value("#10B981")),
        )
        .subcommand(with_json_flags(
            Command::new("list").about("List accounts with balances"),
        ))
        .subcommand(
            Command::new("set-balance")
                .about("Overwrite an account balance (manual adjustment)")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("amount").long("amount").required(true)),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove an account and its transactions")
                .arg(Arg::new("name").long("name").required(true)),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage income/expense categories")
        .subcommand(
            Command::new("add")
                .about("Add a category")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["income", "expense"])
                        .default_value("expense"),
                )
                .arg(Arg::new("color").long("color").default_value("#6B7280")),
        )
        .subcommand(with_json_flags(Command::new("list").about("List categories")))
        .subcommand(
            Command::new("rm")
                .about("Remove a category")
                .arg(Arg::new("name").long("name").required(true)),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and inspect transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction and post it to account balances")
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["income", "expense", "transfer"])
                        .default_value("expense"),
                )
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("YYYY-MM-DD [HH:MM[:SS]]; defaults to now"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("account").long("account").required(true))
                .arg(
                    Arg::new("to-account")
                        .long("to-account")
                        .help("Target account (transfers only)"),
                )
                .arg(Arg::new("category").long("category"))
                .arg(
                    Arg::new("bucket")
                        .long("bucket")
                        .help("Link this expense to a budget bucket"),
                )
                .arg(Arg::new("note").long("note")),
        )
        .subcommand(with_json_flags(
            Command::new("list")
                .about("List transactions")
                .arg(Arg::new("month").long("month").help("YYYY-MM"))
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("bucket").long("bucket"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["income", "expense", "transfer"]),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction and revert its posting")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                ),
        )
}

fn bucket_cmd() -> Command {
    Command::new("bucket")
        .about("Manage budget buckets and meal trackers")
        .subcommand(
            Command::new("add")
                .about("Create a bucket")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .value_parser(["standard", "meal-tracker", "weekend-flex"])
                        .default_value("standard"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .required(true)
                        .help("Period limit, or daily allowance for meal trackers"),
                )
                .arg(
                    Arg::new("period")
                        .long("period")
                        .value_parser(["daily", "weekly", "monthly"])
                        .default_value("monthly"),
                )
                .arg(
                    Arg::new("constraint")
                        .long("constraint")
                        .value_parser(["all", "workdays", "weekends"]),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .help("Comma-separated category names to link"),
                )
                .arg(Arg::new("color").long("color"))
                .arg(
                    Arg::new("account")
                        .long("account")
                        .help("Account watched by the funding check"),
                )
                .arg(
                    Arg::new("rollover")
                        .long("rollover")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit a bucket; changing a meal tracker's allowance freezes its rollover")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("limit").long("limit"))
                .arg(
                    Arg::new("period")
                        .long("period")
                        .value_parser(["daily", "weekly", "monthly"]),
                )
                .arg(
                    Arg::new("constraint")
                        .long("constraint")
                        .value_parser(["all", "workdays", "weekends"]),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .help("Comma-separated category names (replaces links)"),
                )
                .arg(Arg::new("color").long("color"))
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("rename").long("rename")),
        )
        .subcommand(with_json_flags(Command::new("list").about("List buckets")))
        .subcommand(
            Command::new("rm")
                .about("Remove a bucket")
                .arg(Arg::new("name").long("name").required(true)),
        )
        .subcommand(with_json_flags(
            Command::new("status")
                .about("Spend, remaining, rollover, and projection per bucket")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Single bucket; defaults to all"),
                ),
        ))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Summaries over recorded transactions")
        .subcommand(with_json_flags(
            Command::new("cashflow")
                .about("Income and expense totals per month")
                .arg(
                    Arg::new("months")
                        .long("months")
                        .value_parser(value_parser!(usize))
                        .default_value("12"),
                ),
        ))
        .subcommand(with_json_flags(
            Command::new("daily")
                .about("Expense total per day of one month")
                .arg(Arg::new("month").long("month").required(true)),
        ))
        .subcommand(with_json_flags(
            Command::new("spend-by-category")
                .about("Expense totals by category for one month")
                .arg(Arg::new("month").long("month").required(true)),
        ))
}

pub fn build_cli() -> Command {
    Command::new("dompet")
        .about("Personal finance tracker with bucket budgeting and meal-tracker allowances")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialize the database and print its location"))
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(bucket_cmd())
        .subcommand(report_cmd())
        .subcommand(Command::new("doctor").about("Check stored data for consistency issues"))
}
