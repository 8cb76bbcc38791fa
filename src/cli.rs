// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn amount_arg(required: bool) -> Arg {
    Arg::new("amount")
        .long("amount")
        .required(required)
        .allow_hyphen_values(true)
        .help("Amount in major units, e.g. 12.50")
}

fn direction_arg() -> Arg {
    Arg::new("direction")
        .long("direction")
        .requires("category")
        .help("income | expense, picks between categories sharing a name")
}

fn account_commands() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .default_value("checking")
                        .help("checking | cash | investment"),
                )
                .arg(
                    Arg::new("initial")
                        .long("initial")
                        .default_value("0")
                        .allow_hyphen_values(true)
                        .help("Opening balance, may be negative"),
                ),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true)))
        .subcommand(json_flags(
            Command::new("balance").arg(
                Arg::new("name")
                    .long("name")
                    .help("Only this account"),
            ),
        ))
}

fn category_commands() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("direction")
                        .long("direction")
                        .required(true)
                        .help("income | expense"),
                )
                .arg(
                    Arg::new("budget-class")
                        .long("budget-class")
                        .help("essential-fixed | essential-variable | discretionary"),
                )
                .arg(Arg::new("color").long("color").help("#RRGGBB")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("rm")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("direction").long("direction")),
        )
}

fn tx_commands() -> Command {
    Command::new("tx")
        .about("Record and inspect transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("account").long("account").required(true))
                .arg(amount_arg(true))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .short('d')
                        .required(true),
                )
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                .arg(Arg::new("category").long("category"))
                .arg(direction_arg())
                .arg(
                    Arg::new("status")
                        .long("status")
                        .help("pending | paid (default pending)"),
                )
                .arg(Arg::new("payment-date").long("payment-date"))
                .arg(
                    Arg::new("recurring")
                        .long("recurring")
                        .help("Also create a rule: daily | weekly | monthly | yearly"),
                )
                .arg(
                    Arg::new("day-of-month")
                        .long("day-of-month")
                        .requires("recurring")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .requires("recurring")
                        .help("First occurrence, defaults to --date"),
                )
                .arg(Arg::new("end").long("end").requires("recurring")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("month").long("month").help("YYYY-MM"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn recurring_commands() -> Command {
    Command::new("recurring")
        .about("Manage recurring rules")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("account").long("account").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(direction_arg())
                .arg(amount_arg(true))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .short('d')
                        .required(true),
                )
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .required(true)
                        .help("daily | weekly | monthly | yearly"),
                )
                .arg(
                    Arg::new("day-of-month")
                        .long("day-of-month")
                        .value_parser(value_parser!(u32)),
                )
                .arg(Arg::new("start").long("start").help("Defaults to today"))
                .arg(Arg::new("end").long("end")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(Arg::new("account").long("account"))
                .arg(Arg::new("category").long("category"))
                .arg(direction_arg())
                .arg(amount_arg(false))
                .arg(Arg::new("description").long("description").short('d'))
                .arg(Arg::new("frequency").long("frequency"))
                .arg(
                    Arg::new("day-of-month")
                        .long("day-of-month")
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("clear-day")
                        .long("clear-day")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("day-of-month"),
                )
                .arg(Arg::new("start").long("start"))
                .arg(Arg::new("end").long("end"))
                .arg(
                    Arg::new("clear-end")
                        .long("clear-end")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("end"),
                ),
        )
        .subcommand(Command::new("pause").arg(id_arg()))
        .subcommand(Command::new("resume").arg(id_arg()))
        .subcommand(Command::new("cancel").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(json_flags(
            Command::new("run").about("Book every due occurrence up to today"),
        ))
}

fn goal_commands() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("target").long("target").required(true))
                .arg(Arg::new("current").long("current").default_value("0"))
                .arg(Arg::new("deadline").long("deadline")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("edit")
                .arg(id_arg())
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("target").long("target"))
                .arg(Arg::new("current").long("current"))
                .arg(Arg::new("deadline").long("deadline"))
                .arg(
                    Arg::new("clear-deadline")
                        .long("clear-deadline")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("deadline"),
                ),
        )
        .subcommand(
            Command::new("contribute")
                .arg(id_arg())
                .arg(Arg::new("account").long("account").required(true))
                .arg(amount_arg(true))
                .arg(Arg::new("date").long("date")),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

pub fn build_cli() -> Command {
    Command::new("cashloop")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal ledger with recurring transactions and derived balances")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Database file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .value_parser(value_parser!(i64))
                .help("Act as this user id"),
        )
        .arg(
            Arg::new("as-of")
                .long("as-of")
                .global(true)
                .help("Treat this date (YYYY-MM-DD) as today"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(account_commands())
        .subcommand(category_commands())
        .subcommand(tx_commands())
        .subcommand(recurring_commands())
        .subcommand(goal_commands())
        .subcommand(
            Command::new("dashboard")
                .about("Overview of balances, cash flow and goals")
                .arg(
                    Arg::new("months")
                        .long("months")
                        .value_parser(value_parser!(u32).range(1..=120)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Persisted settings")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(Arg::new("key")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
