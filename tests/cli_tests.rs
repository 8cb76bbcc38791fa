// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashloop::commands::{self, Session, accounts, categories, goals, recurring, transactions};
use cashloop::models::{Direction, Money, RuleStatus, TxStatus};
use cashloop::store::{SqliteStore, Store};
use cashloop::{cli, config, db};
use chrono::NaiveDate;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn session(today: &str) -> Session {
    Session {
        user: 1,
        today: d(today),
        lookback_months: config::DEFAULT_LOOKBACK_MONTHS,
    }
}

fn run(store: &SqliteStore, session: &Session, args: &[&str]) -> anyhow::Result<()> {
    let argv = std::iter::once("cashloop").chain(args.iter().copied());
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    match matches.subcommand() {
        Some(("account", sub)) => accounts::handle(store, session, sub),
        Some(("category", sub)) => categories::handle(store, session, sub),
        Some(("tx", sub)) => transactions::handle(store, session, sub),
        Some(("recurring", sub)) => recurring::handle(store, session, sub),
        Some(("goal", sub)) => goals::handle(store, session, sub),
        Some(("config", sub)) => commands::config::handle(store, sub),
        other => panic!("unexpected subcommand {other:?}"),
    }
}

fn setup(today: &str) -> (SqliteStore, Session) {
    let store = SqliteStore::open_in_memory().unwrap();
    let session = session(today);
    run(&store, &session, &["account", "add", "--name", "Main", "--initial", "100"]).unwrap();
    run(
        &store,
        &session,
        &["category", "add", "--name", "Food", "--direction", "expense"],
    )
    .unwrap();
    (store, session)
}

#[test]
fn global_flags_parse_after_subcommand() {
    let matches = cli::build_cli().get_matches_from([
        "cashloop", "dashboard", "--months", "3", "--user", "2", "--as-of", "2024-03-15",
    ]);
    assert_eq!(matches.get_one::<i64>("user"), Some(&2));
    assert_eq!(
        matches.get_one::<String>("as-of").map(String::as_str),
        Some("2024-03-15")
    );
    if let Some(("dashboard", sub)) = matches.subcommand() {
        assert_eq!(sub.get_one::<u32>("months"), Some(&3));
    } else {
        panic!("no dashboard subcommand");
    }

    let out_of_range = cli::build_cli().try_get_matches_from(["cashloop", "dashboard", "--months", "0"]);
    assert!(out_of_range.is_err());
}

#[test]
fn tx_add_and_list_newest_first() {
    let (store, session) = setup("2024-03-15");
    for (date, amount) in [("2024-02-28", "12.50"), ("2024-03-01", "7"), ("2024-03-02", "3.25")] {
        run(
            &store,
            &session,
            &[
                "tx", "add", "--account", "main", "--amount", amount, "-d", "Lunch", "--date", date,
                "--category", "Food", "--status", "paid",
            ],
        )
        .unwrap();
    }

    let lines = transactions::query_lines(&store, &session, None, None, Some(2)).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].date, d("2024-03-02"));
    assert_eq!(lines[0].amount, Money::from_minor(325));
    assert_eq!(lines[0].category.as_deref(), Some("Food"));
    assert_eq!(lines[0].status, TxStatus::Paid);
    assert_eq!(lines[0].account, "Main");

    let march = transactions::query_lines(&store, &session, Some("Main"), Some("2024-03"), None).unwrap();
    assert_eq!(march.len(), 2);
}

#[test]
fn tx_add_rejects_overdraft() {
    let (store, session) = setup("2024-03-15");
    let err = run(
        &store,
        &session,
        &["tx", "add", "--account", "Main", "--amount", "100.01", "-d", "TV", "--category", "Food"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("insufficient balance"), "{err}");
    assert!(store.list_transactions(session.user, None).unwrap().is_empty());
}

#[test]
fn recurring_add_then_run_books_missed_cycles() {
    let (store, session) = setup("2024-03-20");
    run(
        &store,
        &session,
        &[
            "recurring", "add", "--account", "Main", "--category", "Food", "--amount", "9.99", "-d",
            "Gym", "--frequency", "monthly",
        ],
    )
    .unwrap();
    let rule = store.list_rules(session.user).unwrap().remove(0);
    assert_eq!(rule.next_run_date, d("2024-03-20"));

    let later = Session {
        today: d("2024-05-20"),
        ..session
    };
    run(&store, &later, &["recurring", "run"]).unwrap();
    assert_eq!(store.list_transactions(session.user, None).unwrap().len(), 3);
    assert_eq!(store.catch_up_watermark(session.user).unwrap(), Some(later.today));

    run(&store, &later, &["recurring", "cancel", "--id", &rule.id.to_string()]).unwrap();
    assert_eq!(
        store.get_rule(rule.id).unwrap().unwrap().status,
        RuleStatus::Cancelled
    );
    assert!(run(&store, &later, &["recurring", "resume", "--id", &rule.id.to_string()]).is_err());
}

#[test]
fn ambiguous_category_needs_direction() {
    let (store, session) = setup("2024-03-15");
    for direction in ["income", "expense"] {
        run(
            &store,
            &session,
            &["category", "add", "--name", "Gifts", "--direction", direction],
        )
        .unwrap();
    }
    assert!(commands::category(&store, &session, "gifts", None).is_err());
    let income = commands::category(&store, &session, "gifts", Some(Direction::Income)).unwrap();
    assert_eq!(income.direction, Direction::Income);

    run(
        &store,
        &session,
        &["category", "rm", "--name", "Gifts", "--direction", "income"],
    )
    .unwrap();
    let left = commands::category(&store, &session, "Gifts", None).unwrap();
    assert_eq!(left.direction, Direction::Expense);
}

#[test]
fn booking_against_a_shared_category_name() {
    let (store, session) = setup("2024-03-15");
    for direction in ["income", "expense"] {
        run(
            &store,
            &session,
            &["category", "add", "--name", "Gifts", "--direction", direction],
        )
        .unwrap();
    }
    let tx = ["tx", "add", "--account", "Main", "--amount", "25", "-d", "Birthday", "--category", "Gifts"];
    assert!(run(&store, &session, &tx).is_err());
    assert!(store.list_transactions(session.user, None).unwrap().is_empty());

    let mut income = tx.to_vec();
    income.extend(["--direction", "income"]);
    run(&store, &session, &income).unwrap();
    let booked = store.list_transactions(session.user, None).unwrap().remove(0);
    assert_eq!(booked.direction, Some(Direction::Income));

    run(
        &store,
        &session,
        &[
            "recurring", "add", "--account", "Main", "--category", "Gifts", "--direction",
            "expense", "--amount", "5", "-d", "Charity", "--frequency", "monthly", "--start",
            "2024-04-01",
        ],
    )
    .unwrap();
    let rule = store.list_rules(session.user).unwrap().remove(0);
    let expense = commands::category(&store, &session, "Gifts", Some(Direction::Expense)).unwrap();
    assert_eq!(rule.category_id, expense.id);

    run(
        &store,
        &session,
        &[
            "recurring", "edit", "--id", &rule.id.to_string(), "--category", "Gifts",
            "--direction", "income",
        ],
    )
    .unwrap();
    assert_eq!(store.get_rule(rule.id).unwrap().unwrap().category_id, booked.category_id.unwrap());

    let without_category = cli::build_cli().try_get_matches_from([
        "cashloop", "tx", "add", "--account", "Main", "--amount", "1", "-d", "x", "--direction", "income",
    ]);
    assert!(without_category.is_err());
}

#[test]
fn goal_contribute_through_cli() {
    let (store, session) = setup("2024-03-15");
    run(&store, &session, &["goal", "add", "--name", "Bike", "--target", "500"]).unwrap();
    let goal = store.list_goals(session.user).unwrap().remove(0);
    run(
        &store,
        &session,
        &[
            "goal", "contribute", "--id", &goal.id.to_string(), "--account", "Main", "--amount",
            "40",
        ],
    )
    .unwrap();
    let goal = store.get_goal(goal.id).unwrap().unwrap();
    assert_eq!(goal.current_amount, Money::from_minor(4_000));
    let tx = store.list_transactions(session.user, None).unwrap().remove(0);
    assert_eq!(tx.date, session.today);
    assert_eq!(tx.goal_id, Some(goal.id));
}

#[test]
fn config_set_validates_and_loads() {
    let store = SqliteStore::open_in_memory().unwrap();
    let conn = store.conn();
    assert_eq!(config::load(conn).unwrap(), config::Settings::default());

    assert!(config::set_setting(conn, "currency", "EUR").is_err());
    assert!(config::set_setting(conn, "lookback_months", "0").is_err());
    assert!(config::set_setting(conn, "lookback_months", "121").is_err());
    assert!(config::set_setting(conn, "default_user", "bob").is_err());

    run(&store, &session("2024-03-15"), &["config", "set", "lookback_months", "12"]).unwrap();
    config::set_setting(conn, "default_user", "7").unwrap();
    let settings = config::load(conn).unwrap();
    assert_eq!(settings.lookback_months, 12);
    assert_eq!(settings.default_user, 7);
}

#[test]
fn on_disk_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.sqlite");
    let session = session("2024-03-15");
    {
        let store = SqliteStore::new(db::open_at(&path).unwrap());
        run(&store, &session, &["account", "add", "--name", "Wallet", "--kind", "cash"]).unwrap();
    }
    let store = SqliteStore::new(db::open_at(&path).unwrap());
    let accounts = store.list_accounts(session.user).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Wallet");
}
