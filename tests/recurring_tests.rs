// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashloop::error::FinanceError;
use cashloop::ledger::accounts::{NewAccount, NewCategory, create_account, create_category};
use cashloop::ledger::recurring::{
    CatchUpReport, NewRule, RuleEdit, create_rule, delete_rule, process_due_rules, set_status,
    update_rule,
};
use cashloop::ledger::writer::{NewTransaction, create_transaction};
use cashloop::models::{AccountKind, Direction, Frequency, Id, Money, RuleStatus, TxStatus};
use cashloop::store::{SqliteStore, Store};
use chrono::NaiveDate;

const USER: i64 = 1;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct Fixture {
    store: SqliteStore,
    account: Id,
    rent: Id,
    salary: Id,
}

fn setup(balance: i64) -> Fixture {
    let store = SqliteStore::open_in_memory().unwrap();
    let account = create_account(
        &store,
        USER,
        &NewAccount {
            name: "Checking".into(),
            kind: AccountKind::Checking,
            initial_balance: Money::from_minor(balance),
        },
    )
    .unwrap()
    .id;
    let [rent, salary] = [Direction::Expense, Direction::Income].map(|direction| {
        create_category(
            &store,
            USER,
            &NewCategory {
                name: format!("{direction}"),
                direction,
                budget_class: None,
                color: None,
            },
        )
        .unwrap()
        .id
    });
    Fixture {
        store,
        account,
        rent,
        salary,
    }
}

fn rule(f: &Fixture, minor: i64, frequency: Frequency, start: &str, end: Option<&str>) -> NewRule {
    NewRule {
        account_id: f.account,
        category_id: f.rent,
        description: "Rent".into(),
        amount: Money::from_minor(minor),
        frequency,
        day_of_month: None,
        start_date: d(start),
        end_date: end.map(d),
    }
}

#[test]
fn create_rule_books_nothing() {
    let f = setup(0);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 5_000, Frequency::Monthly, "2024-01-15", None),
        d("2024-01-10"),
    )
    .unwrap();
    assert_eq!(created.status, RuleStatus::Active);
    assert_eq!(created.next_run_date, d("2024-01-15"));
    assert!(f.store.list_transactions(USER, None).unwrap().is_empty());
}

#[test]
fn create_rule_validates() {
    let f = setup(0);
    let mut input = rule(&f, 0, Frequency::Monthly, "2024-02-01", Some("2024-01-01"));
    input.day_of_month = Some(0);
    match create_rule(&f.store, USER, &input, d("2024-01-01")).unwrap_err() {
        FinanceError::Validation(e) => {
            assert!(e.contains("amount"));
            assert!(e.contains("day_of_month"));
            assert!(e.contains("end_date"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    let mut foreign = rule(&f, 100, Frequency::Daily, "2024-02-01", None);
    foreign.category_id = 999;
    assert_eq!(
        create_rule(&f.store, USER, &foreign, d("2024-01-01")).unwrap_err(),
        FinanceError::NotFound("category")
    );
}

#[test]
fn due_rule_materializes_once_per_call() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 10_000, Frequency::Monthly, "2024-01-15", None),
        d("2024-01-15"),
    )
    .unwrap();

    let first = process_due_rules(&f.store, USER, d("2024-01-15")).unwrap();
    assert_eq!(first.processed, 1);
    let second = process_due_rules(&f.store, USER, d("2024-01-15")).unwrap();
    assert_eq!(second, CatchUpReport::default());

    let txs = f.store.list_transactions(USER, None).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].date, d("2024-01-15"));
    assert_eq!(txs[0].status, TxStatus::Paid);
    assert_eq!(txs[0].recurring_id, Some(created.id));
    let after = f.store.get_rule(created.id).unwrap().unwrap();
    assert_eq!(after.next_run_date, d("2024-02-15"));
}

#[test]
fn one_occurrence_per_pass_even_when_far_behind() {
    let f = setup(100_000);
    create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Weekly, "2024-01-01", None),
        d("2024-01-01"),
    )
    .unwrap();
    let report = process_due_rules(&f.store, USER, d("2024-03-01")).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(f.store.list_transactions(USER, None).unwrap().len(), 1);
}

#[test]
fn insufficient_funds_leaves_rule_untouched() {
    let f = setup(1_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_500, Frequency::Monthly, "2024-04-01", None),
        d("2024-04-01"),
    )
    .unwrap();
    let report = process_due_rules(&f.store, USER, d("2024-04-01")).unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 1);
    let after = f.store.get_rule(created.id).unwrap().unwrap();
    assert_eq!(after.next_run_date, d("2024-04-01"));
    assert_eq!(after.status, RuleStatus::Active);
    assert!(f.store.list_transactions(USER, None).unwrap().is_empty());
}

#[test]
fn income_rule_funds_a_later_expense() {
    let f = setup(0);
    let mut pay = rule(&f, 2_000, Frequency::Monthly, "2024-05-01", None);
    pay.category_id = f.salary;
    create_rule(&f.store, USER, &pay, d("2024-05-01")).unwrap();
    let first = process_due_rules(&f.store, USER, d("2024-05-01")).unwrap();
    assert_eq!(first.processed, 1);

    let spend = NewTransaction::new(f.account, "Books", Money::from_minor(2_000), d("2024-05-02"))
        .category(f.rent);
    assert!(create_transaction(&f.store, USER, &spend, d("2024-05-02")).is_ok());
}

#[test]
fn rule_stops_at_end_date() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Monthly, "2024-01-10", Some("2024-03-10")),
        d("2024-01-10"),
    )
    .unwrap();

    let today = d("2024-06-30");
    let mut reports = Vec::new();
    for _ in 0..5 {
        reports.push(process_due_rules(&f.store, USER, today).unwrap());
    }
    assert_eq!(reports[0].processed, 1);
    assert_eq!(reports[1].processed, 1);
    assert_eq!(reports[1].cancelled, 1);
    assert!(reports[2..].iter().all(|r| *r == CatchUpReport::default()));

    let txs = f.store.list_transactions(USER, None).unwrap();
    let dates: Vec<_> = txs.iter().map(|t| t.date).collect();
    assert_eq!(dates, vec![d("2024-01-10"), d("2024-02-10")]);
    let after = f.store.get_rule(created.id).unwrap().unwrap();
    assert_eq!(after.status, RuleStatus::Cancelled);
}

#[test]
fn rule_sitting_on_end_date_is_skipped() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Daily, "2024-01-10", Some("2024-01-10")),
        d("2024-01-10"),
    )
    .unwrap();
    let report = process_due_rules(&f.store, USER, d("2024-01-12")).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(
        f.store.get_rule(created.id).unwrap().unwrap().status,
        RuleStatus::Active
    );
    assert!(f.store.list_transactions(USER, None).unwrap().is_empty());
}

#[test]
fn rule_past_end_date_is_cancelled_without_booking() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Monthly, "2024-01-10", None),
        d("2024-01-10"),
    )
    .unwrap();
    process_due_rules(&f.store, USER, d("2024-01-10")).unwrap();
    update_rule(
        &f.store,
        USER,
        created.id,
        &RuleEdit {
            end_date: Some(Some(d("2024-01-20"))),
            ..Default::default()
        },
        d("2024-01-11"),
    )
    .unwrap();

    let report = process_due_rules(&f.store, USER, d("2024-03-01")).unwrap();
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.processed, 0);
    assert_eq!(f.store.list_transactions(USER, None).unwrap().len(), 1);
    assert_eq!(
        f.store.get_rule(created.id).unwrap().unwrap().status,
        RuleStatus::Cancelled
    );
}

#[test]
fn paused_rules_are_not_due() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Daily, "2024-01-01", None),
        d("2024-01-01"),
    )
    .unwrap();
    let paused = set_status(&f.store, USER, created.id, RuleStatus::Paused).unwrap();
    assert_eq!(paused.status, RuleStatus::Paused);
    assert_eq!(paused.next_run_date, created.next_run_date);
    assert_eq!(
        process_due_rules(&f.store, USER, d("2024-01-05")).unwrap().processed,
        0
    );

    set_status(&f.store, USER, created.id, RuleStatus::Active).unwrap();
    assert_eq!(
        process_due_rules(&f.store, USER, d("2024-01-05")).unwrap().processed,
        1
    );
}

#[test]
fn cancelled_is_terminal() {
    let f = setup(0);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Daily, "2024-01-01", None),
        d("2024-01-01"),
    )
    .unwrap();
    set_status(&f.store, USER, created.id, RuleStatus::Cancelled).unwrap();
    for to in [RuleStatus::Active, RuleStatus::Paused] {
        let err = set_status(&f.store, USER, created.id, to).unwrap_err();
        assert!(matches!(err, FinanceError::Validation(ref e) if e.contains("status")));
    }
}

#[test]
fn status_change_requires_ownership() {
    let f = setup(0);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Daily, "2024-01-01", None),
        d("2024-01-01"),
    )
    .unwrap();
    assert_eq!(
        set_status(&f.store, 2, created.id, RuleStatus::Paused).unwrap_err(),
        FinanceError::NotFound("recurring rule")
    );
    assert_eq!(
        delete_rule(&f.store, 2, created.id).unwrap_err(),
        FinanceError::NotFound("recurring rule")
    );
}

#[test]
fn edit_moves_schedule_forward_only() {
    let f = setup(0);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Monthly, "2024-01-05", None),
        d("2024-01-01"),
    )
    .unwrap();
    let edited = update_rule(
        &f.store,
        USER,
        created.id,
        &RuleEdit {
            amount: Some(Money::from_minor(1_250)),
            start_date: Some(d("2024-02-05")),
            description: Some(" Rent (new flat) ".into()),
            ..Default::default()
        },
        d("2024-01-02"),
    )
    .unwrap();
    assert_eq!(edited.amount, Money::from_minor(1_250));
    assert_eq!(edited.description, "Rent (new flat)");
    assert_eq!(edited.next_run_date, d("2024-02-05"));

    let earlier = update_rule(
        &f.store,
        USER,
        created.id,
        &RuleEdit {
            start_date: Some(d("2024-01-01")),
            ..Default::default()
        },
        d("2024-01-02"),
    )
    .unwrap();
    assert_eq!(earlier.next_run_date, d("2024-02-05"));
}

#[test]
fn deleting_a_rule_keeps_its_transactions() {
    let f = setup(100_000);
    let created = create_rule(
        &f.store,
        USER,
        &rule(&f, 1_000, Frequency::Daily, "2024-01-01", None),
        d("2024-01-01"),
    )
    .unwrap();
    process_due_rules(&f.store, USER, d("2024-01-01")).unwrap();
    delete_rule(&f.store, USER, created.id).unwrap();
    let txs = f.store.list_transactions(USER, None).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].recurring_id, None);
}
