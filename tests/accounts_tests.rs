// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashloop::error::FinanceError;
use cashloop::ledger::accounts::{
    NewAccount, NewCategory, account_balances, create_account, create_category, delete_account,
    delete_category, is_hex_color,
};
use cashloop::ledger::recurring::{NewRule, create_rule};
use cashloop::ledger::writer::{NewTransaction, create_transaction};
use cashloop::models::{AccountKind, Direction, Frequency, Money};
use cashloop::store::{SqliteStore, Store};
use chrono::NaiveDate;

const USER: i64 = 1;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn account(name: &str, minor: i64) -> NewAccount {
    NewAccount {
        name: name.into(),
        kind: AccountKind::Checking,
        initial_balance: Money::from_minor(minor),
    }
}

fn category(name: &str, direction: Direction) -> NewCategory {
    NewCategory {
        name: name.into(),
        direction,
        budget_class: None,
        color: None,
    }
}

fn setup() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

#[test]
fn account_names_are_unique_per_user() {
    let store = setup();
    let created = create_account(&store, USER, &account("  Wallet ", 500)).unwrap();
    assert_eq!(created.name, "Wallet");
    assert!(created.is_active);

    let err = create_account(&store, USER, &account("wallet", 0)).unwrap_err();
    assert!(matches!(err, FinanceError::Validation(ref e) if e.contains("name")));
    create_account(&store, 2, &account("Wallet", 0)).unwrap();

    let err = create_account(&store, USER, &account("   ", 0)).unwrap_err();
    assert!(matches!(err, FinanceError::Validation(ref e) if e.contains("name")));
}

#[test]
fn negative_opening_balance_is_allowed() {
    let store = setup();
    let created = create_account(&store, USER, &account("Card", -2_500)).unwrap();
    assert_eq!(created.initial_balance, Money::from_minor(-2_500));
}

#[test]
fn balances_are_derived_in_name_order() {
    let store = setup();
    let savings = create_account(&store, USER, &account("Savings", 10_000)).unwrap();
    let checking = create_account(&store, USER, &account("Checking", 1_000)).unwrap();
    let salary = create_category(&store, USER, &category("Salary", Direction::Income)).unwrap();
    let input = NewTransaction::new(checking.id, "Pay", Money::from_minor(4_000), d("2024-05-01"))
        .category(salary.id);
    create_transaction(&store, USER, &input, d("2024-05-01")).unwrap();

    let balances: Vec<_> = account_balances(&store, USER)
        .unwrap()
        .into_iter()
        .map(|(a, balance)| (a.name, balance))
        .collect();
    assert_eq!(
        balances,
        vec![
            ("Checking".to_string(), Money::from_minor(5_000)),
            ("Savings".to_string(), Money::from_minor(10_000)),
        ]
    );
    assert_eq!(savings.initial_balance, Money::from_minor(10_000));
}

#[test]
fn category_validation() {
    let store = setup();
    assert!(is_hex_color("#A0b1C2"));
    assert!(!is_hex_color("A0B1C2"));
    assert!(!is_hex_color("#A0B1C"));
    assert!(!is_hex_color("#GGGGGG"));

    let mut input = category("Fun", Direction::Expense);
    input.color = Some("red".into());
    let err = create_category(&store, USER, &input).unwrap_err();
    assert!(matches!(err, FinanceError::Validation(ref e) if e.contains("color")));

    input.color = Some("#ff8800".into());
    create_category(&store, USER, &input).unwrap();
    let err = create_category(&store, USER, &category("fun", Direction::Expense)).unwrap_err();
    assert!(matches!(err, FinanceError::Validation(ref e) if e.contains("name")));
    // same name, other direction
    create_category(&store, USER, &category("Fun", Direction::Income)).unwrap();
    assert_eq!(store.list_categories(USER).unwrap().len(), 2);
}

#[test]
fn deleting_an_account_removes_its_ledger() {
    let store = setup();
    let main = create_account(&store, USER, &account("Main", 10_000)).unwrap();
    let bills = create_category(&store, USER, &category("Bills", Direction::Expense)).unwrap();
    let input = NewTransaction::new(main.id, "Power", Money::from_minor(2_000), d("2024-05-01"))
        .category(bills.id);
    create_transaction(&store, USER, &input, d("2024-05-01")).unwrap();
    create_rule(
        &store,
        USER,
        &NewRule {
            account_id: main.id,
            category_id: bills.id,
            description: "Power".into(),
            amount: Money::from_minor(2_000),
            frequency: Frequency::Monthly,
            day_of_month: None,
            start_date: d("2024-06-01"),
            end_date: None,
        },
        d("2024-05-01"),
    )
    .unwrap();

    assert_eq!(
        delete_account(&store, 2, main.id).unwrap_err(),
        FinanceError::NotFound("account")
    );
    delete_account(&store, USER, main.id).unwrap();
    assert!(store.list_accounts(USER).unwrap().is_empty());
    assert!(store.list_transactions(USER, None).unwrap().is_empty());
    assert!(store.list_rules(USER).unwrap().is_empty());
}

#[test]
fn deleting_a_category_uncategorizes_transactions() {
    let store = setup();
    let main = create_account(&store, USER, &account("Main", 10_000)).unwrap();
    let food = create_category(&store, USER, &category("Food", Direction::Expense)).unwrap();
    let input = NewTransaction::new(main.id, "Bread", Money::from_minor(300), d("2024-05-01"))
        .category(food.id);
    let tx = create_transaction(&store, USER, &input, d("2024-05-01"))
        .unwrap()
        .transaction
        .unwrap();

    assert_eq!(
        delete_category(&store, 2, food.id).unwrap_err(),
        FinanceError::NotFound("category")
    );
    delete_category(&store, USER, food.id).unwrap();
    let kept = store.get_transaction(tx.id).unwrap().unwrap();
    assert_eq!(kept.category_id, None);
    assert_eq!(kept.direction, None);
    assert_eq!(kept.amount, Money::from_minor(300));
}
