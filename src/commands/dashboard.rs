// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::Session;
use crate::ledger::dashboard::{DashboardOverview, Slice, overview};
use crate::store::SqliteStore;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    let months = m
        .get_one::<u32>("months")
        .copied()
        .unwrap_or(session.lookback_months);
    let data = overview(store, session.user, session.today, months)?;
    if !maybe_print_json(m.get_flag("json"), false, &data)? {
        print_overview(&data);
    }
    Ok(())
}

fn slices(title: &str, slices: &[Slice]) {
    if slices.is_empty() {
        return;
    }
    let rows = slices
        .iter()
        .map(|s| vec![s.name.clone(), s.value.to_string()])
        .collect();
    println!("{}", pretty_table(&[title, "Spent"], rows));
}

fn print_overview(d: &DashboardOverview) {
    let s = &d.summary;
    println!(
        "Accounts: {} ({} active)   Balance: {}   This month: {} transaction(s)   Goals: {} ({} open)",
        s.total_accounts,
        s.active_accounts,
        s.total_balance,
        s.month_transactions,
        s.total_goals,
        s.active_goals
    );

    let rows = d
        .cash_flow
        .iter()
        .zip(&d.balance_evolution)
        .map(|(cf, b)| {
            vec![
                cf.month.clone(),
                cf.income.to_string(),
                cf.expense.to_string(),
                (cf.income - cf.expense).to_string(),
                b.balance.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expense", "Net", "Balance"], rows)
    );

    println!(
        "This month: paid {}, pending {}",
        d.transaction_status.paid, d.transaction_status.pending
    );
    slices("Category", &d.expenses_by_category);
    slices("Budget class", &d.budget_by_class);

    if !d.goals.is_empty() {
        let rows = d
            .goals
            .iter()
            .map(|g| {
                vec![
                    g.name.clone(),
                    g.current.to_string(),
                    g.target.to_string(),
                    format!("{}%", g.percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Goal", "Current", "Target", "Progress"], rows)
        );
    }

    if !d.recent.is_empty() {
        let rows = d
            .recent
            .iter()
            .map(|t| {
                vec![
                    t.date.to_string(),
                    t.description.clone(),
                    t.account.clone().unwrap_or_default(),
                    t.category.clone().unwrap_or_default(),
                    t.direction.to_string(),
                    t.amount.to_string(),
                    t.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Description", "Account", "Category", "Type", "Amount", "Status"],
                rows,
            )
        );
    }
}
