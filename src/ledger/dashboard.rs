// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side rollups over a lookback window of whole months ending with
//! the current month.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::balance::balances_by_account;
use super::goals::progress_percent;
use super::projection::{month_start, shift_months};
use super::scheduler::catch_up_if_stale;
use crate::error::FinanceError;
use crate::models::{BudgetClass, Direction, Id, Money, Transaction, TxStatus, UserId};
use crate::store::Store;

pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_accounts: usize,
    pub active_accounts: usize,
    pub total_balance: Money,
    pub month_transactions: usize,
    pub total_goals: usize,
    /// Goals whose current amount is still below target.
    pub active_goals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPoint {
    /// `YYYY-MM`
    pub month: String,
    pub income: Money,
    pub expense: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    pub month: String,
    /// Derived balance over all accounts at the end of the month.
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusTotals {
    pub paid: Money,
    pub pending: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: Money,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub name: String,
    pub current: Money,
    pub target: Money,
    pub percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTransaction {
    pub id: Id,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub status: TxStatus,
    pub direction: Direction,
    pub category: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub summary: Summary,
    pub cash_flow: Vec<CashFlowPoint>,
    pub balance_evolution: Vec<BalancePoint>,
    pub transaction_status: StatusTotals,
    pub expenses_by_category: Vec<Slice>,
    pub budget_by_class: Vec<Slice>,
    pub goals: Vec<GoalProgress>,
    pub recent: Vec<RecentTransaction>,
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn sorted_slices(mut slices: Vec<Slice>) -> Vec<Slice> {
    slices.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    slices
}

/// Builds the dashboard for `user`. Due recurring rules are caught up
/// first so the figures include today's occurrences.
pub fn overview<S: Store>(
    store: &S,
    user: UserId,
    today: NaiveDate,
    lookback_months: u32,
) -> Result<DashboardOverview, FinanceError> {
    catch_up_if_stale(store, user, today)?;

    let accounts = store.list_accounts(user)?;
    let categories: HashMap<Id, _> = store
        .list_categories(user)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let transactions = store.list_transactions(user, None)?;
    let goals = store.list_goals(user)?;

    let this_month = month_start(today);
    let months: Vec<NaiveDate> = (0..lookback_months.max(1) as i32)
        .rev()
        .map(|back| shift_months(this_month, -back))
        .collect();
    let window_start = months.first().copied().unwrap_or(this_month);

    let balances = balances_by_account(&accounts, &transactions);
    let month_tx: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| same_month(tx.date, today))
        .collect();

    let summary = Summary {
        total_accounts: accounts.len(),
        active_accounts: accounts.iter().filter(|a| a.is_active).count(),
        total_balance: balances.values().copied().sum(),
        month_transactions: month_tx.len(),
        total_goals: goals.len(),
        active_goals: goals
            .iter()
            .filter(|g| g.current_amount < g.target_amount)
            .count(),
    };

    let cash_flow: Vec<CashFlowPoint> = months
        .iter()
        .map(|&m| {
            let mut point = CashFlowPoint {
                month: month_key(m),
                income: Money::ZERO,
                expense: Money::ZERO,
            };
            for tx in transactions.iter().filter(|tx| same_month(tx.date, m)) {
                match tx.direction {
                    Some(Direction::Income) => point.income += tx.amount,
                    Some(Direction::Expense) => point.expense += tx.amount,
                    None => {}
                }
            }
            point
        })
        .collect();

    let mut running: Money = accounts.iter().map(|a| a.initial_balance).sum::<Money>()
        + transactions
            .iter()
            .filter(|tx| tx.date < window_start)
            .map(|tx| tx.flow().signed())
            .sum::<Money>();
    let balance_evolution = months
        .iter()
        .map(|&m| {
            running += transactions
                .iter()
                .filter(|tx| same_month(tx.date, m))
                .map(|tx| tx.flow().signed())
                .sum::<Money>();
            BalancePoint {
                month: month_key(m),
                balance: running,
            }
        })
        .collect();

    let mut transaction_status = StatusTotals::default();
    for tx in &month_tx {
        match tx.status {
            TxStatus::Paid => transaction_status.paid += tx.amount,
            TxStatus::Pending => transaction_status.pending += tx.amount,
        }
    }

    let mut by_category: HashMap<Id, Money> = HashMap::new();
    let mut by_class: HashMap<BudgetClass, Money> = HashMap::new();
    for tx in &month_tx {
        if tx.status != TxStatus::Paid || tx.direction != Some(Direction::Expense) {
            continue;
        }
        let Some(category) = tx.category_id.and_then(|id| categories.get(&id)) else {
            continue;
        };
        *by_category.entry(category.id).or_default() += tx.amount;
        if let Some(class) = category.budget_class {
            *by_class.entry(class).or_default() += tx.amount;
        }
    }
    let expenses_by_category = sorted_slices(
        by_category
            .into_iter()
            .filter_map(|(id, value)| {
                categories.get(&id).map(|c| Slice {
                    name: c.name.clone(),
                    value,
                    color: c.color.clone(),
                })
            })
            .collect(),
    );
    let budget_by_class = sorted_slices(
        BudgetClass::ALL
            .iter()
            .filter_map(|class| {
                by_class.get(class).map(|&value| Slice {
                    name: class.label().to_string(),
                    value,
                    color: None,
                })
            })
            .collect(),
    );

    let goals = goals
        .iter()
        .map(|g| GoalProgress {
            name: g.name.clone(),
            current: g.current_amount,
            target: g.target_amount,
            percent: progress_percent(g),
        })
        .collect();

    let account_names: HashMap<Id, &str> =
        accounts.iter().map(|a| (a.id, a.name.as_str())).collect();
    let recent = transactions
        .iter()
        .rev()
        .take(RECENT_LIMIT)
        .map(|tx| RecentTransaction {
            id: tx.id,
            description: tx.description.clone(),
            amount: tx.amount,
            date: tx.date,
            status: tx.status,
            direction: tx.direction.unwrap_or(Direction::Expense),
            category: tx
                .category_id
                .and_then(|id| categories.get(&id))
                .map(|c| c.name.clone()),
            account: account_names.get(&tx.account_id).map(|n| n.to_string()),
        })
        .collect();

    Ok(DashboardOverview {
        summary,
        cash_flow,
        balance_evolution,
        transaction_status,
        expenses_by_category,
        budget_by_class,
        goals,
        recent,
    })
}
