// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived account balances.
//!
//! No balance is ever stored. An account's balance is its initial balance
//! plus the signed flow of every transaction booked against it, recomputed
//! on each read.

use std::collections::HashMap;

use crate::error::FinanceError;
use crate::models::{Account, Flow, Id, Money, Transaction, UserId};
use crate::store::Store;

/// `initial_balance + Σ signed(tx)` over the transactions of `account`.
/// Transactions of other accounts in `transactions` are ignored.
pub fn current_balance(account: &Account, transactions: &[Transaction]) -> Money {
    account.initial_balance
        + transactions
            .iter()
            .filter(|tx| tx.account_id == account.id)
            .map(|tx| tx.flow().signed())
            .sum::<Money>()
}

/// Balances of many accounts in a single pass over `transactions`.
pub fn balances_by_account(accounts: &[Account], transactions: &[Transaction]) -> HashMap<Id, Money> {
    let mut balances: HashMap<Id, Money> = accounts
        .iter()
        .map(|a| (a.id, a.initial_balance))
        .collect();
    for tx in transactions {
        if let Some(balance) = balances.get_mut(&tx.account_id) {
            *balance += tx.flow().signed();
        }
    }
    balances
}

/// Fails with [`FinanceError::InsufficientFunds`] when booking `flow` on
/// `account` would leave its derived balance below zero. Income always
/// passes.
pub fn ensure_solvent<S: Store>(
    store: &S,
    user: UserId,
    account: &Account,
    flow: Flow,
) -> Result<Money, FinanceError> {
    let transactions = store.list_transactions(user, Some(account.id))?;
    let balance = current_balance(account, &transactions);
    let after = balance + flow.signed();
    if flow.is_expense() && after.is_negative() {
        tracing::debug!(
            account = account.id,
            %balance,
            requested = %flow.amount(),
            "solvency check failed"
        );
        return Err(FinanceError::InsufficientFunds {
            balance,
            requested: flow.amount(),
        });
    }
    Ok(after)
}
