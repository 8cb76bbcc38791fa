// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Accounts and categories.

use super::balance::balances_by_account;
use super::{owned_account, owned_category};
use crate::error::{FieldErrors, FinanceError};
use crate::models::{
    Account, AccountKind, AccountRow, BudgetClass, Category, CategoryRow, Direction, Id, Money,
    UserId,
};
use crate::store::Store;

pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub direction: Direction,
    pub budget_class: Option<BudgetClass>,
    pub color: Option<String>,
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    let n = name.trim().chars().count();
    if n == 0 {
        errors.push("name", "name is required");
    } else if n > MAX_NAME_LEN {
        errors.push("name", format!("name is longer than {} characters", MAX_NAME_LEN));
    }
}

/// `#RRGGBB`, hex digits in either case.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn create_account<S: Store>(
    store: &S,
    user: UserId,
    input: &NewAccount,
) -> Result<Account, FinanceError> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, &input.name);
    if !input.initial_balance.is_within_limit() {
        errors.push("initial_balance", "initial_balance is out of range");
    }
    errors.into_result()?;
    let name = input.name.trim();
    store.atomically(|store| {
        if store
            .list_accounts(user)?
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name))
        {
            return Err(FieldErrors::single("name", "an account with this name already exists").into());
        }
        store.insert_account(&AccountRow {
            user_id: user,
            name: name.to_string(),
            kind: input.kind,
            initial_balance: input.initial_balance,
            is_active: true,
        })
    })
}

/// Deletes an account together with its transactions and rules.
pub fn delete_account<S: Store>(store: &S, user: UserId, id: Id) -> Result<(), FinanceError> {
    store.atomically(|store| {
        owned_account(store, user, id)?;
        store.delete_account(id)?;
        Ok(())
    })
}

/// Every account of `user` with its derived balance, in name order.
pub fn account_balances<S: Store>(
    store: &S,
    user: UserId,
) -> Result<Vec<(Account, Money)>, FinanceError> {
    let accounts = store.list_accounts(user)?;
    let transactions = store.list_transactions(user, None)?;
    let balances = balances_by_account(&accounts, &transactions);
    Ok(accounts
        .into_iter()
        .map(|a| {
            let balance = balances.get(&a.id).copied().unwrap_or(a.initial_balance);
            (a, balance)
        })
        .collect())
}

pub fn create_category<S: Store>(
    store: &S,
    user: UserId,
    input: &NewCategory,
) -> Result<Category, FinanceError> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, &input.name);
    if let Some(color) = &input.color {
        if !is_hex_color(color) {
            errors.push("color", "color must look like #RRGGBB");
        }
    }
    errors.into_result()?;
    let name = input.name.trim();
    store.atomically(|store| {
        if store.find_category(user, name, input.direction)?.is_some() {
            return Err(FieldErrors::single("name", "a category with this name already exists").into());
        }
        store.insert_category(&CategoryRow {
            user_id: user,
            name: name.to_string(),
            direction: input.direction,
            budget_class: input.budget_class,
            color: input.color.clone(),
        })
    })
}

/// Deletes a category. Its transactions become uncategorized and its
/// recurring rules are removed.
pub fn delete_category<S: Store>(store: &S, user: UserId, id: Id) -> Result<(), FinanceError> {
    store.atomically(|store| {
        owned_category(store, user, id)?;
        store.delete_category(id)?;
        Ok(())
    })
}
