// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger core: derived balances, the transaction writer, the recurring
//! rule engine and the read-side rollups built on top of them.
//!
//! Every operation takes the store, the acting user and, where time
//! matters, `today` as a calendar date. Nothing in here reads a clock.

pub mod accounts;
pub mod balance;
pub mod dashboard;
pub mod goals;
pub mod projection;
pub mod recurring;
pub mod scheduler;
pub mod writer;

use crate::error::{FieldErrors, FinanceError};
use crate::models::{Account, Category, Id, Money, RecurringRule, UserId};
use crate::store::Store;

pub const MAX_DESCRIPTION_LEN: usize = 200;

pub(crate) fn owned_account<S: Store>(store: &S, user: UserId, id: Id) -> Result<Account, FinanceError> {
    match store.get_account(id)? {
        Some(account) if account.user_id == user => Ok(account),
        _ => Err(FinanceError::NotFound("account")),
    }
}

pub(crate) fn owned_category<S: Store>(
    store: &S,
    user: UserId,
    id: Id,
) -> Result<Category, FinanceError> {
    match store.get_category(id)? {
        Some(category) if category.user_id == user => Ok(category),
        _ => Err(FinanceError::NotFound("category")),
    }
}

pub(crate) fn owned_rule<S: Store>(
    store: &S,
    user: UserId,
    id: Id,
) -> Result<RecurringRule, FinanceError> {
    match store.get_rule(id)? {
        Some(rule) if rule.user_id == user => Ok(rule),
        _ => Err(FinanceError::NotFound("recurring rule")),
    }
}

pub(crate) fn check_description(errors: &mut FieldErrors, description: &str) {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        errors.push("description", "description is required");
    } else if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        errors.push(
            "description",
            format!("description is longer than {} characters", MAX_DESCRIPTION_LEN),
        );
    }
}

/// Amounts entered by the user: strictly positive and within [`Money::MAX`].
pub(crate) fn check_amount(errors: &mut FieldErrors, field: &'static str, amount: Money) {
    if !amount.is_positive() {
        errors.push(field, format!("{} must be greater than zero", field));
    } else if !amount.is_within_limit() {
        errors.push(field, format!("{} is out of range", field));
    }
}

pub(crate) fn check_day_of_month(errors: &mut FieldErrors, day: Option<u32>) {
    if let Some(d) = day {
        if !(1..=31).contains(&d) {
            errors.push("day_of_month", "day of month must be between 1 and 31");
        }
    }
}
