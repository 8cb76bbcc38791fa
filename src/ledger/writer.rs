// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction writer.
//!
//! Every transaction row, whether typed in by the user, materialized by a
//! recurring rule or booked as a goal contribution, goes through
//! [`create_transaction`] so the solvency invariant is checked in one place.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::balance::ensure_solvent;
use super::projection::{first_run_date, next_occurrence};
use super::{check_amount, check_day_of_month, check_description, owned_account, owned_category};
use crate::error::{FieldErrors, FinanceError};
use crate::models::{
    Flow, Frequency, GoalPatch, Id, Money, RecurringRule, RuleRow, RuleStatus, Transaction, TransactionRow,
    TxStatus, UserId,
};
use crate::store::Store;

/// Recurrence sub-form of a transaction: marks the transaction as the first
/// occurrence of a new recurring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Recurrence {
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency,
            day_of_month: None,
            start_date,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: Id,
    pub category_id: Option<Id>,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    /// Defaults to `PENDING`.
    pub status: Option<TxStatus>,
    pub recurrence: Option<Recurrence>,
    pub recurring_id: Option<Id>,
    pub goal_id: Option<Id>,
}

impl NewTransaction {
    pub fn new(account_id: Id, description: impl Into<String>, amount: Money, date: NaiveDate) -> Self {
        Self {
            account_id,
            category_id: None,
            description: description.into(),
            amount,
            date,
            payment_date: None,
            status: None,
            recurrence: None,
            recurring_id: None,
            goal_id: None,
        }
    }

    pub fn category(mut self, category_id: Id) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn status(mut self, status: TxStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn recurring(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn validate(&self) -> Result<(), FinanceError> {
        let mut errors = FieldErrors::new();
        check_description(&mut errors, &self.description);
        check_amount(&mut errors, "amount", self.amount);
        if let Some(r) = &self.recurrence {
            if self.category_id.is_none() {
                errors.push("category_id", "a category is required for recurring transactions");
            }
            check_day_of_month(&mut errors, r.day_of_month);
            if r.end_date.is_some_and(|end| end < r.start_date) {
                errors.push("recurring_end_date", "end date is before the start date");
            }
        }
        errors.into_result()
    }

    fn row(&self, user: UserId, date: NaiveDate, recurring_id: Option<Id>) -> TransactionRow {
        TransactionRow {
            user_id: user,
            account_id: self.account_id,
            category_id: self.category_id,
            description: self.description.trim().to_string(),
            amount: self.amount,
            date,
            payment_date: self.payment_date,
            status: self.status.unwrap_or(TxStatus::Pending),
            recurring_id,
            goal_id: self.goal_id,
        }
    }
}

/// Result of [`create_transaction`]. `transaction` is `None` when only a
/// future-dated recurring rule was scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub transaction: Option<Transaction>,
    pub rule: Option<RecurringRule>,
}

/// Validates and books one transaction.
///
/// With a recurrence the transaction is dated at the rule's start and the
/// rule is created alongside it; both rows commit together. A recurrence
/// starting after `today` books nothing and only schedules the rule.
pub fn create_transaction<S: Store>(
    store: &S,
    user: UserId,
    input: &NewTransaction,
    today: NaiveDate,
) -> Result<WriteOutcome, FinanceError> {
    input.validate()?;
    store.atomically(|store| {
        let account = owned_account(store, user, input.account_id)?;
        let category = input
            .category_id
            .map(|id| owned_category(store, user, id))
            .transpose()?;
        let flow = Flow::new(category.as_ref().map(|c| c.direction), input.amount);

        let (Some(recurrence), Some(category)) = (&input.recurrence, &category) else {
            ensure_solvent(store, user, &account, flow)?;
            let transaction = store.insert_transaction(&input.row(user, input.date, input.recurring_id))?;
            debug!(id = transaction.id, amount = %transaction.amount, "transaction booked");
            return Ok(WriteOutcome {
                transaction: Some(transaction),
                rule: None,
            });
        };

        let start = recurrence.start_date;
        let materialize_now = start <= today;
        let next_run_date = if materialize_now {
            next_occurrence(start, recurrence.frequency, recurrence.day_of_month)
        } else {
            first_run_date(start, today, recurrence.frequency, recurrence.day_of_month)
        };
        let status = match recurrence.end_date {
            Some(end) if next_run_date >= end && materialize_now => RuleStatus::Cancelled,
            _ => RuleStatus::Active,
        };

        if materialize_now {
            ensure_solvent(store, user, &account, flow)?;
        }

        let rule = store
            .insert_rule(&RuleRow {
                user_id: user,
                account_id: account.id,
                category_id: category.id,
                description: input.description.trim().to_string(),
                amount: input.amount,
                frequency: recurrence.frequency,
                day_of_month: recurrence.day_of_month,
                start_date: start,
                end_date: recurrence.end_date,
                status,
                next_run_date,
            })
            .map_err(|err| {
                warn!("recurring rule not created, rolling back transaction: {}", err);
                err
            })?;
        store.set_catch_up_watermark(user, None)?;

        let transaction = if materialize_now {
            Some(store.insert_transaction(&input.row(user, start, Some(rule.id)))?)
        } else {
            None
        };
        debug!(rule = rule.id, next = %rule.next_run_date, booked = transaction.is_some(), "recurring transaction created");
        Ok(WriteOutcome {
            transaction,
            rule: Some(rule),
        })
    })
}

/// Deletes a transaction. A goal contribution also gives its amount back to
/// the goal, never taking the goal below zero.
pub fn delete_transaction<S: Store>(store: &S, user: UserId, id: Id) -> Result<Transaction, FinanceError> {
    store.atomically(|store| {
        let transaction = match store.get_transaction(id)? {
            Some(tx) if tx.user_id == user => tx,
            _ => return Err(FinanceError::NotFound("transaction")),
        };
        if let Some(goal_id) = transaction.goal_id {
            match store.get_goal(goal_id)? {
                Some(goal) if goal.user_id == user => {
                    let current = (goal.current_amount - transaction.amount).max(Money::ZERO);
                    store.update_goal(
                        goal.id,
                        &GoalPatch {
                            current_amount: Some(current),
                            ..Default::default()
                        },
                    )?;
                    debug!(goal = goal.id, %current, "goal contribution reversed");
                }
                _ => {}
            }
        }
        store.delete_transaction(id)?;
        Ok(transaction)
    })
}
