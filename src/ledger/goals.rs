// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Savings goals and contributions.

use chrono::NaiveDate;
use tracing::debug;

use super::check_amount;
use super::writer::{NewTransaction, create_transaction};
use crate::error::{FieldErrors, FinanceError};
use crate::models::{
    Category, CategoryRow, Direction, Goal, GoalPatch, GoalRow, Id, Money, Transaction, TxStatus,
    UserId,
};
use crate::store::Store;

/// Expense category every contribution is booked under.
pub const CONTRIBUTION_CATEGORY: &str = "Goal contributions";
pub const MAX_GOAL_NAME_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalEdit {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub current_amount: Option<Money>,
    pub deadline: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub goal_id: Id,
    pub account_id: Id,
    pub amount: Money,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionOutcome {
    pub transaction: Transaction,
    pub goal: Goal,
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    let n = name.trim().chars().count();
    if n == 0 {
        errors.push("name", "name is required");
    } else if n > MAX_GOAL_NAME_LEN {
        errors.push(
            "name",
            format!("name is longer than {} characters", MAX_GOAL_NAME_LEN),
        );
    }
}

fn check_amounts(errors: &mut FieldErrors, target: Option<Money>, current: Option<Money>) {
    if let Some(target) = target {
        check_amount(errors, "target_amount", target);
    }
    match current {
        Some(c) if c.is_negative() => {
            errors.push("current_amount", "current amount cannot be negative")
        }
        Some(c) if !c.is_within_limit() => {
            errors.push("current_amount", "current_amount is out of range")
        }
        _ => {}
    }
}

fn owned_goal<S: Store>(store: &S, user: UserId, id: Id) -> Result<Goal, FinanceError> {
    match store.get_goal(id)? {
        Some(goal) if goal.user_id == user => Ok(goal),
        _ => Err(FinanceError::NotFound("goal")),
    }
}

pub fn create_goal<S: Store>(store: &S, user: UserId, input: &NewGoal) -> Result<Goal, FinanceError> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, &input.name);
    check_amounts(
        &mut errors,
        Some(input.target_amount),
        Some(input.current_amount),
    );
    errors.into_result()?;
    store.insert_goal(&GoalRow {
        user_id: user,
        name: input.name.trim().to_string(),
        target_amount: input.target_amount,
        current_amount: input.current_amount,
        deadline: input.deadline,
    })
}

pub fn update_goal<S: Store>(
    store: &S,
    user: UserId,
    id: Id,
    edit: &GoalEdit,
) -> Result<Goal, FinanceError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &edit.name {
        check_name(&mut errors, name);
    }
    check_amounts(&mut errors, edit.target_amount, edit.current_amount);
    errors.into_result()?;
    store.atomically(|store| {
        owned_goal(store, user, id)?;
        store.update_goal(
            id,
            &GoalPatch {
                name: edit.name.as_ref().map(|n| n.trim().to_string()),
                target_amount: edit.target_amount,
                current_amount: edit.current_amount,
                deadline: edit.deadline,
            },
        )?;
        owned_goal(store, user, id)
    })
}

/// Deletes a goal. Past contributions stay in the ledger.
pub fn delete_goal<S: Store>(store: &S, user: UserId, id: Id) -> Result<(), FinanceError> {
    store.atomically(|store| {
        owned_goal(store, user, id)?;
        store.delete_goal(id)?;
        Ok(())
    })
}

fn contribution_category<S: Store>(store: &S, user: UserId) -> Result<Category, FinanceError> {
    if let Some(category) = store.find_category(user, CONTRIBUTION_CATEGORY, Direction::Expense)? {
        return Ok(category);
    }
    debug!(user, "creating goal contribution category");
    store.insert_category(&CategoryRow {
        user_id: user,
        name: CONTRIBUTION_CATEGORY.to_string(),
        direction: Direction::Expense,
        budget_class: None,
        color: None,
    })
}

/// Moves money from an account into a goal: books a paid expense tagged
/// with the goal and raises the goal's `current_amount`. The solvency
/// check applies like for any other expense.
pub fn contribute_to_goal<S: Store>(
    store: &S,
    user: UserId,
    input: &Contribution,
) -> Result<ContributionOutcome, FinanceError> {
    let mut errors = FieldErrors::new();
    check_amount(&mut errors, "amount", input.amount);
    errors.into_result()?;
    store.atomically(|store| {
        let goal = owned_goal(store, user, input.goal_id)?;
        let category = contribution_category(store, user)?;
        let mut booking = NewTransaction::new(
            input.account_id,
            format!("Contribution to goal: {}", goal.name),
            input.amount,
            input.date,
        )
        .category(category.id)
        .status(TxStatus::Paid);
        booking.goal_id = Some(goal.id);

        let written = create_transaction(store, user, &booking, input.date)?;
        let transaction = written.transaction.ok_or_else(|| {
            FinanceError::Persistence("contribution transaction was not written".to_string())
        })?;

        store.update_goal(
            goal.id,
            &GoalPatch {
                current_amount: Some(goal.current_amount + input.amount),
                ..Default::default()
            },
        )?;
        let goal = owned_goal(store, user, goal.id)?;
        debug!(goal = goal.id, current = %goal.current_amount, "goal contribution booked");
        Ok(ContributionOutcome { transaction, goal })
    })
}

/// Progress towards `goal` in whole percent, 0 for a zero target.
pub fn progress_percent(goal: &Goal) -> i64 {
    if !goal.target_amount.is_positive() {
        return 0;
    }
    let current = goal.current_amount.minor() as i128;
    let target = goal.target_amount.minor() as i128;
    ((current * 100 + target / 2) / target) as i64
}
