// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring rule engine.
//!
//! A rule is `ACTIVE`, `PAUSED` or `CANCELLED`; `CANCELLED` is terminal.
//! [`process_due_rules`] materializes at most one occurrence per due rule
//! and then advances `next_run_date`, or cancels the rule once the next
//! occurrence would fall on or after its end date.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::projection::{first_run_date, next_occurrence};
use super::writer::{NewTransaction, create_transaction};
use super::{check_amount, check_day_of_month, check_description, owned_account, owned_category, owned_rule};
use crate::error::{FieldErrors, FinanceError};
use crate::models::{
    Frequency, Id, Money, RecurringRule, RulePatch, RuleRow, RuleStatus, TxStatus, UserId,
};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub account_id: Id,
    pub category_id: Id,
    pub description: String,
    pub amount: Money,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewRule {
    pub fn validate(&self) -> Result<(), FinanceError> {
        let mut errors = FieldErrors::new();
        check_description(&mut errors, &self.description);
        check_amount(&mut errors, "amount", self.amount);
        check_day_of_month(&mut errors, self.day_of_month);
        if self.end_date.is_some_and(|end| end < self.start_date) {
            errors.push("end_date", "end date is before the start date");
        }
        errors.into_result()
    }
}

/// Field edits for an existing rule. Status and `next_run_date` are not
/// editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleEdit {
    pub account_id: Option<Id>,
    pub category_id: Option<Id>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub frequency: Option<Frequency>,
    pub day_of_month: Option<Option<u32>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
}

/// Outcome of one catch-up pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatchUpReport {
    /// Occurrences materialized as transactions.
    pub processed: usize,
    /// Rules cancelled because they ran past their end date.
    pub cancelled: usize,
    /// Rules sitting exactly on their end date.
    pub skipped: usize,
    /// Occurrences dropped because the writer refused them.
    pub failed: usize,
}

impl CatchUpReport {
    /// Folds a later pass into this one. Skipped and failed rules stay due
    /// and show up again in every pass, so only the latest count is kept.
    pub fn absorb(&mut self, other: CatchUpReport) {
        self.processed += other.processed;
        self.cancelled += other.cancelled;
        self.skipped = other.skipped;
        self.failed = other.failed;
    }
}

/// Creates an `ACTIVE` rule without booking anything. The first due date is
/// [`first_run_date`] of the start date.
pub fn create_rule<S: Store>(
    store: &S,
    user: UserId,
    input: &NewRule,
    today: NaiveDate,
) -> Result<RecurringRule, FinanceError> {
    input.validate()?;
    store.atomically(|store| {
        owned_account(store, user, input.account_id)?;
        owned_category(store, user, input.category_id)?;
        let rule = store.insert_rule(&RuleRow {
            user_id: user,
            account_id: input.account_id,
            category_id: input.category_id,
            description: input.description.trim().to_string(),
            amount: input.amount,
            frequency: input.frequency,
            day_of_month: input.day_of_month,
            start_date: input.start_date,
            end_date: input.end_date,
            status: RuleStatus::Active,
            next_run_date: first_run_date(
                input.start_date,
                today,
                input.frequency,
                input.day_of_month,
            ),
        })?;
        store.set_catch_up_watermark(user, None)?;
        debug!(rule = rule.id, next = %rule.next_run_date, "recurring rule created");
        Ok(rule)
    })
}

pub fn update_rule<S: Store>(
    store: &S,
    user: UserId,
    id: Id,
    edit: &RuleEdit,
    today: NaiveDate,
) -> Result<RecurringRule, FinanceError> {
    let mut errors = FieldErrors::new();
    if let Some(d) = &edit.description {
        check_description(&mut errors, d);
    }
    if let Some(amount) = edit.amount {
        check_amount(&mut errors, "amount", amount);
    }
    if let Some(day) = edit.day_of_month {
        check_day_of_month(&mut errors, day);
    }
    errors.into_result()?;

    store.atomically(|store| {
        let rule = owned_rule(store, user, id)?;
        if let Some(account_id) = edit.account_id {
            owned_account(store, user, account_id)?;
        }
        if let Some(category_id) = edit.category_id {
            owned_category(store, user, category_id)?;
        }
        let start = edit.start_date.unwrap_or(rule.start_date);
        let end = edit.end_date.unwrap_or(rule.end_date);
        if end.is_some_and(|e| e < start) {
            return Err(FieldErrors::single("end_date", "end date is before the start date").into());
        }
        // A later start pushes the schedule forward; it never pulls it back.
        let next_run_date = (start > rule.next_run_date).then(|| {
            first_run_date(
                start,
                today,
                edit.frequency.unwrap_or(rule.frequency),
                edit.day_of_month.unwrap_or(rule.day_of_month),
            )
        });
        store.update_rule(
            id,
            &RulePatch {
                account_id: edit.account_id,
                category_id: edit.category_id,
                description: edit.description.as_ref().map(|d| d.trim().to_string()),
                amount: edit.amount,
                frequency: edit.frequency,
                day_of_month: edit.day_of_month,
                start_date: edit.start_date,
                end_date: edit.end_date,
                status: None,
                next_run_date,
            },
        )?;
        store.set_catch_up_watermark(user, None)?;
        owned_rule(store, user, id)
    })
}

/// Deletes a rule. Transactions it already produced stay and lose their
/// back-reference.
pub fn delete_rule<S: Store>(store: &S, user: UserId, id: Id) -> Result<(), FinanceError> {
    store.atomically(|store| {
        owned_rule(store, user, id)?;
        store.delete_rule(id)?;
        Ok(())
    })
}

/// Manual status change. `next_run_date` is left alone, so resuming a rule
/// paused for a while makes the missed cycles due again.
pub fn set_status<S: Store>(
    store: &S,
    user: UserId,
    id: Id,
    status: RuleStatus,
) -> Result<RecurringRule, FinanceError> {
    store.atomically(|store| {
        let rule = owned_rule(store, user, id)?;
        if rule.status == RuleStatus::Cancelled && status != RuleStatus::Cancelled {
            return Err(FieldErrors::single("status", "a cancelled rule cannot be reactivated").into());
        }
        store.update_rule(id, &RulePatch::status(status))?;
        if status == RuleStatus::Active {
            store.set_catch_up_watermark(user, None)?;
        }
        owned_rule(store, user, id)
    })
}

/// One catch-up pass over the user's due rules.
///
/// Each due rule yields at most one `PAID` transaction dated at its
/// `next_run_date`. When the writer refuses the occurrence (insufficient
/// funds, account gone) the rule is left untouched and the occurrence is
/// not retried at another date. Store failures abort the pass.
pub fn process_due_rules<S: Store>(
    store: &S,
    user: UserId,
    today: NaiveDate,
) -> Result<CatchUpReport, FinanceError> {
    let due = store.list_due_rules(user, today)?;
    let mut report = CatchUpReport::default();

    for rule in &due {
        if let Some(end) = rule.end_date {
            if rule.next_run_date > end {
                store.update_rule(rule.id, &RulePatch::status(RuleStatus::Cancelled))?;
                info!(rule = rule.id, %end, "recurring rule ran past its end date, cancelled");
                report.cancelled += 1;
                continue;
            }
            if rule.next_run_date == end {
                report.skipped += 1;
                continue;
            }
        }

        match materialize(store, user, rule, today) {
            Ok(status) => {
                report.processed += 1;
                if status == RuleStatus::Cancelled {
                    report.cancelled += 1;
                }
            }
            Err(err @ FinanceError::Persistence(_)) => return Err(err),
            Err(err) => {
                warn!(rule = rule.id, due = %rule.next_run_date, "occurrence dropped: {}", err);
                report.failed += 1;
            }
        }
    }

    if !due.is_empty() {
        info!(
            user,
            processed = report.processed,
            cancelled = report.cancelled,
            failed = report.failed,
            "recurring catch-up pass finished"
        );
    }
    Ok(report)
}

/// Books the rule's due occurrence and advances the rule, as one unit.
fn materialize<S: Store>(
    store: &S,
    user: UserId,
    rule: &RecurringRule,
    today: NaiveDate,
) -> Result<RuleStatus, FinanceError> {
    store.atomically(|store| {
        let mut occurrence = NewTransaction::new(
            rule.account_id,
            rule.description.clone(),
            rule.amount,
            rule.next_run_date,
        )
        .category(rule.category_id)
        .status(TxStatus::Paid);
        occurrence.recurring_id = Some(rule.id);
        create_transaction(store, user, &occurrence, today)?;

        let next = next_occurrence(rule.next_run_date, rule.frequency, rule.day_of_month);
        if rule.end_date.is_some_and(|end| next >= end) {
            store.update_rule(rule.id, &RulePatch::status(RuleStatus::Cancelled))?;
            debug!(rule = rule.id, %next, "last occurrence booked, rule cancelled");
            Ok(RuleStatus::Cancelled)
        } else {
            store.update_rule(rule.id, &RulePatch::next_run(next))?;
            debug!(rule = rule.id, %next, "occurrence booked");
            Ok(RuleStatus::Active)
        }
    })
}
