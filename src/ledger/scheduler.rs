// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Catch-up driver for recurring rules.
//!
//! A single pass of [`process_due_rules`] books one occurrence per rule. A
//! rule that fell several cycles behind needs several passes, so
//! [`catch_up`] keeps going until a pass books nothing.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::recurring::{CatchUpReport, process_due_rules};
use crate::error::FinanceError;
use crate::models::UserId;
use crate::store::Store;

/// Upper bound on passes. A daily rule three years behind stays well below it.
pub const MAX_PASSES: usize = 5_000;

/// Runs catch-up passes until nothing is left to book for `today`.
pub fn catch_up<S: Store>(
    store: &S,
    user: UserId,
    today: NaiveDate,
) -> Result<CatchUpReport, FinanceError> {
    let mut total = CatchUpReport::default();
    for _ in 0..MAX_PASSES {
        let pass = process_due_rules(store, user, today)?;
        let done = pass.processed == 0;
        total.absorb(pass);
        if done {
            return Ok(total);
        }
    }
    warn!(user, passes = MAX_PASSES, "catch-up stopped before reaching today");
    Ok(total)
}

/// Like [`catch_up`] but a no-op when a catch-up already finished for
/// `today`. Returns `None` when nothing ran.
///
/// Creating, editing or resuming a rule clears the watermark, so the next
/// read picks the change up the same day. A catch-up with failed occurrences
/// leaves the watermark alone, so an occurrence refused for funds is retried
/// on the next read once money has come in.
pub fn catch_up_if_stale<S: Store>(
    store: &S,
    user: UserId,
    today: NaiveDate,
) -> Result<Option<CatchUpReport>, FinanceError> {
    if store
        .catch_up_watermark(user)?
        .is_some_and(|mark| mark >= today)
    {
        return Ok(None);
    }
    let report = catch_up(store, user, today)?;
    if report.failed == 0 {
        store.set_catch_up_watermark(user, Some(today))?;
    }
    if report.processed > 0 || report.cancelled > 0 {
        info!(
            user,
            %today,
            processed = report.processed,
            cancelled = report.cancelled,
            "recurring rules caught up"
        );
    }
    Ok(Some(report))
}
