// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod config;
pub mod dashboard;
pub mod goals;
pub mod recurring;
pub mod transactions;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::models::{Category, Direction, Id, UserId};
use crate::store::{SqliteStore, Store};
use crate::utils::{parse_date, parse_enum};

/// Optional `YYYY-MM-DD` argument.
pub fn opt_date(sub: &clap::ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    sub.get_one::<String>(name)
        .map(|s| parse_date(s))
        .transpose()
}

/// Per-invocation context shared by all handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user: UserId,
    pub today: NaiveDate,
    pub lookback_months: u32,
}

pub fn account_id(store: &SqliteStore, session: &Session, name: &str) -> Result<Id> {
    let name = name.trim();
    store
        .list_accounts(session.user)?
        .into_iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .map(|a| a.id)
        .ok_or_else(|| anyhow!("Account '{}' not found", name))
}

/// The optional `--direction` of a subcommand.
pub fn opt_direction(sub: &clap::ArgMatches) -> Result<Option<Direction>> {
    sub.get_one::<String>("direction")
        .map(|s| parse_enum::<Direction>(s))
        .transpose()
}

/// Looks a category up by name. When the user has both an income and an
/// expense category with that name, `direction` has to pick one.
pub fn category(
    store: &SqliteStore,
    session: &Session,
    name: &str,
    direction: Option<Direction>,
) -> Result<Category> {
    let name = name.trim();
    let mut found: Vec<Category> = store
        .list_categories(session.user)?
        .into_iter()
        .filter(|c| c.name.eq_ignore_ascii_case(name))
        .filter(|c| direction.is_none_or(|d| c.direction == d))
        .collect();
    match found.len() {
        0 => Err(anyhow!("Category '{}' not found", name)),
        1 => Ok(found.remove(0)),
        _ => Err(anyhow!(
            "Category '{}' exists as both income and expense, pass --direction",
            name
        )),
    }
}
