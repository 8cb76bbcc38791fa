// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use super::{Session, account_id, category, opt_date, opt_direction};
use crate::ledger::scheduler::catch_up_if_stale;
use crate::ledger::writer::{NewTransaction, Recurrence, create_transaction, delete_transaction};
use crate::models::{Direction, Flow, Frequency, Id, Money, TxStatus};
use crate::store::{SqliteStore, Store};
use crate::utils::{
    fmt_opt_date, maybe_print_json, parse_enum, parse_money, parse_month, pretty_table,
};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, session, sub)?,
        Some(("list", sub)) => list(store, session, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let removed = delete_transaction(store, session.user, id)?;
            println!(
                "Removed transaction {} ('{}', {})",
                removed.id, removed.description, removed.amount
            );
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let account = account_id(store, session, sub.get_one::<String>("account").unwrap())?;
    let amount = parse_money(sub.get_one::<String>("amount").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap();
    let date = opt_date(sub, "date")?.unwrap_or(session.today);

    let mut input = NewTransaction::new(account, description.as_str(), amount, date);
    if let Some(name) = sub.get_one::<String>("category") {
        input = input.category(category(store, session, name, opt_direction(sub)?)?.id);
    }
    if let Some(status) = sub.get_one::<String>("status") {
        input = input.status(parse_enum::<TxStatus>(status)?);
    }
    input.payment_date = opt_date(sub, "payment-date")?;
    if let Some(freq) = sub.get_one::<String>("recurring") {
        let mut recurrence = Recurrence::new(
            parse_enum::<Frequency>(freq)?,
            opt_date(sub, "start")?.unwrap_or(date),
        );
        recurrence.day_of_month = sub.get_one::<u32>("day-of-month").copied();
        recurrence.end_date = opt_date(sub, "end")?;
        input = input.recurring(recurrence);
    }

    let outcome = create_transaction(store, session.user, &input, session.today)?;
    if let Some(tx) = &outcome.transaction {
        println!(
            "Recorded {} on {} '{}' (id {})",
            tx.amount, tx.date, tx.description, tx.id
        );
    }
    if let Some(rule) = &outcome.rule {
        println!(
            "Recurring rule {} ({}) next due {}",
            rule.id, rule.frequency, rule.next_run_date
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionLine {
    pub id: Id,
    pub date: NaiveDate,
    pub account: String,
    pub description: String,
    pub category: Option<String>,
    pub direction: Option<Direction>,
    pub amount: Money,
    pub status: TxStatus,
    pub payment_date: Option<NaiveDate>,
    pub recurring_id: Option<Id>,
    pub goal_id: Option<Id>,
}

pub fn query_lines(
    store: &SqliteStore,
    session: &Session,
    account: Option<&str>,
    month: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<TransactionLine>> {
    let account = account.map(|a| account_id(store, session, a)).transpose()?;
    let account_names: HashMap<Id, String> = store
        .list_accounts(session.user)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let category_names: HashMap<Id, String> = store
        .list_categories(session.user)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let lines = store
        .list_transactions(session.user, account)?
        .into_iter()
        .rev()
        .filter(|tx| month.is_none_or(|m| tx.date.format("%Y-%m").to_string() == m))
        .take(limit.unwrap_or(usize::MAX))
        .map(|tx| TransactionLine {
            id: tx.id,
            date: tx.date,
            account: account_names.get(&tx.account_id).cloned().unwrap_or_default(),
            description: tx.description,
            category: tx.category_id.and_then(|id| category_names.get(&id).cloned()),
            direction: tx.direction,
            amount: tx.amount,
            status: tx.status,
            payment_date: tx.payment_date,
            recurring_id: tx.recurring_id,
            goal_id: tx.goal_id,
        })
        .collect();
    Ok(lines)
}

fn list(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    catch_up_if_stale(store, session.user, session.today)?;
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let data = query_lines(
        store,
        session,
        sub.get_one::<String>("account").map(|s| s.as_str()),
        month.as_deref(),
        sub.get_one::<usize>("limit").copied(),
    )?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|t| {
                let signed = Flow::new(t.direction, t.amount).signed();
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.account.clone(),
                    t.description.clone(),
                    t.category.clone().unwrap_or_default(),
                    signed.to_string(),
                    t.status.to_string(),
                    fmt_opt_date(t.payment_date),
                    t.recurring_id.map(|r| r.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Date", "Account", "Description", "Category", "Amount", "Status", "Paid on",
                    "Rule"
                ],
                rows,
            )
        );
    }
    Ok(())
}
