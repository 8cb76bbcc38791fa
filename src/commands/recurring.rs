// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{Session, account_id, category, opt_date, opt_direction};
use crate::ledger::recurring::{NewRule, RuleEdit, create_rule, delete_rule, set_status, update_rule};
use crate::ledger::scheduler::{catch_up, catch_up_if_stale};
use crate::models::{Frequency, RuleStatus};
use crate::store::{SqliteStore, Store};
use crate::utils::{fmt_opt_date, maybe_print_json, parse_enum, parse_money, pretty_table};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, session, sub)?,
        Some(("list", sub)) => list(store, session, sub)?,
        Some(("edit", sub)) => edit(store, session, sub)?,
        Some(("pause", sub)) => status(store, session, sub, RuleStatus::Paused)?,
        Some(("resume", sub)) => status(store, session, sub, RuleStatus::Active)?,
        Some(("cancel", sub)) => status(store, session, sub, RuleStatus::Cancelled)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_rule(store, session.user, id)?;
            println!("Removed recurring rule {}", id);
        }
        Some(("run", sub)) => {
            let report = catch_up(store, session.user, session.today)?;
            if report.failed == 0 {
                store.set_catch_up_watermark(session.user, Some(session.today))?;
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                println!(
                    "Booked {} occurrence(s), cancelled {} rule(s), {} skipped, {} failed",
                    report.processed, report.cancelled, report.skipped, report.failed
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let input = NewRule {
        account_id: account_id(store, session, sub.get_one::<String>("account").unwrap())?,
        category_id: category(
            store,
            session,
            sub.get_one::<String>("category").unwrap(),
            opt_direction(sub)?,
        )?
        .id,
        description: sub.get_one::<String>("description").unwrap().clone(),
        amount: parse_money(sub.get_one::<String>("amount").unwrap())?,
        frequency: parse_enum::<Frequency>(sub.get_one::<String>("frequency").unwrap())?,
        day_of_month: sub.get_one::<u32>("day-of-month").copied(),
        start_date: opt_date(sub, "start")?.unwrap_or(session.today),
        end_date: opt_date(sub, "end")?,
    };
    let rule = create_rule(store, session.user, &input, session.today)?;
    println!(
        "Added recurring rule {} '{}' ({}), next due {}",
        rule.id, rule.description, rule.frequency, rule.next_run_date
    );
    Ok(())
}

fn edit(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let direction = opt_direction(sub)?;
    let day_of_month = if sub.get_flag("clear-day") {
        Some(None)
    } else {
        sub.get_one::<u32>("day-of-month").map(|d| Some(*d))
    };
    let end_date = if sub.get_flag("clear-end") {
        Some(None)
    } else {
        opt_date(sub, "end")?.map(Some)
    };
    let edit = RuleEdit {
        account_id: sub
            .get_one::<String>("account")
            .map(|a| account_id(store, session, a))
            .transpose()?,
        category_id: sub
            .get_one::<String>("category")
            .map(|c| category(store, session, c, direction).map(|c| c.id))
            .transpose()?,
        description: sub.get_one::<String>("description").cloned(),
        amount: sub
            .get_one::<String>("amount")
            .map(|a| parse_money(a))
            .transpose()?,
        frequency: sub
            .get_one::<String>("frequency")
            .map(|f| parse_enum::<Frequency>(f))
            .transpose()?,
        day_of_month,
        start_date: opt_date(sub, "start")?,
        end_date,
    };
    let rule = update_rule(store, session.user, id, &edit, session.today)?;
    println!(
        "Updated recurring rule {} '{}', next due {}",
        rule.id, rule.description, rule.next_run_date
    );
    Ok(())
}

fn status(
    store: &SqliteStore,
    session: &Session,
    sub: &clap::ArgMatches,
    to: RuleStatus,
) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let rule = set_status(store, session.user, id, to)?;
    println!("Recurring rule {} is now {}", rule.id, rule.status);
    Ok(())
}

fn list(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    catch_up_if_stale(store, session.user, session.today)?;
    let data = store.list_rules(session.user)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.description.clone(),
                    r.amount.to_string(),
                    r.frequency.to_string(),
                    r.day_of_month.map(|d| d.to_string()).unwrap_or_default(),
                    r.start_date.to_string(),
                    fmt_opt_date(r.end_date),
                    r.status.to_string(),
                    r.next_run_date.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Description", "Amount", "Frequency", "Day", "Start", "End", "Status",
                    "Next run"
                ],
                rows,
            )
        );
    }
    Ok(())
}
