// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use super::{Session, account_id, opt_date};
use crate::ledger::goals::{
    Contribution, GoalEdit, NewGoal, contribute_to_goal, create_goal, delete_goal,
    progress_percent, update_goal,
};
use crate::models::{Goal, Money};
use crate::store::{SqliteStore, Store};
use crate::utils::{fmt_opt_date, maybe_print_json, parse_money, pretty_table};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let goal = create_goal(
                store,
                session.user,
                &NewGoal {
                    name: sub.get_one::<String>("name").unwrap().clone(),
                    target_amount: parse_money(sub.get_one::<String>("target").unwrap())?,
                    current_amount: parse_money(sub.get_one::<String>("current").unwrap())?,
                    deadline: opt_date(sub, "deadline")?,
                },
            )?;
            println!(
                "Added goal {} '{}' (target {})",
                goal.id, goal.name, goal.target_amount
            );
        }
        Some(("list", sub)) => list(store, session, sub)?,
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let deadline = if sub.get_flag("clear-deadline") {
                Some(None)
            } else {
                opt_date(sub, "deadline")?.map(Some)
            };
            let edit = GoalEdit {
                name: sub.get_one::<String>("name").cloned(),
                target_amount: sub
                    .get_one::<String>("target")
                    .map(|s| parse_money(s))
                    .transpose()?,
                current_amount: sub
                    .get_one::<String>("current")
                    .map(|s| parse_money(s))
                    .transpose()?,
                deadline,
            };
            let goal = update_goal(store, session.user, id, &edit)?;
            println!(
                "Updated goal {} '{}' ({} of {})",
                goal.id, goal.name, goal.current_amount, goal.target_amount
            );
        }
        Some(("contribute", sub)) => {
            let contribution = Contribution {
                goal_id: *sub.get_one::<i64>("id").unwrap(),
                account_id: account_id(store, session, sub.get_one::<String>("account").unwrap())?,
                amount: parse_money(sub.get_one::<String>("amount").unwrap())?,
                date: opt_date(sub, "date")?.unwrap_or(session.today),
            };
            let outcome = contribute_to_goal(store, session.user, &contribution)?;
            println!(
                "Contributed {} to '{}', now {} of {} ({}%)",
                contribution.amount,
                outcome.goal.name,
                outcome.goal.current_amount,
                outcome.goal.target_amount,
                progress_percent(&outcome.goal)
            );
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            delete_goal(store, session.user, id)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct GoalLine {
    #[serde(flatten)]
    pub goal: Goal,
    pub remaining: Money,
    pub percent: i64,
}

fn list(store: &SqliteStore, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<GoalLine> = store
        .list_goals(session.user)?
        .into_iter()
        .map(|goal| GoalLine {
            remaining: (goal.target_amount - goal.current_amount).max(Money::ZERO),
            percent: progress_percent(&goal),
            goal,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|l| {
                vec![
                    l.goal.id.to_string(),
                    l.goal.name.clone(),
                    l.goal.current_amount.to_string(),
                    l.goal.target_amount.to_string(),
                    l.remaining.to_string(),
                    format!("{}%", l.percent),
                    fmt_opt_date(l.goal.deadline),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Current", "Target", "Remaining", "Progress", "Deadline"],
                rows,
            )
        );
    }
    Ok(())
}
