// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use super::{Session, account_id};
use crate::ledger::accounts::{NewAccount, account_balances, create_account, delete_account};
use crate::ledger::scheduler::catch_up_if_stale;
use crate::models::{AccountKind, Money};
use crate::store::SqliteStore;
use crate::utils::{maybe_print_json, parse_enum, parse_money, pretty_table};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: AccountKind = parse_enum(sub.get_one::<String>("kind").unwrap())?;
            let initial = parse_money(sub.get_one::<String>("initial").unwrap())?;
            let account = create_account(
                store,
                session.user,
                &NewAccount {
                    name: name.clone(),
                    kind,
                    initial_balance: initial,
                },
            )?;
            println!(
                "Added account '{}' ({}, opening balance {})",
                account.name, account.kind, account.initial_balance
            );
        }
        Some(("list", sub)) => list(store, session, sub, false)?,
        Some(("balance", sub)) => list(store, session, sub, true)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = account_id(store, session, name)?;
            delete_account(store, session.user, id)?;
            println!("Removed account '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct AccountLine {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Money,
    pub balance: Money,
    pub is_active: bool,
}

fn list(
    store: &SqliteStore,
    session: &Session,
    sub: &clap::ArgMatches,
    with_balances: bool,
) -> Result<()> {
    if with_balances {
        catch_up_if_stale(store, session.user, session.today)?;
    }
    let only = sub
        .try_get_one::<String>("name")
        .ok()
        .flatten()
        .map(|s| s.trim().to_string());
    let data: Vec<AccountLine> = account_balances(store, session.user)?
        .into_iter()
        .filter(|(a, _)| only.as_ref().is_none_or(|n| a.name.eq_ignore_ascii_case(n)))
        .map(|(a, balance)| AccountLine {
            id: a.id,
            name: a.name,
            kind: a.kind,
            initial_balance: a.initial_balance,
            balance,
            is_active: a.is_active,
        })
        .collect();

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|a| {
            let mut row = vec![a.id.to_string(), a.name.clone(), a.kind.to_string()];
            if with_balances {
                row.push(a.initial_balance.to_string());
                row.push(a.balance.to_string());
            } else {
                row.push(if a.is_active { "yes" } else { "no" }.to_string());
            }
            row
        })
        .collect();
    let headers: &[&str] = if with_balances {
        &["ID", "Name", "Kind", "Opening", "Balance"]
    } else {
        &["ID", "Name", "Kind", "Active"]
    };
    println!("{}", pretty_table(headers, rows));
    if with_balances && only.is_none() {
        let total: Money = data.iter().map(|a| a.balance).sum();
        println!("Total: {}", total);
    }
    Ok(())
}
