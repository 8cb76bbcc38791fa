// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::{Session, category, opt_direction};
use crate::ledger::accounts::{NewCategory, create_category, delete_category};
use crate::models::{BudgetClass, Direction};
use crate::store::{SqliteStore, Store};
use crate::utils::{maybe_print_json, parse_enum, pretty_table};

pub fn handle(store: &SqliteStore, session: &Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let direction: Direction = parse_enum(sub.get_one::<String>("direction").unwrap())?;
            let budget_class = sub
                .get_one::<String>("budget-class")
                .map(|s| parse_enum::<BudgetClass>(s))
                .transpose()?;
            let color = sub.get_one::<String>("color").map(|s| s.trim().to_string());
            let created = create_category(
                store,
                session.user,
                &NewCategory {
                    name: name.clone(),
                    direction,
                    budget_class,
                    color,
                },
            )?;
            println!("Added category '{}' ({})", created.name, created.direction);
        }
        Some(("list", sub)) => {
            let data = store.list_categories(session.user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.direction.to_string(),
                            c.budget_class.map(|b| b.label().to_string()).unwrap_or_default(),
                            c.color.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Direction", "Budget class", "Color"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let found = category(store, session, name, opt_direction(sub)?)?;
            delete_category(store, session.user, found.id)?;
            println!("Removed category '{}' ({})", found.name, found.direction);
        }
        _ => {}
    }
    Ok(())
}
