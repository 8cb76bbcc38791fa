// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::config::{KEYS, get_setting, load, set_setting};
use crate::store::SqliteStore;
use crate::utils::pretty_table;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    let conn = store.conn();
    match m.subcommand() {
        Some(("get", sub)) => match sub.get_one::<String>("key") {
            Some(key) => match get_setting(conn, key.trim())? {
                Some(v) => println!("{}", v),
                None => println!("{} is not set", key.trim()),
            },
            None => {
                let settings = load(conn)?;
                let rows = KEYS
                    .iter()
                    .map(|k| {
                        let v = match *k {
                            "default_user" => settings.default_user.to_string(),
                            "lookback_months" => settings.lookback_months.to_string(),
                            _ => String::new(),
                        };
                        vec![k.to_string(), v]
                    })
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        },
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap().trim();
            set_setting(conn, key, value)?;
            println!("Set {} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
