// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;

use cashloop::commands::{self, Session};
use cashloop::store::SqliteStore;
use cashloop::{cli, config, db, utils};

fn main() -> Result<()> {
    utils::init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::db_path()?,
    };
    let store = SqliteStore::new(db::open_at(&path)?);

    let settings = config::load(store.conn())?;
    let session = Session {
        user: matches
            .get_one::<i64>("user")
            .copied()
            .unwrap_or(settings.default_user),
        today: match matches.get_one::<String>("as-of") {
            Some(d) => utils::parse_date(d)?,
            None => Local::now().date_naive(),
        },
        lookback_months: settings.lookback_months,
    };
    tracing::debug!(user = session.user, today = %session.today, db = %path.display(), "session");

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&store, &session, sub)?,
        Some(("category", sub)) => commands::categories::handle(&store, &session, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&store, &session, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&store, &session, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&store, &session, sub)?,
        Some(("dashboard", sub)) => commands::dashboard::handle(&store, &session, sub)?,
        Some(("config", sub)) => commands::config::handle(&store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
