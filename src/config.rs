// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::models::UserId;

pub const DEFAULT_USER: UserId = 1;
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 6;

pub const KEYS: &[&str] = &["default_user", "lookback_months"];

/// Persisted CLI settings, stored in the `settings` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub default_user: UserId,
    pub lookback_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_user: DEFAULT_USER,
            lookback_months: DEFAULT_LOOKBACK_MONTHS,
        }
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}', expected one of: {}",
            key,
            KEYS.join(", ")
        ));
    }
    validate(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn validate(key: &str, value: &str) -> Result<()> {
    match key {
        "default_user" => {
            value
                .trim()
                .parse::<UserId>()
                .with_context(|| format!("Invalid user id '{}'", value))?;
        }
        "lookback_months" => {
            let n = value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid month count '{}'", value))?;
            if n == 0 || n > 120 {
                return Err(anyhow!("lookback_months must be between 1 and 120"));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn load(conn: &Connection) -> Result<Settings> {
    let mut settings = Settings::default();
    if let Some(v) = get_setting(conn, "default_user")? {
        settings.default_user = v
            .trim()
            .parse()
            .with_context(|| format!("Invalid stored default_user '{}'", v))?;
    }
    if let Some(v) = get_setting(conn, "lookback_months")? {
        settings.lookback_months = v
            .trim()
            .parse()
            .with_context(|| format!("Invalid stored lookback_months '{}'", v))?;
    }
    Ok(settings)
}
