// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record store used by the ledger.
//!
//! The ledger only talks to storage through [`Store`]; [`SqliteStore`] is the
//! implementation shipped with the CLI. Stores never check ownership, that
//! happens one layer up, but every listing is scoped by user id.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};

use crate::error::FinanceError;
use crate::models::{
    Account, AccountRow, Category, CategoryRow, Direction, Goal, GoalPatch, GoalRow, Id,
    RecurringRule, RuleRow, RulePatch, RuleStatus, Transaction, TransactionRow, UserId,
};

pub type StoreResult<T> = Result<T, FinanceError>;

pub trait Store {
    /// Runs `f` as one unit of work: every write inside it commits together
    /// or not at all. Calls may nest.
    fn atomically<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>;

    fn get_account(&self, id: Id) -> StoreResult<Option<Account>>;
    fn list_accounts(&self, user: UserId) -> StoreResult<Vec<Account>>;
    fn insert_account(&self, row: &AccountRow) -> StoreResult<Account>;
    fn delete_account(&self, id: Id) -> StoreResult<bool>;

    fn get_category(&self, id: Id) -> StoreResult<Option<Category>>;
    fn find_category(
        &self,
        user: UserId,
        name: &str,
        direction: Direction,
    ) -> StoreResult<Option<Category>>;
    fn list_categories(&self, user: UserId) -> StoreResult<Vec<Category>>;
    fn insert_category(&self, row: &CategoryRow) -> StoreResult<Category>;
    fn delete_category(&self, id: Id) -> StoreResult<bool>;

    fn get_transaction(&self, id: Id) -> StoreResult<Option<Transaction>>;
    /// Transactions of `user`, optionally narrowed to one account, oldest first.
    fn list_transactions(&self, user: UserId, account: Option<Id>)
    -> StoreResult<Vec<Transaction>>;
    fn insert_transaction(&self, row: &TransactionRow) -> StoreResult<Transaction>;
    fn delete_transaction(&self, id: Id) -> StoreResult<bool>;

    fn get_rule(&self, id: Id) -> StoreResult<Option<RecurringRule>>;
    fn list_rules(&self, user: UserId) -> StoreResult<Vec<RecurringRule>>;
    /// `ACTIVE` rules of `user` whose `next_run_date <= as_of`.
    fn list_due_rules(&self, user: UserId, as_of: NaiveDate) -> StoreResult<Vec<RecurringRule>>;
    fn insert_rule(&self, row: &RuleRow) -> StoreResult<RecurringRule>;
    fn update_rule(&self, id: Id, patch: &RulePatch) -> StoreResult<()>;
    fn delete_rule(&self, id: Id) -> StoreResult<bool>;

    fn get_goal(&self, id: Id) -> StoreResult<Option<Goal>>;
    fn list_goals(&self, user: UserId) -> StoreResult<Vec<Goal>>;
    fn insert_goal(&self, row: &GoalRow) -> StoreResult<Goal>;
    fn update_goal(&self, id: Id, patch: &GoalPatch) -> StoreResult<()>;
    fn delete_goal(&self, id: Id) -> StoreResult<bool>;

    /// Last date on which a full catch-up finished for `user`.
    fn catch_up_watermark(&self, user: UserId) -> StoreResult<Option<NaiveDate>>;
    fn set_catch_up_watermark(&self, user: UserId, date: Option<NaiveDate>) -> StoreResult<()>;
}

const TX_SELECT: &str = "SELECT t.id, t.user_id, t.account_id, t.category_id, c.direction, t.description, t.amount, t.date, t.payment_date, t.status, t.recurring_id, t.goal_id, t.created_at, t.updated_at FROM transactions t LEFT JOIN categories c ON c.id = t.category_id";

const RULE_SELECT: &str = "SELECT id, user_id, account_id, category_id, description, amount, frequency, day_of_month, start_date, end_date, status, next_run_date, created_at, updated_at FROM recurring_rules";

const ACCOUNT_SELECT: &str =
    "SELECT id, user_id, name, kind, initial_balance, is_active, created_at FROM accounts";

const CATEGORY_SELECT: &str =
    "SELECT id, user_id, name, direction, budget_class, color FROM categories";

const GOAL_SELECT: &str =
    "SELECT id, user_id, name, target_amount, current_amount, deadline, created_at FROM goals";

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        kind: r.get(3)?,
        initial_balance: r.get(4)?,
        is_active: r.get(5)?,
        created_at: r.get(6)?,
    })
}

fn category_from_row(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        direction: r.get(3)?,
        budget_class: r.get(4)?,
        color: r.get(5)?,
    })
}

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        category_id: r.get(3)?,
        direction: r.get(4)?,
        description: r.get(5)?,
        amount: r.get(6)?,
        date: r.get(7)?,
        payment_date: r.get(8)?,
        status: r.get(9)?,
        recurring_id: r.get(10)?,
        goal_id: r.get(11)?,
        created_at: r.get(12)?,
        updated_at: r.get(13)?,
    })
}

fn rule_from_row(r: &Row<'_>) -> rusqlite::Result<RecurringRule> {
    Ok(RecurringRule {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        category_id: r.get(3)?,
        description: r.get(4)?,
        amount: r.get(5)?,
        frequency: r.get(6)?,
        day_of_month: r.get(7)?,
        start_date: r.get(8)?,
        end_date: r.get(9)?,
        status: r.get(10)?,
        next_run_date: r.get(11)?,
        created_at: r.get(12)?,
        updated_at: r.get(13)?,
    })
}

fn goal_from_row(r: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        target_amount: r.get(3)?,
        current_amount: r.get(4)?,
        deadline: r.get(5)?,
        created_at: r.get(6)?,
    })
}

fn watermark_key(user: UserId) -> String {
    format!("catch_up_watermark:{}", user)
}

/// Collects `column = ?` assignments for a partial UPDATE.
#[derive(Default)]
struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Assignments {
    fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(v) = value {
            self.columns.push(column);
            self.values.push(Box::new(v));
        }
    }

    fn execute(
        self,
        conn: &Connection,
        table: &str,
        id: Id,
        touch_updated_at: bool,
    ) -> rusqlite::Result<usize> {
        let mut sets: Vec<String> = self.columns.iter().map(|c| format!("{}=?", c)).collect();
        if touch_updated_at {
            sets.push("updated_at=datetime('now')".to_string());
        }
        if sets.is_empty() {
            return conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE id=?1", table),
                params![id],
                |r| r.get::<_, i64>(0).map(|n| n as usize),
            );
        }
        let sql = format!("UPDATE {} SET {} WHERE id=?", table, sets.join(", "));
        let mut values = self.values;
        values.push(Box::new(id));
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, rusqlite::params_from_iter(refs))
    }
}

/// [`Store`] over a SQLite connection initialised by [`crate::db::init_schema`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_in_memory()?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn inserted<T>(&self, what: &'static str, found: StoreResult<Option<T>>) -> StoreResult<T> {
        found?.ok_or_else(|| FinanceError::Persistence(format!("inserted {} could not be read back", what)))
    }
}

impl Store for SqliteStore {
    fn atomically<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>,
    {
        // Outermost unit holds the write lock from its first statement.
        let outermost = self.conn.is_autocommit();
        let (begin, commit, rollback) = if outermost {
            ("BEGIN IMMEDIATE", "COMMIT", "ROLLBACK")
        } else {
            (
                "SAVEPOINT cashloop_unit",
                "RELEASE cashloop_unit",
                "ROLLBACK TO cashloop_unit; RELEASE cashloop_unit",
            )
        };
        self.conn.execute_batch(begin)?;
        let result = f(self).and_then(|value| {
            self.conn.execute_batch(commit)?;
            Ok(value)
        });
        if result.is_err() {
            if let Err(err) = self.conn.execute_batch(rollback) {
                tracing::error!("rollback failed: {}", err);
            }
        }
        result
    }

    fn get_account(&self, id: Id) -> StoreResult<Option<Account>> {
        let sql = format!("{} WHERE id=?1", ACCOUNT_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], account_from_row)
            .optional()?)
    }

    fn list_accounts(&self, user: UserId) -> StoreResult<Vec<Account>> {
        let sql = format!("{} WHERE user_id=?1 ORDER BY name", ACCOUNT_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user], account_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_account(&self, row: &AccountRow) -> StoreResult<Account> {
        self.conn.execute(
            "INSERT INTO accounts(user_id, name, kind, initial_balance, is_active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.user_id, row.name, row.kind, row.initial_balance, row.is_active],
        )?;
        let id = self.conn.last_insert_rowid();
        self.inserted("account", self.get_account(id))
    }

    fn delete_account(&self, id: Id) -> StoreResult<bool> {
        Ok(self.conn.execute("DELETE FROM accounts WHERE id=?1", params![id])? > 0)
    }

    fn get_category(&self, id: Id) -> StoreResult<Option<Category>> {
        let sql = format!("{} WHERE id=?1", CATEGORY_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], category_from_row)
            .optional()?)
    }

    fn find_category(
        &self,
        user: UserId,
        name: &str,
        direction: Direction,
    ) -> StoreResult<Option<Category>> {
        let sql = format!(
            "{} WHERE user_id=?1 AND name=?2 COLLATE NOCASE AND direction=?3 ORDER BY id LIMIT 1",
            CATEGORY_SELECT
        );
        Ok(self
            .conn
            .query_row(&sql, params![user, name, direction], category_from_row)
            .optional()?)
    }

    fn list_categories(&self, user: UserId) -> StoreResult<Vec<Category>> {
        let sql = format!("{} WHERE user_id=?1 ORDER BY name", CATEGORY_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user], category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_category(&self, row: &CategoryRow) -> StoreResult<Category> {
        self.conn.execute(
            "INSERT INTO categories(user_id, name, direction, budget_class, color) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.user_id, row.name, row.direction, row.budget_class, row.color],
        )?;
        let id = self.conn.last_insert_rowid();
        self.inserted("category", self.get_category(id))
    }

    fn delete_category(&self, id: Id) -> StoreResult<bool> {
        Ok(self.conn.execute("DELETE FROM categories WHERE id=?1", params![id])? > 0)
    }

    fn get_transaction(&self, id: Id) -> StoreResult<Option<Transaction>> {
        let sql = format!("{} WHERE t.id=?1", TX_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], transaction_from_row)
            .optional()?)
    }

    fn list_transactions(
        &self,
        user: UserId,
        account: Option<Id>,
    ) -> StoreResult<Vec<Transaction>> {
        let sql = format!(
            "{} WHERE t.user_id=?1 AND (?2 IS NULL OR t.account_id=?2) ORDER BY t.date, t.id",
            TX_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user, account], transaction_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_transaction(&self, row: &TransactionRow) -> StoreResult<Transaction> {
        self.conn.execute(
            "INSERT INTO transactions(user_id, account_id, category_id, description, amount, date, payment_date, status, recurring_id, goal_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.user_id,
                row.account_id,
                row.category_id,
                row.description,
                row.amount,
                row.date,
                row.payment_date,
                row.status,
                row.recurring_id,
                row.goal_id
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.inserted("transaction", self.get_transaction(id))
    }

    fn delete_transaction(&self, id: Id) -> StoreResult<bool> {
        Ok(self
            .conn
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?
            > 0)
    }

    fn get_rule(&self, id: Id) -> StoreResult<Option<RecurringRule>> {
        let sql = format!("{} WHERE id=?1", RULE_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], rule_from_row)
            .optional()?)
    }

    fn list_rules(&self, user: UserId) -> StoreResult<Vec<RecurringRule>> {
        let sql = format!("{} WHERE user_id=?1 ORDER BY next_run_date, id", RULE_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user], rule_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn list_due_rules(&self, user: UserId, as_of: NaiveDate) -> StoreResult<Vec<RecurringRule>> {
        let sql = format!(
            "{} WHERE user_id=?1 AND status=?2 AND next_run_date<=?3 ORDER BY next_run_date, id",
            RULE_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user, RuleStatus::Active, as_of], rule_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_rule(&self, row: &RuleRow) -> StoreResult<RecurringRule> {
        self.conn.execute(
            "INSERT INTO recurring_rules(user_id, account_id, category_id, description, amount, frequency, day_of_month, start_date, end_date, status, next_run_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                row.user_id,
                row.account_id,
                row.category_id,
                row.description,
                row.amount,
                row.frequency,
                row.day_of_month,
                row.start_date,
                row.end_date,
                row.status,
                row.next_run_date
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.inserted("recurring rule", self.get_rule(id))
    }

    fn update_rule(&self, id: Id, patch: &RulePatch) -> StoreResult<()> {
        let mut a = Assignments::default();
        a.set("account_id", patch.account_id);
        a.set("category_id", patch.category_id);
        a.set("description", patch.description.clone());
        a.set("amount", patch.amount);
        a.set("frequency", patch.frequency);
        a.set("day_of_month", patch.day_of_month);
        a.set("start_date", patch.start_date);
        a.set("end_date", patch.end_date);
        a.set("status", patch.status);
        a.set("next_run_date", patch.next_run_date);
        match a.execute(&self.conn, "recurring_rules", id, true)? {
            0 => Err(FinanceError::NotFound("recurring rule")),
            _ => Ok(()),
        }
    }

    fn delete_rule(&self, id: Id) -> StoreResult<bool> {
        Ok(self
            .conn
            .execute("DELETE FROM recurring_rules WHERE id=?1", params![id])?
            > 0)
    }

    fn get_goal(&self, id: Id) -> StoreResult<Option<Goal>> {
        let sql = format!("{} WHERE id=?1", GOAL_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], goal_from_row)
            .optional()?)
    }

    fn list_goals(&self, user: UserId) -> StoreResult<Vec<Goal>> {
        let sql = format!("{} WHERE user_id=?1 ORDER BY created_at, id", GOAL_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user], goal_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_goal(&self, row: &GoalRow) -> StoreResult<Goal> {
        self.conn.execute(
            "INSERT INTO goals(user_id, name, target_amount, current_amount, deadline) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.user_id,
                row.name,
                row.target_amount,
                row.current_amount,
                row.deadline
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.inserted("goal", self.get_goal(id))
    }

    fn update_goal(&self, id: Id, patch: &GoalPatch) -> StoreResult<()> {
        let mut a = Assignments::default();
        a.set("name", patch.name.clone());
        a.set("target_amount", patch.target_amount);
        a.set("current_amount", patch.current_amount);
        a.set("deadline", patch.deadline);
        match a.execute(&self.conn, "goals", id, false)? {
            0 => Err(FinanceError::NotFound("goal")),
            _ => Ok(()),
        }
    }

    fn delete_goal(&self, id: Id) -> StoreResult<bool> {
        Ok(self.conn.execute("DELETE FROM goals WHERE id=?1", params![id])? > 0)
    }

    fn catch_up_watermark(&self, user: UserId) -> StoreResult<Option<NaiveDate>> {
        let v: Option<NaiveDate> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key=?1",
                params![watermark_key(user)],
                |r| r.get(0),
            )
            .optional()?;
        Ok(v)
    }

    fn set_catch_up_watermark(&self, user: UserId, date: Option<NaiveDate>) -> StoreResult<()> {
        let key = watermark_key(user);
        match date {
            Some(d) => {
                self.conn.execute(
                    "INSERT INTO settings(key, value) VALUES(?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                    params![key, d],
                )?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM settings WHERE key=?1", params![key])?;
            }
        }
        Ok(())
    }
}
