// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::{FieldErrors, FinanceError};

pub type Id = i64;
pub type UserId = i64;

/// An amount of money in minor units (cents).
///
/// Amounts are kept as integers end to end; `Decimal` only appears when a
/// value crosses the human boundary (parsing "12.50", printing, JSON).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Largest magnitude accepted for a single amount, 100 billion in major
    /// units.
    pub const MAX: Money = Money(10_000_000_000_000);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Converts a major-unit decimal ("50.00") into minor units. More than
    /// two fractional digits is rejected rather than rounded.
    pub fn from_major(value: Decimal) -> Result<Self, FinanceError> {
        let scaled = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| FieldErrors::single("amount", "amount is out of range"))?;
        if !scaled.fract().is_zero() {
            return Err(FieldErrors::single("amount", "amount has more than two decimal places").into());
        }
        scaled
            .to_i64()
            .map(Money)
            .filter(|m| m.is_within_limit())
            .ok_or_else(|| FieldErrors::single("amount", "amount is out of range").into())
    }

    pub fn is_within_limit(self) -> bool {
        (-Self::MAX.0..=Self::MAX.0).contains(&self.0)
    }

    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_major(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_major(major).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

/// A signed movement of money. The sign lives in the variant, never in
/// the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Income(Money),
    Expense(Money),
}

impl Flow {
    /// Uncategorized movements count as expenses.
    pub fn new(direction: Option<Direction>, amount: Money) -> Self {
        match direction {
            Some(Direction::Income) => Flow::Income(amount),
            Some(Direction::Expense) | None => Flow::Expense(amount),
        }
    }

    pub fn amount(self) -> Money {
        match self {
            Flow::Income(m) | Flow::Expense(m) => m,
        }
    }

    pub fn signed(self) -> Money {
        match self {
            Flow::Income(m) => m,
            Flow::Expense(m) => -m,
        }
    }

    pub fn is_expense(self) -> bool {
        matches!(self, Flow::Expense(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// Enums persisted as upper-case text columns.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_uppercase().replace('-', "_");
                match upper.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(AccountKind, "account kind", {
    Checking => "CHECKING",
    Cash => "CASH",
    Investment => "INVESTMENT",
});

text_enum!(Direction, "category direction", {
    Income => "INCOME",
    Expense => "EXPENSE",
});

text_enum!(BudgetClass, "budget class", {
    EssentialFixed => "ESSENTIAL_FIXED",
    EssentialVariable => "ESSENTIAL_VARIABLE",
    Discretionary => "DISCRETIONARY",
});

text_enum!(TxStatus, "transaction status", {
    Pending => "PENDING",
    Paid => "PAID",
});

text_enum!(Frequency, "frequency", {
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Monthly => "MONTHLY",
    Yearly => "YEARLY",
});

text_enum!(RuleStatus, "rule status", {
    Active => "ACTIVE",
    Paused => "PAUSED",
    Cancelled => "CANCELLED",
});

impl BudgetClass {
    pub fn label(self) -> &'static str {
        match self {
            BudgetClass::EssentialFixed => "Essential (fixed)",
            BudgetClass::EssentialVariable => "Essential (variable)",
            BudgetClass::Discretionary => "Discretionary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Money,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub direction: Direction,
    pub budget_class: Option<BudgetClass>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    pub user_id: UserId,
    pub account_id: Id,
    pub category_id: Option<Id>,
    /// Direction of the linked category, resolved when the row is read.
    pub direction: Option<Direction>,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub status: TxStatus,
    pub recurring_id: Option<Id>,
    pub goal_id: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    pub fn flow(&self) -> Flow {
        Flow::new(self.direction, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: Id,
    pub user_id: UserId,
    pub account_id: Id,
    pub category_id: Id,
    pub description: String,
    pub amount: Money,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: RuleStatus,
    pub next_run_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Id,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub deadline: Option<NaiveDate>,
    pub created_at: String,
}

// Insert rows and patches handed to the store.

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub user_id: UserId,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Money,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub user_id: UserId,
    pub name: String,
    pub direction: Direction,
    pub budget_class: Option<BudgetClass>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub user_id: UserId,
    pub account_id: Id,
    pub category_id: Option<Id>,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub status: TxStatus,
    pub recurring_id: Option<Id>,
    pub goal_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    pub user_id: UserId,
    pub account_id: Id,
    pub category_id: Id,
    pub description: String,
    pub amount: Money,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: RuleStatus,
    pub next_run_date: NaiveDate,
}

/// Partial update of a recurring rule. `None` leaves a column untouched;
/// for nullable columns the inner `Option` is the new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub account_id: Option<Id>,
    pub category_id: Option<Id>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub frequency: Option<Frequency>,
    pub day_of_month: Option<Option<u32>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub status: Option<RuleStatus>,
    pub next_run_date: Option<NaiveDate>,
}

impl RulePatch {
    pub fn status(status: RuleStatus) -> Self {
        RulePatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn next_run(date: NaiveDate) -> Self {
        RulePatch {
            next_run_date: Some(date),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalRow {
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub current_amount: Option<Money>,
    pub deadline: Option<Option<NaiveDate>>,
}
