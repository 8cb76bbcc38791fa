// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use thiserror::Error;

use crate::models::Money;

/// Errors returned by every ledger operation.
#[derive(Debug, Error, PartialEq)]
pub enum FinanceError {
    /// Malformed or missing input, reported per field.
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    /// The referenced entity does not exist or belongs to another user.
    /// Both cases share one message so callers cannot probe for ids.
    #[error("{0} not found or no permission")]
    NotFound(&'static str),

    /// An expense would take the account's derived balance below zero.
    #[error("insufficient balance for this expense (available {balance}, requested {requested})")]
    InsufficientFunds { balance: Money, requested: Money },

    /// The record store failed; the store's message is passed through.
    #[error("{0}")]
    Persistence(String),
}

impl From<rusqlite::Error> for FinanceError {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("record store error: {}", value);
        FinanceError::Persistence(value.to_string())
    }
}

impl From<FieldErrors> for FinanceError {
    fn from(value: FieldErrors) -> Self {
        FinanceError::Validation(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field-level validation messages collected before rejecting an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FinanceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FinanceError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}
