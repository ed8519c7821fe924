//! Ledger Store Errors
//!
//! Error types for store operations.

use crate::domain::AccountId;

use super::FaultPoint;

/// SQLSTATE for `CHECK` constraint violations
const CHECK_VIOLATION: &str = "23514";

/// SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A balance write would have left the account negative
    #[error("Non-negative balance constraint violated for account {0}")]
    ConstraintViolation(AccountId),

    /// Referenced parent row does not exist
    #[error("Referenced {0} does not exist")]
    ForeignKeyViolation(&'static str),

    /// Write targeted an account row that does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Row could not be mapped onto a domain type
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Failure injected by a test
    #[error("Injected fault at {0:?}")]
    Injected(FaultPoint),

    /// In-memory tables were poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Classify a database error raised by a balance write
    pub(crate) fn from_balance_write(err: sqlx::Error, account_id: AccountId) -> Self {
        match sqlstate(&err).as_deref() {
            Some(CHECK_VIOLATION) => StoreError::ConstraintViolation(account_id),
            _ => StoreError::Database(err),
        }
    }

    /// Classify a database error raised by an insert with a foreign key
    pub(crate) fn from_insert(err: sqlx::Error, parent: &'static str) -> Self {
        match sqlstate(&err).as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => StoreError::ForeignKeyViolation(parent),
            _ => StoreError::Database(err),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}
