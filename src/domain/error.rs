//! Domain Error Types
//!
//! The closed set of failure kinds the ledger surfaces to its callers.

use thiserror::Error;

/// Generic message for storage failures; raw storage text never reaches callers
pub const UNEXPECTED_DATABASE_ERROR: &str = "Unexpected database error";

/// Domain-specific errors
///
/// Every variant carries the human-readable message shown to the client.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Referenced account, customer or filter value does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request violates a business rule; checked before any mutation
    #[error("{0}")]
    Validation(String),

    /// Storage-layer failure (connection, write, commit)
    #[error("{0}")]
    Unexpected(String),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Storage failure with the generic client-facing message
    pub fn unexpected() -> Self {
        Self::Unexpected(UNEXPECTED_DATABASE_ERROR.to_string())
    }

    pub fn account_not_found() -> Self {
        Self::not_found("Account not found")
    }

    pub fn insufficient_balance() -> Self {
        Self::validation("Account balance insufficient to withdraw given amount")
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Validation(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) | Self::Validation(msg) | Self::Unexpected(msg) => msg,
        }
    }
}
