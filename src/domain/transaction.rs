//! Ledger entries
//!
//! A `PendingTransaction` is what the orchestrator builds; the repository
//! turns it into a `Transaction` once the atomic apply has committed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AccountId, Amount, Balance, Clock, TransactionId};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type: {0:?}")]
pub struct UnknownTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "deposit" => Ok(TransactionType::Deposit),
            other => Err(UnknownTransactionType(other.to_string())),
        }
    }
}

/// A transaction that has not been applied yet: no id, no resulting balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub account_id: AccountId,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
}

impl PendingTransaction {
    /// Stamp a new transaction with the clock's current time
    pub fn new(
        account_id: AccountId,
        amount: Amount,
        transaction_type: TransactionType,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            account_id,
            amount,
            transaction_type,
            transaction_date: clock.now(),
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.transaction_type == TransactionType::Withdrawal
    }

    /// Signed change this transaction makes to the balance
    pub fn delta(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Withdrawal => -self.amount.value(),
            TransactionType::Deposit => self.amount.value(),
        }
    }

    /// The committed entry, with the store-assigned id and the balance read back
    pub fn complete(self, transaction_id: TransactionId, balance: Balance) -> Transaction {
        Transaction {
            transaction_id,
            account_id: self.account_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            transaction_date: self.transaction_date,
            balance,
        }
    }
}

/// An immutable, committed ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
    /// Account balance immediately after this transaction was applied
    pub balance: Balance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixedClock;
    use rust_decimal_macros::dec;

    fn pending(transaction_type: TransactionType) -> PendingTransaction {
        PendingTransaction::new(
            AccountId::new(1977),
            Amount::new(dec!(1000)).unwrap(),
            transaction_type,
            &FixedClock(Utc::now()),
        )
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(pending(TransactionType::Withdrawal).delta(), dec!(-1000));
        assert_eq!(pending(TransactionType::Deposit).delta(), dec!(1000));
    }

    #[test]
    fn test_is_withdrawal() {
        assert!(pending(TransactionType::Withdrawal).is_withdrawal());
        assert!(!pending(TransactionType::Deposit).is_withdrawal());
    }

    #[test]
    fn test_transaction_type_serialization() {
        let json = serde_json::to_string(&TransactionType::Withdrawal).unwrap();
        assert_eq!(json, r#""withdrawal""#);
        assert!("some transaction type".parse::<TransactionType>().is_err());
    }
}
