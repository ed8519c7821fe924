//! Account entity
//!
//! An account is created once with an opening deposit and afterwards only
//! its balance changes, through the ledger's atomic apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AccountId, Amount, Balance, Clock, CustomerId};

/// Kind of account a customer can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Saving,
    Checking,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Saving => "saving",
            AccountType::Checking => "checking",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown account type: {0:?}")]
pub struct UnknownAccountType(pub String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saving" => Ok(AccountType::Saving),
            "checking" => Ok(AccountType::Checking),
            other => Err(UnknownAccountType(other.to_string())),
        }
    }
}

/// Lifecycle flag shared by accounts and customers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn from_is_active(is_active: bool) -> Self {
        if is_active {
            Status::Active
        } else {
            Status::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        *self == Status::Active
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

/// A persisted account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    pub opening_date: DateTime<Utc>,
    pub account_type: AccountType,
    /// Current balance; the only field that changes after creation
    pub amount: Balance,
    pub status: Status,
}

impl Account {
    /// Whether the current balance covers a withdrawal of `amount`
    pub fn can_withdraw(&self, amount: &Amount) -> bool {
        self.amount.is_sufficient_for(amount)
    }
}

/// An account that has not been saved yet and so has no `AccountId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub customer_id: CustomerId,
    pub opening_date: DateTime<Utc>,
    pub account_type: AccountType,
    pub amount: Amount,
    pub status: Status,
}

impl NewAccount {
    /// Build a new active account with the opening deposit as its balance
    pub fn new(
        customer_id: CustomerId,
        account_type: AccountType,
        amount: Amount,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            customer_id,
            opening_date: clock.now(),
            account_type,
            amount,
            status: Status::Active,
        }
    }

    /// The persisted form once the store has assigned an id
    pub fn into_account(self, account_id: AccountId) -> Account {
        Account {
            account_id,
            customer_id: self.customer_id,
            opening_date: self.opening_date,
            account_type: self.account_type,
            amount: Balance::from(self.amount),
            status: self.status,
        }
    }
}
