//! Command definitions
//!
//! Commands are validated requests; responses are what the handlers hand
//! back to the HTTP layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, AccountId, AccountType, Amount, Balance, Customer, CustomerId, Status, Transaction,
    TransactionId, TransactionType,
};

// =========================================================================
// NewAccountCommand
// =========================================================================

/// Command to open an account with an opening deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccountCommand {
    pub customer_id: CustomerId,
    pub account_type: AccountType,
    /// Opening deposit, already checked against the minimum
    pub amount: Amount,
}

impl NewAccountCommand {
    pub fn new(customer_id: CustomerId, account_type: AccountType, amount: Amount) -> Self {
        Self {
            customer_id,
            account_type,
            amount,
        }
    }
}

/// Result of opening an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccountResponse {
    pub account_id: AccountId,
    pub opening_date: DateTime<Utc>,
}

impl From<&Account> for NewAccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id,
            opening_date: account.opening_date,
        }
    }
}

// =========================================================================
// TransactionCommand
// =========================================================================

/// Command to deposit into or withdraw from one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCommand {
    pub customer_id: CustomerId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub transaction_type: TransactionType,
}

impl TransactionCommand {
    pub fn new(
        customer_id: CustomerId,
        account_id: AccountId,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            customer_id,
            account_id,
            amount,
            transaction_type,
        }
    }

    pub fn deposit(customer_id: CustomerId, account_id: AccountId, amount: Amount) -> Self {
        Self::new(customer_id, account_id, amount, TransactionType::Deposit)
    }

    pub fn withdrawal(customer_id: CustomerId, account_id: AccountId, amount: Amount) -> Self {
        Self::new(customer_id, account_id, amount, TransactionType::Withdrawal)
    }
}

/// Result of an applied transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    /// Balance read back after commit
    pub new_balance: Balance,
    pub transaction_date: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            new_balance: transaction.balance,
            transaction_date: transaction.transaction_date,
        }
    }
}

// =========================================================================
// Queries
// =========================================================================

/// One row of a customer's account listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: AccountId,
    pub account_type: AccountType,
    pub amount: Balance,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.account_id,
            account_type: account.account_type,
            amount: account.amount,
        }
    }
}

/// One ledger entry of an account's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHistoryEntry {
    pub transaction_id: TransactionId,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    /// Balance recorded when the entry was applied
    pub balance: Balance,
    pub transaction_date: DateTime<Utc>,
}

impl From<Transaction> for TransactionHistoryEntry {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            balance: transaction.balance,
            transaction_date: transaction.transaction_date,
        }
    }
}

/// Customer as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer_id: CustomerId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub city: String,
    pub zipcode: String,
    pub status: Status,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.customer_id,
            full_name: customer.name,
            date_of_birth: customer.date_of_birth,
            email: customer.email,
            city: customer.city,
            zipcode: customer.zipcode,
            status: customer.status,
        }
    }
}
