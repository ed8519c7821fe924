//! Ledger Store module
//!
//! Persistence layer for accounts, ledger entries and customers.
//!
//! The only way to change a balance is through a [`UnitOfWork`]: it holds
//! the account's serialization point (a row lock, or a per-account mutex in
//! memory) from `lock_balance` until it is committed, rolled back or
//! dropped. Dropping it without committing discards every write made
//! through it.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{
    Account, AccountId, Customer, CustomerId, NewAccount, PendingTransaction, StatusFilter,
    Transaction, TransactionId,
};

pub use error::StoreError;
pub use memory::{FaultPoint, InMemoryLedgerStore};
pub use postgres::PgLedgerStore;

/// Durable storage for accounts and their ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Start a unit of work
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Read the committed state of an account
    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// All accounts owned by a customer, oldest first
    async fn find_accounts(&self, customer_id: CustomerId) -> Result<Vec<Account>, StoreError>;

    /// Persist a new account and return its store-assigned id
    async fn insert_account(&self, account: &NewAccount) -> Result<AccountId, StoreError>;

    /// Ledger entries of an account, newest first
    async fn find_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError>;
}

/// A bounded sequence of reads and writes that either all take effect or none do
#[async_trait]
pub trait UnitOfWork: Send {
    /// Acquire the account's serialization point and read its balance.
    /// `None` when the account does not exist.
    async fn lock_balance(&mut self, account_id: AccountId)
        -> Result<Option<Decimal>, StoreError>;

    /// `amount = amount + delta`, returning the balance as stored
    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError>;

    /// Append a ledger entry recording the balance after it was applied
    async fn append_entry(
        &mut self,
        entry: &PendingTransaction,
        balance: Decimal,
    ) -> Result<TransactionId, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Read access to customers
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customers(&self, filter: StatusFilter) -> Result<Vec<Customer>, StoreError>;

    async fn find_customer(&self, customer_id: CustomerId)
        -> Result<Option<Customer>, StoreError>;
}
