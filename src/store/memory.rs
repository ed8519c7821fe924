//! In-memory Ledger Store
//!
//! Process-local backend with the same unit-of-work semantics as the
//! PostgreSQL store: every account has its own `tokio::sync::Mutex` that a
//! unit of work holds from the first balance read until it ends, and
//! writes are staged and only become visible on commit.
//!
//! Tests use it to inject failures at each step of a unit of work
//! ([`FaultPoint`]) and to line up concurrent units of work with a begin
//! gate.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Barrier, OwnedMutexGuard};

use crate::domain::{
    Account, AccountId, Balance, Customer, CustomerId, NewAccount, PendingTransaction, Status,
    StatusFilter, Transaction, TransactionId,
};

use super::{CustomerStore, LedgerStore, StoreError, UnitOfWork};

/// Steps of a unit of work where a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Begin,
    LockBalance,
    ApplyDelta,
    AppendEntry,
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    last_account_id: i64,
    last_transaction_id: i64,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<AccountId, Arc<tokio::sync::Mutex<()>>>>,
    faults: Mutex<HashSet<FaultPoint>>,
    begin_gate: Mutex<Option<Arc<Barrier>>>,
}

impl Shared {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Fails once if a fault was armed for `point`
    fn trip(&self, point: FaultPoint) -> Result<(), StoreError> {
        let armed = self
            .faults
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&point);
        if armed {
            tracing::debug!(?point, "Injected store fault");
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }

    fn row_lock(&self, account_id: AccountId) -> Result<Arc<tokio::sync::Mutex<()>>, StoreError> {
        let mut locks = self.row_locks.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(Arc::clone(locks.entry(account_id).or_default()))
    }
}

/// Ledger store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    shared: Arc<Shared>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with two sample customers, for running without a database
    pub fn with_sample_customers() -> Result<Self, StoreError> {
        let store = Self::new();
        let samples = [
            (1, "Dorothy", (2011, 11, 11), "dorothy_gale@somemail.com", "Emerald City", "12345", Status::Active),
            (2, "Luke", (2012, 12, 12), "luke.skywalker@somemail.com", "Tatooine", "67890", Status::Inactive),
        ];

        for (id, name, (year, month, day), email, city, zipcode, status) in samples {
            let date_of_birth = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
                StoreError::InvalidData(format!("invalid date of birth for customer {id}"))
            })?;
            store.insert_customer(Customer {
                customer_id: CustomerId::new(id),
                name: name.to_string(),
                date_of_birth,
                email: email.to_string(),
                city: city.to_string(),
                zipcode: zipcode.to_string(),
                status,
            })?;
        }

        Ok(store)
    }

    /// Add or replace a customer
    pub fn insert_customer(&self, customer: Customer) -> Result<(), StoreError> {
        self.shared
            .tables()?
            .customers
            .insert(customer.customer_id, customer);
        Ok(())
    }

    /// Make the next operation reaching `point` fail
    pub fn fail_next(&self, point: FaultPoint) -> Result<(), StoreError> {
        self.shared
            .faults
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(point);
        Ok(())
    }

    /// Make every `begin` wait on `gate` before returning
    pub fn set_begin_gate(&self, gate: Option<Arc<Barrier>>) -> Result<(), StoreError> {
        *self
            .shared
            .begin_gate
            .lock()
            .map_err(|_| StoreError::Poisoned)? = gate;
        Ok(())
    }

    /// Number of committed ledger entries across all accounts
    pub fn transaction_count(&self) -> Result<usize, StoreError> {
        Ok(self.shared.tables()?.transactions.len())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.shared.trip(FaultPoint::Begin)?;

        let gate = self
            .shared
            .begin_gate
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }

        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            held: HashMap::new(),
            staged_balances: HashMap::new(),
            staged_entries: Vec::new(),
        }))
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.shared.tables()?.accounts.get(&account_id).cloned())
    }

    async fn find_accounts(&self, customer_id: CustomerId) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .shared
            .tables()?
            .accounts
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<AccountId, StoreError> {
        let mut tables = self.shared.tables()?;
        if !tables.customers.contains_key(&account.customer_id) {
            return Err(StoreError::ForeignKeyViolation("customer"));
        }

        tables.last_account_id += 1;
        let account_id = AccountId::new(tables.last_account_id);
        tables
            .accounts
            .insert(account_id, account.clone().into_account(account_id));

        Ok(account_id)
    }

    async fn find_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .shared
            .tables()?
            .transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerStore for InMemoryLedgerStore {
    async fn find_customers(&self, filter: StatusFilter) -> Result<Vec<Customer>, StoreError> {
        Ok(self
            .shared
            .tables()?
            .customers
            .values()
            .filter(|c| filter.matches(c.status))
            .cloned()
            .collect())
    }

    async fn find_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        Ok(self.shared.tables()?.customers.get(&customer_id).cloned())
    }
}

/// Staged writes plus the row locks they depend on.
/// Dropping it releases the locks and discards the writes.
struct MemoryUnitOfWork {
    shared: Arc<Shared>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    staged_balances: HashMap<AccountId, Balance>,
    staged_entries: Vec<Transaction>,
}

impl MemoryUnitOfWork {
    async fn ensure_locked(&mut self, account_id: AccountId) -> Result<(), StoreError> {
        if !self.held.contains_key(&account_id) {
            let row_lock = self.shared.row_lock(account_id)?;
            let guard = row_lock.lock_owned().await;
            self.held.insert(account_id, guard);
        }
        Ok(())
    }

    /// Balance as this unit of work sees it: its own staged write, else the committed value
    fn current(&self, account_id: AccountId) -> Result<Option<Decimal>, StoreError> {
        if let Some(staged) = self.staged_balances.get(&account_id) {
            return Ok(Some(staged.value()));
        }
        Ok(self
            .shared
            .tables()?
            .accounts
            .get(&account_id)
            .map(|a| a.amount.value()))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_balance(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Decimal>, StoreError> {
        self.shared.trip(FaultPoint::LockBalance)?;
        self.ensure_locked(account_id).await?;
        self.current(account_id)
    }

    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        self.shared.trip(FaultPoint::ApplyDelta)?;
        self.ensure_locked(account_id).await?;

        let current = self
            .current(account_id)?
            .ok_or(StoreError::AccountNotFound(account_id))?;
        let updated = Balance::new(current + delta)
            .map_err(|_| StoreError::ConstraintViolation(account_id))?;

        self.staged_balances.insert(account_id, updated);
        Ok(updated.value())
    }

    async fn append_entry(
        &mut self,
        entry: &PendingTransaction,
        balance: Decimal,
    ) -> Result<TransactionId, StoreError> {
        self.shared.trip(FaultPoint::AppendEntry)?;

        let balance = Balance::new(balance).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        // Ids are consumed even if this unit of work never commits, like a sequence
        let transaction_id = {
            let mut tables = self.shared.tables()?;
            if !tables.accounts.contains_key(&entry.account_id) {
                return Err(StoreError::ForeignKeyViolation("account"));
            }
            tables.last_transaction_id += 1;
            TransactionId::new(tables.last_transaction_id)
        };

        self.staged_entries
            .push(entry.clone().complete(transaction_id, balance));
        Ok(transaction_id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork {
            shared,
            held,
            staged_balances,
            staged_entries,
        } = *self;

        shared.trip(FaultPoint::Commit)?;

        {
            let mut tables = shared.tables()?;
            for (account_id, balance) in staged_balances {
                if let Some(account) = tables.accounts.get_mut(&account_id) {
                    account.amount = balance;
                }
            }
            tables.transactions.extend(staged_entries);
        }

        drop(held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let shared = Arc::clone(&self.shared);
        drop(self);
        shared.trip(FaultPoint::Rollback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, Amount, FixedClock, TransactionType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn customer(id: i64) -> Customer {
        Customer {
            customer_id: CustomerId::new(id),
            name: "Ada".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            email: "ada@example.com".to_string(),
            city: "London".to_string(),
            zipcode: "N1".to_string(),
            status: Status::Active,
        }
    }

    async fn store_with_account(balance: Decimal) -> (InMemoryLedgerStore, AccountId) {
        let store = InMemoryLedgerStore::new();
        store.insert_customer(customer(2)).unwrap();
        let new = NewAccount::new(
            CustomerId::new(2),
            AccountType::Saving,
            Amount::new(balance).unwrap(),
            &FixedClock(Utc::now()),
        );
        let id = store.insert_account(&new).await.unwrap();
        (store, id)
    }

    fn pending(account_id: AccountId, amount: Decimal) -> PendingTransaction {
        PendingTransaction::new(
            account_id,
            Amount::new(amount).unwrap(),
            TransactionType::Deposit,
            &FixedClock(Utc::now()),
        )
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let (store, id) = store_with_account(dec!(100)).await;

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.lock_balance(id).await.unwrap(), Some(dec!(100)));
        assert_eq!(uow.apply_delta(id, dec!(50)).await.unwrap(), dec!(150));
        uow.append_entry(&pending(id, dec!(50)), dec!(150)).await.unwrap();

        let before_commit = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(before_commit.amount.value(), dec!(100));
        assert_eq!(store.transaction_count().unwrap(), 0);

        uow.commit().await.unwrap();

        let after_commit = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(after_commit.amount.value(), dec!(150));
        assert_eq!(store.transaction_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let (store, id) = store_with_account(dec!(100)).await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.apply_delta(id, dec!(-40)).await.unwrap();
        }

        let account = store.find_account(id).await.unwrap().unwrap();
        assert_eq!(account.amount.value(), dec!(100));

        // The row lock was released with the dropped unit of work
        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.lock_balance(id).await.unwrap(), Some(dec!(100)));
    }

    #[tokio::test]
    async fn test_negative_balance_rejected_by_store() {
        let (store, id) = store_with_account(dec!(10)).await;

        let mut uow = store.begin().await.unwrap();
        let err = uow.apply_delta(id, dec!(-6000)).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_lock_balance_missing_account() {
        let store = InMemoryLedgerStore::new();
        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.lock_balance(AccountId::new(999999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fault_fires_once() {
        let (store, id) = store_with_account(dec!(100)).await;
        store.fail_next(FaultPoint::LockBalance).unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.lock_balance(id).await,
            Err(StoreError::Injected(FaultPoint::LockBalance))
        ));
        assert!(uow.lock_balance(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_sample_customers() {
        let store = InMemoryLedgerStore::with_sample_customers().unwrap();

        let active = store
            .find_customers(StatusFilter::Only(Status::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Dorothy");

        let luke = store.find_customer(CustomerId::new(2)).await.unwrap().unwrap();
        assert_eq!(luke.status, Status::Inactive);
    }

    #[tokio::test]
    async fn test_insert_account_requires_customer() {
        let store = InMemoryLedgerStore::new();
        let new = NewAccount::new(
            CustomerId::new(42),
            AccountType::Checking,
            Amount::new(dec!(5000)).unwrap(),
            &FixedClock(Utc::now()),
        );
        assert!(matches!(
            store.insert_account(&new).await,
            Err(StoreError::ForeignKeyViolation("customer"))
        ));
    }
}
