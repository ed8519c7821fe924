//! Account Repository
//!
//! Owns the atomic apply of a transaction: the balance update and the
//! ledger append happen in one unit of work, or neither happens.

use std::sync::Arc;

use crate::domain::{
    Account, AccountId, Balance, CustomerId, DomainError, NewAccount, PendingTransaction,
    Transaction, TransactionId,
};
use crate::store::{LedgerStore, StoreError, UnitOfWork};

/// Why a unit of work was abandoned before commit
enum Abort {
    /// The account does not exist
    NotFound,
    /// The caller's check refused the locked balance
    Rejected(DomainError),
    /// A store step failed
    Store(&'static str, StoreError),
}

impl Abort {
    fn into_error(self, account_id: AccountId) -> DomainError {
        match self {
            Abort::NotFound => DomainError::account_not_found(),
            Abort::Rejected(err) => err,
            Abort::Store(operation, err) => storage_failure(operation, account_id, err),
        }
    }
}

/// Log a storage failure with its context and hide it behind the generic error
fn storage_failure(operation: &'static str, account_id: AccountId, err: StoreError) -> DomainError {
    tracing::error!(operation, %account_id, error = %err, "Ledger store failure");
    DomainError::unexpected()
}

/// Repository for accounts and their ledger
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn LedgerStore>,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Fetch an account by id
    pub async fn find_by_id(&self, account_id: AccountId) -> Result<Account, DomainError> {
        self.store
            .find_account(account_id)
            .await
            .map_err(|e| storage_failure("find_account", account_id, e))?
            .ok_or_else(DomainError::account_not_found)
    }

    /// All accounts owned by a customer (empty when there are none)
    pub async fn find_all(&self, customer_id: CustomerId) -> Result<Vec<Account>, DomainError> {
        self.store.find_accounts(customer_id).await.map_err(|e| {
            tracing::error!(%customer_id, error = %e, "Error while retrieving accounts of customer");
            DomainError::unexpected()
        })
    }

    /// Persist a new account, returning it with its store-assigned id
    pub async fn save(&self, account: NewAccount) -> Result<Account, DomainError> {
        match self.store.insert_account(&account).await {
            Ok(account_id) => {
                tracing::info!(%account_id, customer_id = %account.customer_id, "Account created");
                Ok(account.into_account(account_id))
            }
            Err(StoreError::ForeignKeyViolation(_)) => {
                Err(DomainError::not_found("Customer not found"))
            }
            Err(e) => {
                tracing::error!(customer_id = %account.customer_id, error = %e, "Error while creating new account");
                Err(DomainError::unexpected())
            }
        }
    }

    /// Ledger entries of an account, newest first
    pub async fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, DomainError> {
        self.find_by_id(account_id).await?;
        self.store
            .find_transactions(account_id)
            .await
            .map_err(|e| storage_failure("find_transactions", account_id, e))
    }

    /// Apply a transaction atomically without any balance check of its own
    ///
    /// # Errors
    /// - `NotFound` if the account does not exist
    /// - `Unexpected` if any store step fails, including the store refusing
    ///   a negative balance
    pub async fn transact(&self, pending: PendingTransaction) -> Result<Transaction, DomainError> {
        self.transact_with(pending, |_, _| Ok(())).await
    }

    /// Apply a transaction atomically, running `check` against the balance
    /// while the account is locked. A rejection aborts the unit of work
    /// before anything is written.
    pub async fn transact_with<F>(
        &self,
        pending: PendingTransaction,
        check: F,
    ) -> Result<Transaction, DomainError>
    where
        F: FnOnce(&Balance, &PendingTransaction) -> Result<(), DomainError> + Send,
    {
        let account_id = pending.account_id;

        let mut uow = self
            .store
            .begin()
            .await
            .map_err(|e| storage_failure("begin", account_id, e))?;

        let transaction_id = match apply_in_unit(&mut *uow, &pending, check).await {
            Ok(transaction_id) => transaction_id,
            Err(abort) => {
                roll_back(uow, account_id).await;
                return Err(abort.into_error(account_id));
            }
        };

        if let Err(e) = uow.commit().await {
            tracing::error!(
                operation = "commit",
                %account_id,
                error = %e,
                "Commit failed; transaction outcome unknown, do not retry blindly"
            );
            return Err(DomainError::unexpected());
        }

        // Report what was durably committed, not what was computed
        let account = self.find_by_id(account_id).await?;

        tracing::info!(
            %account_id,
            %transaction_id,
            transaction_type = %pending.transaction_type,
            amount = %pending.amount,
            balance = %account.amount,
            "Transaction applied"
        );

        Ok(pending.complete(transaction_id, account.amount))
    }
}

/// Lock, check, write the balance and append the entry inside `uow`
async fn apply_in_unit<F>(
    uow: &mut dyn UnitOfWork,
    pending: &PendingTransaction,
    check: F,
) -> Result<TransactionId, Abort>
where
    F: FnOnce(&Balance, &PendingTransaction) -> Result<(), DomainError> + Send,
{
    let account_id = pending.account_id;

    let current = uow
        .lock_balance(account_id)
        .await
        .map_err(|e| Abort::Store("lock_balance", e))?
        .ok_or(Abort::NotFound)?;
    let current = Balance::new(current)
        .map_err(|e| Abort::Store("lock_balance", StoreError::InvalidData(e.to_string())))?;

    check(&current, pending).map_err(Abort::Rejected)?;

    let delta = pending.delta();
    tracing::debug!(
        %account_id,
        current = %current,
        %delta,
        expected = %(current.value() + delta),
        "Applying balance change"
    );

    let stored = uow
        .apply_delta(account_id, delta)
        .await
        .map_err(|e| Abort::Store("apply_delta", e))?;

    uow.append_entry(pending, stored)
        .await
        .map_err(|e| Abort::Store("append_entry", e))
}

async fn roll_back(uow: Box<dyn UnitOfWork>, account_id: AccountId) {
    if let Err(e) = uow.rollback().await {
        tracing::error!(
            operation = "rollback",
            %account_id,
            error = %e,
            "Rollback failed; ledger state may be inconsistent"
        );
    }
}
