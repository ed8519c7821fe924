//! Account Handler
//!
//! Opening accounts and reading them back.

use std::sync::Arc;

use crate::domain::{AccountId, Clock, CustomerId, DomainError, NewAccount};
use crate::repository::AccountRepository;
use crate::store::LedgerStore;

use super::{AccountResponse, NewAccountCommand, NewAccountResponse, TransactionHistoryEntry};

/// Handler for account creation and account queries
pub struct AccountHandler {
    accounts: AccountRepository,
    clock: Arc<dyn Clock>,
}

impl AccountHandler {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: AccountRepository::new(store),
            clock,
        }
    }

    /// Open an active account whose balance is the opening deposit
    pub async fn create_new_account(
        &self,
        command: NewAccountCommand,
    ) -> Result<NewAccountResponse, DomainError> {
        let account = NewAccount::new(
            command.customer_id,
            command.account_type,
            command.amount,
            self.clock.as_ref(),
        );

        let saved = self.accounts.save(account).await?;
        Ok(NewAccountResponse::from(&saved))
    }

    /// Accounts of a customer; empty when the customer has none
    pub async fn get_all_accounts(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<AccountResponse>, DomainError> {
        let accounts = self.accounts.find_all(customer_id).await?;
        Ok(accounts.into_iter().map(AccountResponse::from).collect())
    }

    /// Ledger of an account, newest entry first
    pub async fn get_transaction_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionHistoryEntry>, DomainError> {
        let entries = self.accounts.history(account_id).await?;
        Ok(entries.into_iter().map(TransactionHistoryEntry::from).collect())
    }
}
