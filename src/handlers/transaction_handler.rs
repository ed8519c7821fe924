//! Transaction Handler
//!
//! Deposits and withdrawals against a single account.

use std::sync::Arc;

use crate::domain::{Clock, DomainError, PendingTransaction};
use crate::repository::AccountRepository;
use crate::store::LedgerStore;

use super::{TransactionCommand, TransactionResponse};

/// Handler for deposits and withdrawals
pub struct TransactionHandler {
    accounts: AccountRepository,
    clock: Arc<dyn Clock>,
}

impl TransactionHandler {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: AccountRepository::new(store),
            clock,
        }
    }

    /// Apply a deposit or withdrawal.
    ///
    /// A withdrawal larger than the balance is refused before anything is
    /// written, and refused again against the locked balance in case a
    /// concurrent withdrawal got there first.
    pub async fn make_transaction(
        &self,
        command: TransactionCommand,
    ) -> Result<TransactionResponse, DomainError> {
        let account = self.accounts.find_by_id(command.account_id).await?;

        let pending = PendingTransaction::new(
            command.account_id,
            command.amount,
            command.transaction_type,
            self.clock.as_ref(),
        );

        if pending.is_withdrawal() && !account.can_withdraw(&pending.amount) {
            tracing::info!(
                account_id = %account.account_id,
                balance = %account.amount,
                amount = %pending.amount,
                "Withdrawal refused: insufficient balance"
            );
            return Err(DomainError::insufficient_balance());
        }

        let transaction = self
            .accounts
            .transact_with(pending, |balance, pending| {
                if pending.is_withdrawal() && !balance.is_sufficient_for(&pending.amount) {
                    return Err(DomainError::insufficient_balance());
                }
                Ok(())
            })
            .await?;

        Ok(TransactionResponse::from(transaction))
    }
}
