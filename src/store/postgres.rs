//! PostgreSQL Ledger Store
//!
//! Balances live in `accounts.amount` (guarded by `CHECK (amount >= 0)`),
//! ledger entries in the append-only `transactions` table. A unit of work is
//! a database transaction holding the account row lock taken by
//! `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};

use crate::domain::{
    Account, AccountId, AccountType, Amount, Balance, Customer, CustomerId, NewAccount,
    PendingTransaction, Status, StatusFilter, Transaction, TransactionId, TransactionType,
};

use super::{CustomerStore, LedgerStore, StoreError, UnitOfWork};

type AccountRow = (i64, i64, DateTime<Utc>, String, Decimal, bool);
type TransactionRow = (i64, i64, Decimal, String, DateTime<Utc>, Decimal);
type CustomerRow = (i64, String, NaiveDate, String, String, String, bool);

/// Ledger store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT account_id, customer_id, opening_date, account_type, amount, is_active
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn find_accounts(&self, customer_id: CustomerId) -> Result<Vec<Account>, StoreError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT account_id, customer_id, opening_date, account_type, amount, is_active
            FROM accounts
            WHERE customer_id = $1
            ORDER BY account_id ASC
            "#,
        )
        .bind(customer_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(account_from_row).collect()
    }

    async fn insert_account(&self, account: &NewAccount) -> Result<AccountId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (customer_id, opening_date, account_type, amount, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING account_id
            "#,
        )
        .bind(account.customer_id.value())
        .bind(account.opening_date)
        .bind(account.account_type.as_str())
        .bind(account.amount.value())
        .bind(account.status.is_active())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, "customer"))?;

        Ok(AccountId::new(id))
    }

    async fn find_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT transaction_id, account_id, amount, transaction_type, transaction_date, balance
            FROM transactions
            WHERE account_id = $1
            ORDER BY transaction_id DESC
            "#,
        )
        .bind(account_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}

#[async_trait]
impl CustomerStore for PgLedgerStore {
    async fn find_customers(&self, filter: StatusFilter) -> Result<Vec<Customer>, StoreError> {
        let is_active = match filter {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.is_active()),
        };

        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT customer_id, name, date_of_birth, email, city, zipcode, is_active
            FROM customers
            WHERE $1::boolean IS NULL OR is_active = $1
            ORDER BY customer_id ASC
            "#,
        )
        .bind(is_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(customer_from_row).collect())
    }

    async fn find_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Customer>, StoreError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT customer_id, name, date_of_birth, email, city, zipcode, is_active
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(customer_from_row))
    }
}

/// Unit of work over a PostgreSQL transaction; rolls back when dropped
struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_balance(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Decimal>, StoreError> {
        let amount: Option<Decimal> =
            sqlx::query_scalar("SELECT amount FROM accounts WHERE account_id = $1 FOR UPDATE")
                .bind(account_id.value())
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(amount)
    }

    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        let amount: Option<Decimal> = sqlx::query_scalar(
            "UPDATE accounts SET amount = amount + $1 WHERE account_id = $2 RETURNING amount",
        )
        .bind(delta)
        .bind(account_id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| StoreError::from_balance_write(e, account_id))?;

        amount.ok_or(StoreError::AccountNotFound(account_id))
    }

    async fn append_entry(
        &mut self,
        entry: &PendingTransaction,
        balance: Decimal,
    ) -> Result<TransactionId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (account_id, amount, transaction_type, transaction_date, balance)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING transaction_id
            "#,
        )
        .bind(entry.account_id.value())
        .bind(entry.amount.value())
        .bind(entry.transaction_type.as_str())
        .bind(entry.transaction_date)
        .bind(balance)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| StoreError::from_insert(e, "account"))?;

        Ok(TransactionId::new(id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.tx.rollback().await?;
        Ok(())
    }
}

fn account_from_row(row: AccountRow) -> Result<Account, StoreError> {
    let (account_id, customer_id, opening_date, account_type, amount, is_active) = row;

    let account_type = account_type
        .parse::<AccountType>()
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;
    let amount = Balance::new(amount).map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(Account {
        account_id: AccountId::new(account_id),
        customer_id: CustomerId::new(customer_id),
        opening_date,
        account_type,
        amount,
        status: Status::from_is_active(is_active),
    })
}

fn transaction_from_row(row: TransactionRow) -> Result<Transaction, StoreError> {
    let (transaction_id, account_id, amount, transaction_type, transaction_date, balance) = row;

    let transaction_type = transaction_type
        .parse::<TransactionType>()
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(Transaction {
        transaction_id: TransactionId::new(transaction_id),
        account_id: AccountId::new(account_id),
        amount: Amount::new(amount).map_err(|e| StoreError::InvalidData(e.to_string()))?,
        transaction_type,
        transaction_date,
        balance: Balance::new(balance).map_err(|e| StoreError::InvalidData(e.to_string()))?,
    })
}

fn customer_from_row(row: CustomerRow) -> Customer {
    let (customer_id, name, date_of_birth, email, city, zipcode, is_active) = row;
    Customer {
        customer_id: CustomerId::new(customer_id),
        name,
        date_of_birth,
        email,
        city,
        zipcode,
        status: Status::from_is_active(is_active),
    }
}
