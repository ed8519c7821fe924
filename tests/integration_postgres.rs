//! PostgreSQL store tests
//!
//! Need `DATABASE_URL` pointing at a database with `migrations/0001_init.sql`
//! applied. Run with: cargo test --test integration_postgres -- --ignored

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use ledger_bank::domain::{
    AccountId, AccountType, Amount, CustomerId, DomainError, FixedClock, NewAccount,
    PendingTransaction, TransactionType,
};
use ledger_bank::handlers::{TransactionCommand, TransactionHandler};
use ledger_bank::repository::AccountRepository;
use ledger_bank::store::PgLedgerStore;

async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    assert!(
        ledger_bank::db::check_schema(&pool).await.unwrap(),
        "migrations/0001_init.sql has not been applied"
    );
    pool
}

/// Fresh customer with one account; tests do not share rows
async fn seed_account(pool: &PgPool, balance: Decimal) -> (CustomerId, AccountId) {
    let customer_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO customers (name, date_of_birth, email, city, zipcode, is_active)
        VALUES ('Test Customer', '1990-01-01', 'test@example.com', 'Austin', '73301', TRUE)
        RETURNING customer_id
        "#,
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed customer");
    let customer_id = CustomerId::new(customer_id);

    let repo = AccountRepository::new(Arc::new(PgLedgerStore::new(pool.clone())));
    let account = repo
        .save(NewAccount::new(
            customer_id,
            AccountType::Saving,
            Amount::new(balance).unwrap(),
            &FixedClock(Utc::now()),
        ))
        .await
        .expect("Failed to seed account");

    (customer_id, account.account_id)
}

async fn ledger_rows(pool: &PgPool, account_id: AccountId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE account_id = $1")
        .bind(account_id.value())
        .fetch_one(pool)
        .await
        .unwrap()
}

fn pending(account_id: AccountId, amount: Decimal, kind: TransactionType) -> PendingTransaction {
    PendingTransaction::new(
        account_id,
        Amount::new(amount).unwrap(),
        kind,
        &FixedClock(Utc::now()),
    )
}

#[tokio::test]
#[ignore]
async fn test_withdrawal_commits_balance_and_entry() {
    let pool = setup_test_db().await;
    let (_, account_id) = seed_account(&pool, dec!(12000)).await;
    let repo = AccountRepository::new(Arc::new(PgLedgerStore::new(pool.clone())));

    let transaction = repo
        .transact(pending(account_id, dec!(6000), TransactionType::Withdrawal))
        .await
        .unwrap();

    assert_eq!(transaction.balance.value(), dec!(6000));
    assert_eq!(
        repo.find_by_id(account_id).await.unwrap().amount.value(),
        dec!(6000)
    );
    assert_eq!(ledger_rows(&pool, account_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_check_constraint_rolls_back_overdraft() {
    let pool = setup_test_db().await;
    let (_, account_id) = seed_account(&pool, dec!(10)).await;
    let repo = AccountRepository::new(Arc::new(PgLedgerStore::new(pool.clone())));

    let err = repo
        .transact(pending(account_id, dec!(6000), TransactionType::Withdrawal))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::unexpected());
    assert_eq!(
        repo.find_by_id(account_id).await.unwrap().amount.value(),
        dec!(10)
    );
    assert_eq!(ledger_rows(&pool, account_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_unknown_customer_is_not_found() {
    let pool = setup_test_db().await;
    let repo = AccountRepository::new(Arc::new(PgLedgerStore::new(pool)));

    let err = repo
        .save(NewAccount::new(
            CustomerId::new(i64::MAX),
            AccountType::Checking,
            Amount::new(dec!(5000)).unwrap(),
            &FixedClock(Utc::now()),
        ))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::not_found("Customer not found"));
}

#[tokio::test]
#[ignore]
async fn test_concurrent_withdrawals_never_overdraw() {
    let pool = setup_test_db().await;
    let (customer_id, account_id) = seed_account(&pool, dec!(10000)).await;
    let handler = Arc::new(TransactionHandler::new(
        Arc::new(PgLedgerStore::new(pool.clone())),
        Arc::new(FixedClock(Utc::now())),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let handler = Arc::clone(&handler);
        handles.push(tokio::spawn(async move {
            handler
                .make_transaction(TransactionCommand::withdrawal(
                    customer_id,
                    account_id,
                    Amount::new(dec!(3000)).unwrap(),
                ))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert_eq!(e, DomainError::insufficient_balance()),
        }
    }

    assert_eq!(succeeded, 3);
    let balance: Decimal = sqlx::query_scalar("SELECT amount FROM accounts WHERE account_id = $1")
        .bind(account_id.value())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(balance, dec!(1000));
    assert_eq!(ledger_rows(&pool, account_id).await, 3);
}

#[tokio::test]
#[ignore]
async fn test_ledger_is_append_only() {
    let pool = setup_test_db().await;
    let (_, account_id) = seed_account(&pool, dec!(5000)).await;
    let repo = AccountRepository::new(Arc::new(PgLedgerStore::new(pool.clone())));
    repo.transact(pending(account_id, dec!(1), TransactionType::Deposit))
        .await
        .unwrap();

    let result = sqlx::query("UPDATE transactions SET amount = 2 WHERE account_id = $1")
        .bind(account_id.value())
        .execute(&pool)
        .await;

    assert!(result.is_err());
}
