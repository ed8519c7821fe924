//! Database module
//!
//! Database connection and schema checks.

use sqlx::PgPool;

/// Tables the service reads and writes (created by `migrations/0001_init.sql`)
const REQUIRED_TABLES: [&str; 3] = ["customers", "accounts", "transactions"];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    // The ledger relies on the store rejecting negative balances
    let has_balance_check: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.check_constraints cc
            JOIN information_schema.constraint_column_usage ccu
              ON cc.constraint_name = ccu.constraint_name
            WHERE ccu.table_name = 'accounts' AND ccu.column_name = 'amount'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !has_balance_check {
        tracing::error!("accounts.amount has no CHECK constraint; refusing to start");
        return Ok(false);
    }

    Ok(true)
}
