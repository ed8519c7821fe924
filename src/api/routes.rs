//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountId, AccountType, Amount, AmountError, Clock, CustomerId, DomainError, TransactionType,
    MAX_AMOUNT,
};
use crate::error::AppError;
use crate::handlers::{
    AccountHandler, AccountResponse, CustomerHandler, CustomerResponse, NewAccountCommand,
    NewAccountResponse, TransactionCommand, TransactionHandler, TransactionHistoryEntry,
    TransactionResponse,
};
use crate::store::{CustomerStore, LedgerStore};

use super::auth::AuthVerifier;

/// Smallest opening deposit
const MIN_OPENING_DEPOSIT: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

/// Shared dependencies of every route
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub clock: Arc<dyn Clock>,
    pub verifier: Arc<dyn AuthVerifier>,
}

impl AppState {
    fn account_handler(&self) -> AccountHandler {
        AccountHandler::new(self.ledger.clone(), self.clock.clone())
    }

    fn transaction_handler(&self) -> TransactionHandler {
        TransactionHandler::new(self.ledger.clone(), self.clock.clone())
    }

    fn customer_handler(&self) -> CustomerHandler {
        CustomerHandler::new(self.customers.clone())
    }
}

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: String,
}

/// Body of `POST /customers/:customer_id/account/new`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NewAccountRequest {
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl NewAccountRequest {
    /// Check the request field by field, reporting the first problem found
    pub fn validate(self, customer_id: &str) -> Result<NewAccountCommand, DomainError> {
        let customer_id = parse_customer_id(customer_id)?;

        let account_type: AccountType = self
            .account_type
            .parse()
            .map_err(|_| DomainError::validation("Account type should be saving or checking"))?;

        let amount = self
            .amount
            .filter(|a| *a >= MIN_OPENING_DEPOSIT && *a <= MAX_AMOUNT)
            .and_then(|a| Amount::new(a).ok())
            .ok_or_else(|| {
                DomainError::validation("To open an account you must deposit at least $5000")
            })?;

        Ok(NewAccountCommand::new(customer_id, account_type, amount))
    }
}

/// Body of `POST /customers/:customer_id/account/:account_id`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub transaction_type: String,
}

impl TransactionRequest {
    /// Check the request field by field, reporting the first problem found
    pub fn validate(
        self,
        customer_id: &str,
        account_id: &str,
    ) -> Result<TransactionCommand, DomainError> {
        let account_id: AccountId = account_id
            .parse()
            .map_err(|_| DomainError::validation("Account ID must be present and a number"))?;

        let amount = Amount::new(self.amount.unwrap_or_default()).map_err(|e| match e {
            AmountError::Overflow => {
                DomainError::validation("Transaction amount cannot exceed $99999999.99")
            }
            AmountError::TooManyDecimals(_) => DomainError::validation(
                "Transaction amount cannot have more than 2 decimal places",
            ),
            _ => DomainError::validation("Transaction amount must be greater than $0"),
        })?;

        let transaction_type: TransactionType = self.transaction_type.parse().map_err(|_| {
            DomainError::validation("Transaction type should be withdrawal or deposit")
        })?;

        let customer_id = parse_customer_id(customer_id)?;

        Ok(TransactionCommand::new(
            customer_id,
            account_id,
            amount,
            transaction_type,
        ))
    }
}

fn parse_customer_id(raw: &str) -> Result<CustomerId, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::validation("Customer ID must be present and a number"))
}

/// Unwrap a JSON body, turning any decoding failure into the generic 400
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::error!(error = %rejection.body_text(), "Error while decoding json body");
            Err(AppError::malformed_body())
        }
    }
}

// =========================================================================
// Router
// =========================================================================

/// Routes that require a verified token
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(get_all_customers))
        .route("/customers/:customer_id", get(get_customer))
        .route("/customers/:customer_id/account", get(get_accounts_for_customer))
        .route("/customers/:customer_id/account/new", post(new_account))
        .route("/customers/:customer_id/account/:account_id", post(new_transaction))
        .route(
            "/customers/:customer_id/account/:account_id/transactions",
            get(get_transaction_history),
        )
}

// =========================================================================
// Customers
// =========================================================================

async fn get_all_customers(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state
        .customer_handler()
        .get_all_customers(&query.status)
        .await?;
    Ok(Json(customers))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer_id = parse_customer_id(&customer_id)?;
    let customer = state.customer_handler().get_customer(customer_id).await?;
    Ok(Json(customer))
}

// =========================================================================
// Accounts
// =========================================================================

async fn get_accounts_for_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let customer_id = parse_customer_id(&customer_id)?;
    let accounts = state.account_handler().get_all_accounts(customer_id).await?;
    Ok(Json(accounts))
}

async fn new_account(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    payload: Result<Json<NewAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NewAccountResponse>), AppError> {
    let command = json_body(payload)?.validate(&customer_id)?;
    let response = state.account_handler().create_new_account(command).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_transaction_history(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(String, String)>,
) -> Result<Json<Vec<TransactionHistoryEntry>>, AppError> {
    parse_customer_id(&customer_id)?;
    let account_id: AccountId = account_id
        .parse()
        .map_err(|_| DomainError::validation("Account ID must be present and a number"))?;

    let history = state
        .account_handler()
        .get_transaction_history(account_id)
        .await?;
    Ok(Json(history))
}

// =========================================================================
// Transactions
// =========================================================================

async fn new_transaction(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(String, String)>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let command = json_body(payload)?.validate(&customer_id, &account_id)?;
    let response = state.transaction_handler().make_transaction(command).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
