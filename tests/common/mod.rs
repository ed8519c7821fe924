//! Common test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;
use tower::util::ServiceExt;

use ledger_bank::api::auth::{AuthError, AuthRequest, AuthVerifier};
use ledger_bank::domain::{Customer, CustomerId, FixedClock, Status};
use ledger_bank::store::InMemoryLedgerStore;
use ledger_bank::{build_router, AppState};

pub const VALID_TOKEN: &str = "valid-token";
pub const FRONTEND_ORIGIN: &str = "https://frontend.test:3000";

/// Verifier that accepts only `VALID_TOKEN` and remembers what it was asked
#[derive(Default)]
pub struct StubVerifier {
    pub calls: Mutex<Vec<AuthRequest>>,
}

impl StubVerifier {
    pub fn last_call(&self) -> Option<AuthRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AuthVerifier for StubVerifier {
    async fn verify(&self, request: &AuthRequest) -> Result<(), AuthError> {
        self.calls.lock().unwrap().push(request.clone());
        if request.token == VALID_TOKEN {
            Ok(())
        } else {
            Err(AuthError::Rejected {
                status: StatusCode::FORBIDDEN,
                message: "Access denied".to_string(),
            })
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryLedgerStore,
    pub verifier: Arc<StubVerifier>,
}

/// Router over an in-memory store holding customers 2 (active) and 3 (inactive)
pub fn setup_test_app() -> TestApp {
    let store = InMemoryLedgerStore::new();
    for (id, name, status) in [(2, "Grace", Status::Active), (3, "Alan", Status::Inactive)] {
        store
            .insert_customer(Customer {
                customer_id: CustomerId::new(id),
                name: name.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                email: format!("{}@example.com", name.to_lowercase()),
                city: "Cambridge".to_string(),
                zipcode: "02139".to_string(),
                status,
            })
            .unwrap();
    }

    let verifier = Arc::new(StubVerifier::default());
    let state = AppState {
        ledger: Arc::new(store.clone()),
        customers: Arc::new(store.clone()),
        clock: Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )),
        verifier: verifier.clone(),
    };

    TestApp {
        router: build_router(state, Some(FRONTEND_ORIGIN)),
        store,
        verifier,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", VALID_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

pub fn post_raw(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", VALID_TOKEN))
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Open an account for customer 2 and return its id
pub async fn open_account(app: &TestApp, amount: &str) -> String {
    let response = send(
        app,
        post_json(
            "/customers/2/account/new",
            serde_json::json!({ "account_type": "saving", "amount": amount }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "Account creation failed");

    json_body(response).await["account_id"]
        .as_str()
        .unwrap()
        .to_string()
}
