//! Token verification
//!
//! Every protected route asks the auth server whether the caller's token may
//! use that route for the customer/account in the path.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// What the auth server is asked to allow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub token: String,
    pub route_name: &'static str,
    pub customer_id: Option<String>,
    pub account_id: Option<String>,
}

impl AuthRequest {
    /// Build a request from a raw `Authorization` header value
    pub fn new(authorization: &str, route_name: &'static str) -> Self {
        Self {
            token: extract_token(authorization),
            route_name,
            customer_id: None,
            account_id: None,
        }
    }
}

/// `"Bearer <token>"` and bare `"<token>"` both yield `<token>`
pub fn extract_token(authorization: &str) -> String {
    let token = match authorization.split_once(BEARER_PREFIX) {
        Some((_, token)) => token,
        None => authorization,
    };
    token.trim().to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The auth server answered, and the answer was no
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("auth server unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable auth server response: {0}")]
    InvalidResponse(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected { status, message } => AppError::AuthRejected { status, message },
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, request: &AuthRequest) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    message: String,
}

/// Verifier backed by the auth server's `GET /auth/verify`
#[derive(Debug, Clone)]
pub struct RemoteAuthVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl RemoteAuthVerifier {
    pub fn new(auth_server_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: format!("{}/auth/verify", auth_server_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AuthVerifier for RemoteAuthVerifier {
    async fn verify(&self, request: &AuthRequest) -> Result<(), AuthError> {
        let response = self
            .client
            .get(&self.verify_url)
            .query(&[
                ("token", request.token.as_str()),
                ("route_name", request.route_name),
                ("account_id", request.account_id.as_deref().unwrap_or_default()),
                ("customer_id", request.customer_id.as_deref().unwrap_or_default()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        tracing::warn!(
            route_name = request.route_name,
            status = %status,
            message = %body.message,
            "Verification failed"
        );

        Err(AuthError::Rejected {
            status,
            message: body.message,
        })
    }
}
