//! API Middleware
//!
//! Token verification and request logging.

use axum::{
    body::Body,
    extract::{MatchedPath, RawPathParams, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

use super::auth::AuthRequest;
use super::routes::AppState;

// =========================================================================
// Route names
// =========================================================================

/// Name the auth server knows each protected route by
pub fn route_name(matched_path: &str) -> Option<&'static str> {
    match matched_path {
        "/customers" => Some("GetAllCustomers"),
        "/customers/:customer_id" => Some("GetCustomer"),
        "/customers/:customer_id/account" => Some("GetAccountsForCustomer"),
        "/customers/:customer_id/account/new" => Some("NewAccount"),
        "/customers/:customer_id/account/:account_id" => Some("NewTransaction"),
        "/customers/:customer_id/account/:account_id/transactions" => {
            Some("GetTransactionHistory")
        }
        _ => None,
    }
}

// =========================================================================
// Token verification
// =========================================================================

/// Require an `Authorization` header and have the auth server verify it for
/// this route. Installed with `route_layer` so the matched path is known.
pub async fn auth_middleware(
    State(state): State<AppState>,
    matched_path: MatchedPath,
    params: RawPathParams,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty());

    let Some(authorization) = authorization else {
        tracing::warn!(path = matched_path.as_str(), "Client did not provide a token");
        return Err(AppError::MissingToken);
    };

    let route_name = route_name(matched_path.as_str()).ok_or_else(|| {
        AppError::Internal(format!("no route name for {}", matched_path.as_str()))
    })?;

    let mut auth_request = AuthRequest::new(authorization, route_name);
    for (key, value) in &params {
        match key {
            "customer_id" => auth_request.customer_id = Some(value.to_string()),
            "account_id" => auth_request.account_id = Some(value.to_string()),
            _ => {}
        }
    }

    state.verifier.verify(&auth_request).await?;

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    // Set by the request-id layer
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret-token".parse().unwrap());
        headers.insert("x-request-id", "req-123".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let authorization = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let request_id = masked.iter().find(|(k, _)| k == "x-request-id");

        assert_eq!(authorization.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(request_id.unwrap().1, "req-123");
    }

    #[test]
    fn test_route_names() {
        assert_eq!(route_name("/customers"), Some("GetAllCustomers"));
        assert_eq!(
            route_name("/customers/:customer_id/account/:account_id"),
            Some("NewTransaction")
        );
        assert_eq!(
            route_name("/customers/:customer_id/account/new"),
            Some("NewAccount")
        );
        assert_eq!(route_name("/health"), None);
    }
}
