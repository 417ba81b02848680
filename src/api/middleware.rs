//! API Middleware
//!
//! Gateway identity extraction, role checks and request logging.
//!
//! Authentication itself happens upstream: the gateway forwards the
//! authenticated user, their roles and (for ATM sessions) the card number
//! as headers. This layer only turns them into an `OperationContext` and
//! decides whether a route may be called at all.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::domain::{CardNumber, OperationContext, Role};
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-Request-User-Id";
pub const ROLES_HEADER: &str = "X-Roles";
pub const CARD_NUMBER_HEADER: &str = "X-Card-Number";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Roles allowed on ATM routes
pub const ATM_ROLES: &[Role] = &[Role::CardHolder];
/// Roles allowed on net-bank routes
pub const NETBANK_ROLES: &[Role] = &[Role::Client];
/// Roles allowed on reports and rate administration
pub const BACK_OFFICE_ROLES: &[Role] = &[Role::Admin, Role::Manager];

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse the comma-separated role list. Unknown roles are skipped.
pub fn parse_roles(value: &str) -> Vec<Role> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match s.parse::<Role>() {
            Ok(role) => Some(role),
            Err(unknown) => {
                tracing::debug!(role = %unknown, "Ignoring unknown role");
                None
            }
        })
        .collect()
}

/// Build an `OperationContext` from gateway headers
pub fn context_from_headers(headers: &HeaderMap) -> Result<OperationContext, AppError> {
    let mut context = OperationContext::new();

    if let Some(value) = header_str(headers, USER_ID_HEADER) {
        let user_id = Uuid::parse_str(value)
            .map_err(|_| AppError::InvalidRequest(format!("Invalid {} header format", USER_ID_HEADER)))?;
        context = context.with_request_user(user_id);
    }

    if let Some(value) = header_str(headers, ROLES_HEADER) {
        context = context.with_roles(parse_roles(value));
    }

    if let Some(value) = header_str(headers, CARD_NUMBER_HEADER) {
        let card = CardNumber::parse(value)
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        context = context.with_card(card);
    }

    // Correlation ID from the caller or a fresh one
    let correlation_id = header_str(headers, CORRELATION_ID_HEADER)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    Ok(context.with_correlation_id(correlation_id))
}

// =========================================================================
// Gateway identity middleware
// =========================================================================

/// Attach the gateway-asserted identity to the request
pub async fn identity_middleware(mut request: Request<Body>, next: Next) -> Response {
    match context_from_headers(request.headers()) {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

// =========================================================================
// Capability checks
// =========================================================================

fn check_roles(request: &Request<Body>, allowed: &[Role]) -> Result<(), AppError> {
    let context = request
        .extensions()
        .get::<OperationContext>()
        .ok_or_else(|| AppError::Internal("identity middleware must run first".to_string()))?;

    if context.roles.is_empty() {
        return Err(AppError::MissingHeader(ROLES_HEADER.to_string()));
    }

    if !context.has_any_role(allowed) {
        tracing::info!(
            roles = ?context.roles,
            allowed = ?allowed,
            correlation_id = ?context.correlation_id,
            "Capability check failed"
        );
        return Err(AppError::PermissionDenied);
    }

    Ok(())
}

async fn require_roles(request: Request<Body>, next: Next, allowed: &[Role]) -> Response {
    match check_roles(&request, allowed) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

pub async fn require_card_holder(request: Request<Body>, next: Next) -> Response {
    require_roles(request, next, ATM_ROLES).await
}

pub async fn require_client(request: Request<Body>, next: Next) -> Response {
    require_roles(request, next, NETBANK_ROLES).await
}

pub async fn require_back_office(request: Request<Body>, next: Next) -> Response {
    require_roles(request, next, BACK_OFFICE_ROLES).await
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "x-card-number",
    "x-card-pin",
    "authorization",
    "cookie",
    "set-cookie",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
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
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
