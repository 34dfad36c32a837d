//! Per-request security gating
//!
//! Every inbound request runs a short-circuiting chain: rate limit check,
//! session expiry check, then medical disclaimer gating. The first check
//! that fails produces a structured JSON rejection; otherwise the request
//! proceeds to its handler. Every response, rejection or not, leaves with
//! the security header set applied.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::gateway::AppState;
use crate::security::headers::apply_security_headers;
use crate::security::identity::CallerIdentity;
use crate::security::rate_limit::RateLimitDecision;

/// Cookie holding the opaque session token
const SESSION_TOKEN_COOKIE: &str = "session-token";

/// Cookie holding the session expiry timestamp (RFC 3339)
const SESSION_EXPIRY_COOKIE: &str = "session-expiry";

/// Cookie set once the user has acknowledged the medical disclaimer
const DISCLAIMER_COOKIE: &str = "medical-disclaimer-accepted";

/// Security gating middleware wrapping every gateway route
pub async fn security_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let identity = CallerIdentity::derive(request.headers());
    let medical_mode = state.config.security.medical_mode;
    let now = Utc::now();
    let now_ms = now.timestamp_millis().max(0) as u64;

    let decision = state.limiter.check_and_record(&identity.id, &path, now_ms);
    if let RateLimitDecision::Rejected {
        retry_after_secs,
        limit,
        reset_at_ms,
        message,
    } = decision
    {
        tracing::warn!(
            target: "medgate::audit",
            caller = %identity.id,
            path = %path,
            retry_after_secs,
            "rate limit exceeded"
        );
        let mut response = rate_limited_response(retry_after_secs, limit, reset_at_ms, &message);
        apply_security_headers(response.headers_mut(), medical_mode);
        return response;
    }

    if session_expired(request.headers(), now) {
        tracing::info!(
            target: "medgate::audit",
            caller = %identity.id,
            path = %path,
            "session expired"
        );
        let mut response = session_expired_response();
        apply_security_headers(response.headers_mut(), medical_mode);
        return response;
    }

    if needs_disclaimer(&state, &identity, request.headers(), &path) {
        tracing::info!(
            target: "medgate::audit",
            caller = %identity.id,
            path = %path,
            "disclaimer not acknowledged"
        );
        let mut response = disclaimer_required_response();
        apply_security_headers(response.headers_mut(), medical_mode);
        return response;
    }

    tracing::debug!(
        target: "medgate::audit",
        caller = %identity.id,
        authenticated = identity.is_authenticated,
        path = %path,
        "request admitted"
    );

    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut(), medical_mode);
    response
}

/// True when a session token is present and its expiry cookie is in the past.
///
/// An absent or unparseable expiry cookie is treated as not expired; expiry
/// enforcement belongs to the auth layer, this check only reacts to an
/// explicit stale marker.
fn session_expired(headers: &HeaderMap, now: DateTime<Utc>) -> bool {
    if cookie_value(headers, SESSION_TOKEN_COOKIE).is_none() {
        return false;
    }
    match cookie_value(headers, SESSION_EXPIRY_COOKIE) {
        Some(expiry) => DateTime::parse_from_rfc3339(&expiry)
            .map(|expiry| expiry < now)
            .unwrap_or(false),
        None => false,
    }
}

/// True when medical mode requires the disclaimer and the caller has not
/// acknowledged it on a protected route
fn needs_disclaimer(
    state: &AppState,
    identity: &CallerIdentity,
    headers: &HeaderMap,
    path: &str,
) -> bool {
    if !state.config.security.medical_mode || !identity.is_authenticated {
        return false;
    }
    if cookie_value(headers, DISCLAIMER_COOKIE).is_some() {
        return false;
    }
    state
        .config
        .security
        .protected_routes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// Read one cookie value from the request headers
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(raw) = header_value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn rate_limited_response(
    retry_after_secs: u64,
    limit: u32,
    reset_at_ms: u64,
    message: &str,
) -> Response {
    let body = serde_json::json!({
        "error": "Rate limit exceeded",
        "message": message,
        "retryAfter": retry_after_secs,
    });

    let reset_iso = DateTime::<Utc>::from_timestamp_millis(reset_at_ms as i64)
        .map(|reset| reset.to_rfc3339())
        .unwrap_or_default();

    let mut builder = Response::builder()
        .status(StatusCode::TOO_MANY_REQUESTS)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::RETRY_AFTER, retry_after_secs.to_string())
        .header("x-ratelimit-limit", limit.to_string())
        .header("x-ratelimit-remaining", "0");
    if let Ok(value) = HeaderValue::from_str(&reset_iso) {
        builder = builder.header("x-ratelimit-reset", value);
    }

    builder
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| fallback_response())
}

fn session_expired_response() -> Response {
    let body = serde_json::json!({
        "error": "Session expired",
        "message": "Your session has expired. Please log in again.",
    });

    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::SET_COOKIE,
            format!("{SESSION_TOKEN_COOKIE}=; Max-Age=0; Path=/"),
        )
        .header(
            header::SET_COOKIE,
            format!("{SESSION_EXPIRY_COOKIE}=; Max-Age=0; Path=/"),
        )
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| fallback_response())
}

fn disclaimer_required_response() -> Response {
    let body = serde_json::json!({
        "error": "Medical disclaimer required",
        "message": "You must accept the medical disclaimer before using health features.",
        "action": "show_disclaimer",
    });

    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| fallback_response())
}

fn fallback_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
