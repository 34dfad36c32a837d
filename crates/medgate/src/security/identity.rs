//! Caller identity derivation for rate limiting and gating
//!
//! Authenticated callers are identified by their account id from the
//! `x-user-id` header (populated by the auth layer in front of this
//! gateway). Anonymous callers get a one-way hash over client IP and
//! user-agent. Two anonymous users behind one proxy with identical
//! user-agents share a bucket; that approximation is deliberate.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Header carrying the authenticated account id, set by the auth layer
const USER_ID_HEADER: &str = "x-user-id";

/// Identity of an inbound caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Stable identifier: account id or anonymous hash
    pub id: String,
    /// Whether the identifier is an authenticated account id
    pub is_authenticated: bool,
}

impl CallerIdentity {
    /// Derive the caller identity from request headers
    pub fn derive(headers: &HeaderMap) -> Self {
        if let Some(user_id) = header_str(headers, USER_ID_HEADER) {
            if !user_id.is_empty() {
                return Self {
                    id: user_id.to_string(),
                    is_authenticated: true,
                };
            }
        }

        let ip = header_str(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or("unknown");
        let user_agent = header_str(headers, "user-agent").unwrap_or("unknown");

        let mut hasher = Sha256::new();
        hasher.update(ip.as_bytes());
        hasher.update(user_agent.as_bytes());
        let digest = hasher.finalize();
        let id = digest.iter().map(|b| format!("{b:02x}")).collect();

        Self {
            id,
            is_authenticated: false,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
