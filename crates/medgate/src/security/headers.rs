//! Security headers applied to every gateway response

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

/// Content security policy enumerating allowed origins, including the
/// local model servers the chat frontend talks to
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
script-src 'self' 'unsafe-inline'; \
style-src 'self' 'unsafe-inline'; \
img-src 'self' data: https: blob:; \
font-src 'self'; \
connect-src 'self' http://localhost:1234 http://localhost:11434; \
frame-src 'self'; \
object-src 'none'; \
base-uri 'self'; \
form-action 'self'; \
upgrade-insecure-requests";

/// Headers applied to every response
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "camera=(), microphone=(), geolocation=()"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
];

/// Extra headers when medical mode is active: suppress caching of health
/// conversations and mark the mode for the frontend
const MEDICAL_SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-medical-mode", "true"),
    ("x-privacy-enhanced", "true"),
    ("cache-control", "no-store, no-cache, must-revalidate, private"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Apply the security header set to a response, stripping headers that
/// could reveal implementation identity.
pub fn apply_security_headers(headers: &mut HeaderMap, medical_mode: bool) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    if medical_mode {
        for (name, value) in MEDICAL_SECURITY_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
    }

    headers.remove(HeaderName::from_static("x-powered-by"));
    headers.remove(header::SERVER);
}
