//! Request security: rate limiting, caller identity, response headers, and
//! the per-request gating middleware.

pub mod headers;
pub mod identity;
pub mod middleware;
pub mod rate_limit;

pub use headers::apply_security_headers;
pub use identity::CallerIdentity;
pub use middleware::security_middleware;
pub use rate_limit::{RateLimitDecision, RateLimitStore, RouteLimit, RouteLimits};
