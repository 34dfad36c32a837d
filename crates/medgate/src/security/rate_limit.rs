//! Per-caller, per-route rate limiting with fixed-window counters
//!
//! The store owns an in-memory map of `identifier:route` keys to window
//! records. Callers pass the current time explicitly so tests can control
//! the clock; the store never reads the wall clock itself. Expired entries
//! are swept opportunistically with a tunable per-call probability rather
//! than on a schedule, so memory growth is bounded in expectation only.

use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;

/// Limit parameters for one route
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RouteLimit {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Maximum allowed requests per window
    pub max_requests: u32,
    /// Message returned to rejected callers
    pub message: String,
}

/// Per-route limit table with a default fallback.
///
/// Lookup is by exact route match; anything unlisted gets the default.
#[derive(Debug, Clone)]
pub struct RouteLimits {
    routes: HashMap<String, RouteLimit>,
    fallback: RouteLimit,
}

impl RouteLimits {
    pub fn new(routes: HashMap<String, RouteLimit>, fallback: RouteLimit) -> Self {
        Self { routes, fallback }
    }

    /// Merge route overrides on top of the default table
    pub fn with_overrides(overrides: &HashMap<String, RouteLimit>) -> Self {
        let mut limits = Self::default();
        for (route, limit) in overrides {
            limits.routes.insert(route.clone(), limit.clone());
        }
        limits
    }

    pub fn for_route(&self, route: &str) -> &RouteLimit {
        self.routes.get(route).unwrap_or(&self.fallback)
    }
}

impl Default for RouteLimits {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            "/api/chat".to_string(),
            RouteLimit {
                window_ms: 60_000,
                max_requests: 10,
                message: "Too many medical consultation requests. Please wait before trying again."
                    .to_string(),
            },
        );
        routes.insert(
            "/api/create-chat".to_string(),
            RouteLimit {
                window_ms: 60_000,
                max_requests: 5,
                message: "Too many chat creation requests. Please wait before trying again."
                    .to_string(),
            },
        );
        routes.insert(
            "/api/health".to_string(),
            RouteLimit {
                window_ms: 60_000,
                max_requests: 30,
                message: "Too many health check requests.".to_string(),
            },
        );
        Self {
            routes,
            fallback: RouteLimit {
                window_ms: 60_000,
                max_requests: 30,
                message: "Too many requests. Please slow down.".to_string(),
            },
        }
    }
}

/// One caller's counter for the current window
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at_ms: u64,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitDecision {
    Allowed {
        /// Requests counted in the current window, this one included
        count: u32,
        /// Requests left before rejection
        remaining: u32,
        limit: u32,
        reset_at_ms: u64,
    },
    Rejected {
        /// Whole seconds until the window resets, rounded up
        retry_after_secs: u64,
        limit: u32,
        reset_at_ms: u64,
        message: String,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Fixed-window rate limiter keyed by `identifier:route`
pub struct RateLimitStore {
    limits: RouteLimits,
    records: DashMap<String, RateLimitRecord>,
    sweep_probability: f64,
}

impl RateLimitStore {
    /// Create a store. `sweep_probability` is the per-call chance of a full
    /// expired-entry sweep; pass 0.0 to disable it or 1.0 to sweep always.
    pub fn new(limits: RouteLimits, sweep_probability: f64) -> Self {
        Self {
            limits,
            records: DashMap::new(),
            sweep_probability,
        }
    }

    /// Check and record one request. The sole mutator of the store.
    ///
    /// A fresh record is written when the key is absent or the window has
    /// elapsed. A rejected request does not mutate its record: the count
    /// stops at the limit, and the caller gets a retry hint instead.
    pub fn check_and_record(
        &self,
        identifier: &str,
        route: &str,
        now_ms: u64,
    ) -> RateLimitDecision {
        // Sweep before taking an entry guard; retain would contend with it
        if self.sweep_probability > 0.0 && fastrand::f64() < self.sweep_probability {
            self.sweep(now_ms);
        }

        let limit = self.limits.for_route(route);
        let key = format!("{identifier}:{route}");

        match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if now_ms > record.reset_at_ms {
                    // Window elapsed: replace, not merge
                    *record = RateLimitRecord {
                        count: 1,
                        reset_at_ms: now_ms + limit.window_ms,
                    };
                    RateLimitDecision::Allowed {
                        count: 1,
                        remaining: limit.max_requests.saturating_sub(1),
                        limit: limit.max_requests,
                        reset_at_ms: record.reset_at_ms,
                    }
                } else if record.count >= limit.max_requests {
                    RateLimitDecision::Rejected {
                        retry_after_secs: (record.reset_at_ms - now_ms).div_ceil(1000),
                        limit: limit.max_requests,
                        reset_at_ms: record.reset_at_ms,
                        message: limit.message.clone(),
                    }
                } else {
                    record.count += 1;
                    RateLimitDecision::Allowed {
                        count: record.count,
                        remaining: limit.max_requests.saturating_sub(record.count),
                        limit: limit.max_requests,
                        reset_at_ms: record.reset_at_ms,
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let record = RateLimitRecord {
                    count: 1,
                    reset_at_ms: now_ms + limit.window_ms,
                };
                vacant.insert(record);
                RateLimitDecision::Allowed {
                    count: 1,
                    remaining: limit.max_requests.saturating_sub(1),
                    limit: limit.max_requests,
                    reset_at_ms: record.reset_at_ms,
                }
            }
        }
    }

    /// Remove all entries whose window has elapsed
    pub fn sweep(&self, now_ms: u64) {
        self.records.retain(|_, record| now_ms <= record.reset_at_ms);
    }

    /// Number of tracked entries (expired ones included until swept)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
