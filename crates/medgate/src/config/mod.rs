use serde::Deserialize;
use std::collections::HashMap;

use crate::security::rate_limit::RouteLimit;

/// Main configuration structure for Medgate
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream model server configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Security and rate limiting configuration
    #[serde(default)]
    pub security: SecurityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".to_string()
}

/// Upstream model server configuration (OpenAI-compatible, LM Studio style)
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API (e.g., "http://localhost:1234/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier to request
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_model() -> String {
    "OpenBioLLM-8B".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    120
}

/// Security gating and rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Enable medical mode (disclaimer gating + privacy headers)
    #[serde(default = "default_medical_mode")]
    pub medical_mode: bool,
    /// Probability that a rate-limit check triggers an expired-entry sweep
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,
    /// Route prefixes that require disclaimer acknowledgment in medical mode
    #[serde(default = "default_protected_routes")]
    pub protected_routes: Vec<String>,
    /// Per-route rate limit overrides, keyed by exact route path
    #[serde(default)]
    pub rate_limits: HashMap<String, RouteLimit>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            medical_mode: default_medical_mode(),
            sweep_probability: default_sweep_probability(),
            protected_routes: default_protected_routes(),
            rate_limits: HashMap::new(),
        }
    }
}

fn default_medical_mode() -> bool {
    true
}

fn default_sweep_probability() -> f64 {
    0.01
}

fn default_protected_routes() -> Vec<String> {
    vec!["/api/chat".to_string(), "/api/medical".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8787");
        assert_eq!(config.upstream.base_url, "http://localhost:1234/v1");
        assert_eq!(config.upstream.model, "OpenBioLLM-8B");
        assert!((config.upstream.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.upstream.max_tokens, 2048);
        assert_eq!(config.upstream.timeout_secs, 120);
        assert!(config.security.medical_mode);
        assert!((config.security.sweep_probability - 0.01).abs() < f64::EPSILON);
        assert_eq!(
            config.security.protected_routes,
            vec!["/api/chat", "/api/medical"]
        );
        assert!(config.security.rate_limits.is_empty());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:9090"

[upstream]
base_url = "http://localhost:11434/v1"
model = "custom-model"
temperature = 0.2
max_tokens = 1024
timeout_secs = 60

[security]
medical_mode = false
sweep_probability = 0.05
protected_routes = ["/api/chat"]
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.upstream.base_url, "http://localhost:11434/v1");
        assert_eq!(config.upstream.model, "custom-model");
        assert!((config.upstream.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.upstream.max_tokens, 1024);
        assert_eq!(config.upstream.timeout_secs, 60);
        assert!(!config.security.medical_mode);
        assert!((config.security.sweep_probability - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.security.protected_routes, vec!["/api/chat"]);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        // Only one section provided; everything else falls back to defaults
        let toml_str = r#"
[upstream]
model = "MedLlama-7B"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.server.listen_addr, "127.0.0.1:8787");
        assert_eq!(config.upstream.model, "MedLlama-7B");
        assert_eq!(config.upstream.base_url, "http://localhost:1234/v1");
        assert!(config.security.medical_mode);
    }

    #[test]
    fn test_rate_limit_overrides_from_toml() {
        let toml_str = r#"
[security.rate_limits."/api/chat"]
window_ms = 30000
max_requests = 3
message = "Slow down."
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");
        let limit = config
            .security
            .rate_limits
            .get("/api/chat")
            .expect("override missing");
        assert_eq!(limit.window_ms, 30_000);
        assert_eq!(limit.max_requests, 3);
        assert_eq!(limit.message, "Slow down.");
    }

    #[test]
    fn test_rate_limits_default_to_empty() {
        let toml_str = r#"
[security]
medical_mode = true
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");
        assert!(config.security.rate_limits.is_empty());
    }
}
