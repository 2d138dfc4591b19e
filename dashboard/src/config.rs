//! Configuration management for the dashboard.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Call [`Config::validate`] after loading; the binary refuses to start on
//! an invalid configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Secret used when `SESSION_SECRET` is unset. Rejected when cookies are secure.
pub const DEVELOPMENT_SESSION_SECRET: &str = "busdesk-development-secret-change-me";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Backend REST API configuration
    pub api: ApiConfig,
    /// Session cookie and token configuration
    pub session: SessionConfig,
    /// Sale dialog configuration
    pub dialog: DialogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix, without a trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for signing session tokens
    #[serde(skip_serializing)]
    pub secret: String,
    /// Session lifetime in seconds (default: 2 hours)
    pub ttl_secs: u64,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Mark the cookie `Secure`
    pub secure_cookies: bool,
}

/// Sale dialog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Delay between closing the dialog and clearing its fields, in milliseconds
    pub reset_delay_ms: u64,
}

impl DialogConfig {
    /// Reset delay as a [`Duration`].
    #[must_use]
    pub const fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

/// Configuration problems detected by [`Config::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `API_URL` is not an http(s) URL
    #[error("API_URL must start with http:// or https://, got {0}")]
    InvalidApiUrl(String),

    /// `SESSION_SECRET` is empty
    #[error("SESSION_SECRET must not be empty")]
    EmptySessionSecret,

    /// Secure cookies were requested with the development secret
    #[error("SESSION_SECRET must be set when SECURE_COOKIES is enabled")]
    DevelopmentSecretInProduction,

    /// A timeout or lifetime is zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
                metrics_host: env::var("METRICS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                metrics_port: env::var("METRICS_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(9090),
            },
            api: ApiConfig {
                base_url: env::var("API_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string()),
                timeout_secs: env::var("API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            },
            session: SessionConfig {
                secret: env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| DEVELOPMENT_SESSION_SECRET.to_string()),
                ttl_secs: env::var("SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(7200),
                cookie_name: "busdesk_session".to_string(),
                secure_cookies: env::var("SECURE_COOKIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            dialog: DialogConfig {
                reset_delay_ms: env::var("DIALOG_RESET_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            },
        }
    }

    /// Check invariants `from_env` cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(url.clone()));
        }
        if self.session.secret.is_empty() {
            return Err(ConfigError::EmptySessionSecret);
        }
        if self.session.secure_cookies && self.session.secret == DEVELOPMENT_SESSION_SECRET {
            return Err(ConfigError::DevelopmentSecretInProduction);
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("API_TIMEOUT_SECS"));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration("SESSION_TTL_SECS"));
        }
        Ok(())
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Address the Prometheus exporter binds to.
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.server.metrics_host, self.server.metrics_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                log_level: "info".to_string(),
                metrics_host: "127.0.0.1".to_string(),
                metrics_port: 9090,
            },
            api: ApiConfig {
                base_url: "http://127.0.0.1:8000/api".to_string(),
                timeout_secs: 15,
            },
            session: SessionConfig {
                secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                ttl_secs: 7200,
                cookie_name: "busdesk_session".to_string(),
                secure_cookies: false,
            },
            dialog: DialogConfig { reset_delay_ms: 300 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Config::default().api.timeout(), Duration::from_secs(15));
        assert_eq!(Config::default().dialog.reset_delay(), Duration::from_millis(300));
    }

    #[test]
    fn rejects_non_http_api_url() {
        let mut config = Config::default();
        config.api.base_url = "127.0.0.1:8000/api".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiUrl(_))));
    }

    #[test]
    fn secure_cookies_need_a_real_secret() {
        let mut config = Config::default();
        config.session.secure_cookies = true;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DevelopmentSecretInProduction)
        );

        config.session.secret = "a-long-random-production-secret".to_string();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("API_TIMEOUT_SECS"))
        );
    }
}
