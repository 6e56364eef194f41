//! API configuration.

use std::time::Duration;

/// Secret used when `SESSION_SECRET` is unset outside production.
const DEV_SESSION_SECRET: &str = "jobboard-dev-session-secret";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per client IP)
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HMAC secret for session tokens
    pub session_secret: String,
    /// Lifetime of newly issued sessions
    pub session_ttl: Duration,
    /// Honor `X-Forwarded-Proto` when deciding if a request was secure
    pub trust_proxy: bool,
    /// Where browser-surface gates send unauthenticated users
    pub login_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl: Duration::from_secs(12 * 3600),
            trust_proxy: false,
            login_path: "/login".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            session_secret: std::env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
            session_ttl: env_parse::<u64>("SESSION_TTL_HOURS")
                .map(|h| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.session_ttl),
            trust_proxy: std::env::var("TRUST_PROXY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.trust_proxy),
            login_path: std::env::var("LOGIN_PATH").unwrap_or(defaults.login_path),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Refuse to start in production with the built-in development secret.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.session_secret == DEV_SESSION_SECRET {
            return Err("SESSION_SECRET must be set in production".to_string());
        }
        if self.session_secret.len() < 16 {
            return Err("SESSION_SECRET must be at least 16 characters".to_string());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_production_case_insensitive() {
        let config = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
        assert!(!ApiConfig::default().is_production());
    }

    #[test]
    fn test_validate_rejects_dev_secret_in_production() {
        let config = ApiConfig {
            environment: "production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ApiConfig {
            environment: "production".to_string(),
            session_secret: "a-real-production-secret".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
