//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use std::time::Duration;
use tictactoe::db::DatabaseConfig;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Use the in-memory stores instead of PostgreSQL
    pub in_memory: bool,
    /// Security configuration
    pub security: SecurityConfig,
    /// Move oracle configuration
    pub oracle: OracleConfig,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Access token signing secret (required)
    pub jwt_access_secret: String,
    /// Refresh token signing secret (required)
    pub jwt_refresh_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
}

/// Move oracle configuration
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Values supplied on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub oracle_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values from CLI args
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_addr_var("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = overrides.database_url {
            database.database_url = url;
        }

        // Security configuration (REQUIRED)
        let jwt_access_secret = required_var("JWT_ACCESS_SECRET", "Generate with: openssl rand -hex 32")?;
        let jwt_refresh_secret =
            required_var("JWT_REFRESH_SECRET", "Generate with: openssl rand -hex 32")?;
        let password_pepper = required_var("PASSWORD_PEPPER", "Generate with: openssl rand -hex 16")?;

        if jwt_access_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_ACCESS_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if jwt_refresh_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_REFRESH_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        let security = SecurityConfig {
            jwt_access_secret,
            jwt_refresh_secret,
            password_pepper,
            access_token_ttl_secs: parse_env_or("ACCESS_TOKEN_TTL_SECS", 300),
            refresh_token_ttl_secs: parse_env_or("REFRESH_TOKEN_TTL_SECS", 604_800),
        };

        let url = match overrides.oracle_url {
            Some(url) => url,
            None => required_var("ORACLE_URL", "e.g. http://localhost:8000")?,
        };
        let oracle = OracleConfig {
            url,
            timeout_secs: parse_env_or("ORACLE_TIMEOUT_SECS", 5),
        };

        let metrics_bind = parse_addr_var("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            in_memory: overrides.in_memory,
            security,
            oracle,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_access_secret == self.security.jwt_refresh_secret {
            return Err(ConfigError::Invalid {
                var: "JWT_REFRESH_SECRET".to_string(),
                reason: "Must differ from JWT_ACCESS_SECRET".to_string(),
            });
        }

        if self.security.access_token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.security.refresh_token_ttl_secs <= self.security.access_token_ttl_secs {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_SECS".to_string(),
                reason: format!(
                    "Must be greater than access token TTL ({})",
                    self.security.access_token_ttl_secs
                ),
            });
        }

        if !(self.oracle.url.starts_with("http://") || self.oracle.url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "ORACLE_URL".to_string(),
                reason: "Must be an http:// or https:// URL".to_string(),
            });
        }

        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "ORACLE_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if !self.in_memory && self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn required_var(var: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            var: var.to_string(),
            hint: hint.to_string(),
        })
}

/// Unset is fine; set but unparseable is an error.
fn parse_addr_var(var: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("'{value}' is not an IP:PORT address"),
        }),
        Err(_) => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
