/// Configuration management for the API server
///
/// Loads configuration from environment variables into a type-safe struct,
/// failing fast at startup on anything missing or malformed.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `API_PRODUCTION`: Enables HSTS and strict CORS (default: false)
/// - `JWT_SECRET`: Secret for token signing, at least 32 bytes (required)
/// - `ADMIN_EMAIL`: The one email allowed to hold the admin role (required)
/// - `ADMIN_PASSWORD`: If set, the admin account is seeded at startup
/// - `BILLING_WEBHOOK_SECRET`: HMAC secret for payment webhooks (required)
/// - `PROVIDER_TIMEOUT_SECS`: Bound on identity/database calls (default: 10)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Auth and admin provisioning
    pub auth: AuthConfig,

    /// Payment webhook verification
    pub billing: BillingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; ["*"] means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS, strict CORS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for token signing; at least 32 bytes
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Auth service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The single email permitted to hold the admin role
    pub admin_email: String,

    /// Seed password for the admin account; None skips provisioning
    pub admin_password: Option<String>,

    /// Bound on any single identity/database call, in seconds
    pub provider_timeout_secs: u64,
}

/// Payment webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Shared HMAC secret for webhook signatures
    pub webhook_secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse or validate.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("API_CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("API_PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let admin_email = env::var("ADMIN_EMAIL")
            .map_err(|_| anyhow::anyhow!("ADMIN_EMAIL environment variable is required"))?;

        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let provider_timeout_secs = env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()?;
        if provider_timeout_secs == 0 {
            anyhow::bail!("PROVIDER_TIMEOUT_SECS must be positive");
        }

        let webhook_secret = env::var("BILLING_WEBHOOK_SECRET").map_err(|_| {
            anyhow::anyhow!("BILLING_WEBHOOK_SECRET environment variable is required")
        })?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            auth: AuthConfig {
                admin_email,
                admin_password,
                provider_timeout_secs,
            },
            billing: BillingConfig { webhook_secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Provider timeout as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.provider_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            auth: AuthConfig {
                admin_email: "admin@cinevault.example".to_string(),
                admin_password: None,
                provider_timeout_secs: 10,
            },
            billing: BillingConfig {
                webhook_secret: "webhook-secret".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_provider_timeout() {
        assert_eq!(config().provider_timeout(), Duration::from_secs(10));
    }
}
