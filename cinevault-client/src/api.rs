/// HTTP client for the CineVault API
///
/// Thin typed wrapper over reqwest. Every request carries a bounded timeout;
/// a timeout or connection failure surfaces as
/// [`ClientError::ProviderUnavailable`] rather than hanging the caller.
///
/// A 401 response is its own variant because it carries a contract: the
/// session is gone, clear the local cache. 403s arrive as
/// [`ClientError::Rejected`] with the server's message; the session is
/// still valid, access was denied.

use std::time::Duration;

use cinevault_shared::auth::session::SessionUser;
use cinevault_shared::models::profile::{PlanType, Role};
use cinevault_shared::models::subscription::SubscriptionRecord;
use serde::{Deserialize, Serialize};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for API calls
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network failure or timeout; transient, safe to retry
    #[error("Service temporarily unavailable, please try again")]
    ProviderUnavailable,

    /// 401: session invalid or expired; clear the cache and re-login
    #[error("Session expired")]
    Unauthorized,

    /// Any other 4xx, with the server's message
    #[error("{0}")]
    Rejected(String),

    /// 5xx server failure
    #[error("Server error: {0}")]
    Server(String),

    /// Response did not match the expected shape
    #[error("Unexpected response: {0}")]
    Protocol(String),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: SessionUser,
}

/// Registration input
#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub creator_application: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    records: Vec<SubscriptionRecord>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Typed CineVault API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given base URL (e.g. "https://api.example.com")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with these options");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_transport(err: reqwest::Error) -> ClientError {
        if err.is_timeout() || err.is_connect() {
            ClientError::ProviderUnavailable
        } else {
            ClientError::Protocol(err.to_string())
        }
    }

    /// Converts a non-success response into the matching error
    async fn fail(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.to_string());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            ClientError::Unauthorized
        } else if status.is_client_error() {
            ClientError::Rejected(message)
        } else {
            ClientError::Server(message)
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))
    }

    /// Logs in; returns the session user and bearer token
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<(SessionUser, String), ClientError> {
        let response = self
            .http
            .post(self.url("/v1/auth/login"))
            .json(&LoginRequest {
                email,
                password,
                role,
            })
            .send()
            .await
            .map_err(Self::map_transport)?;

        let body: LoginResponse = Self::parse(response).await?;
        Ok((body.user, body.token))
    }

    /// Registers a new account
    pub async fn register(&self, input: &RegisterInput) -> Result<SessionUser, ClientError> {
        let response = self
            .http
            .post(self.url("/v1/auth/register"))
            .json(input)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let body: UserResponse = Self::parse(response).await?;
        Ok(body.user)
    }

    /// Best-effort remote logout; transport failures are swallowed
    pub async fn logout(&self, token: &str) {
        let result = self
            .http
            .post(self.url("/v1/auth/logout"))
            .bearer_auth(token)
            .send()
            .await;

        if let Err(err) = result {
            tracing::debug!(error = %err, "remote logout failed");
        }
    }

    /// Requests a password reset email; always acknowledged by the server
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/v1/auth/password-reset"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    /// Rebuilds the session view from a stored token
    pub async fn me(&self, token: &str) -> Result<SessionUser, ClientError> {
        let response = self
            .http
            .get(self.url("/v1/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let body: UserResponse = Self::parse(response).await?;
        Ok(body.user)
    }

    /// Purchases a subscription for the authenticated account
    pub async fn subscribe(&self, token: &str, plan: PlanType) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/v1/subscriptions"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "plan_type": plan }))
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    /// Cancels the authenticated account's subscription
    pub async fn cancel_subscription(&self, token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/v1/subscriptions/cancel"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    /// Subscription ledger history for the authenticated account
    pub async fn subscription_history(
        &self,
        token: &str,
    ) -> Result<Vec<SubscriptionRecord>, ClientError> {
        let response = self
            .http
            .get(self.url("/v1/subscriptions"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let body: HistoryResponse = Self::parse(response).await?;
        Ok(body.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://api.example.com/");
        assert_eq!(client.url("/health"), "https://api.example.com/health");
    }
}
