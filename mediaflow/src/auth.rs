//! Bearer credential acquisition.
//!
//! A service principal (tenant + client id + secret) is exchanged for a
//! bearer token at the identity provider's token endpoint. A rejected
//! principal is a configuration problem, so failures here are fatal and
//! never retried by this layer.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Issues the bearer token attached to every management API call.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 client-credentials flow against the identity provider.
///
/// The token is cached and re-requested shortly before expiry.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    audience: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ClientCredentials {
    /// Build a provider for one service principal.
    ///
    /// `token_endpoint` is the identity provider base URL; the tenant's
    /// token route is derived from it.
    pub fn new(
        token_endpoint: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self> {
        let mut token_url = Url::parse(token_endpoint)?;
        token_url
            .path_segments_mut()
            .map_err(|_| OrchestratorError::Config("token endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "token"]);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            audience: audience.into(),
            cached: RwLock::new(None),
        })
    }

    async fn request_token(&self) -> Result<CachedToken> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("resource", self.audience.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OrchestratorError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Auth(format!(
                "identity provider rejected the service principal ({status}): {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OrchestratorError::Auth(format!("malformed token response: {e}")))?;

        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);
        Ok(CachedToken {
            token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime),
        })
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .finish()
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn bearer_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if Utc::now() < token.expires_at {
                    return Ok(token.token.clone());
                }
            }
        }

        tracing::debug!(url = %self.token_url, client_id = %self.client_id, "requesting bearer token");
        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *self.cached.write().await = Some(fresh);
        Ok(token)
    }
}

/// Fixed token, for tests and pre-issued credentials.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
