//! Client-credential authentication
//!
//! Acquires application tokens from the identity platform and caches them
//! until shortly before expiry.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{GraphError, Result};

pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before they expire
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Application credentials for the client-credential grant
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Caching token provider
pub struct TokenProvider {
    http: Client,
    credentials: ClientCredentials,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: Client, credentials: ClientCredentials, authority_url: &str) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority_url.trim_end_matches('/'),
            urlencoding::encode(&credentials.tenant_id)
        );
        Self {
            http,
            credentials,
            token_url,
            cached: Mutex::new(None),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Current bearer token, fetching a new one if needed
    pub async fn access_token(&self) -> Result<String> {
        // Held across the fetch so concurrent callers share one token request
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_DEFAULT_SCOPE),
            ("grant_type", "client_credentials"),
        ];

        debug!(tenant_id = %self.credentials.tenant_id, "Requesting Graph access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GraphError::Token(format!("{status}: {error_text}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Token(e.to_string()))?;

        Ok(CachedToken {
            refresh_at: refresh_deadline(Instant::now(), token.expires_in),
            access_token: token.access_token,
        })
    }
}

/// Without an `expires_in` the token is used for a single request only
fn refresh_deadline(now: Instant, expires_in: Option<u64>) -> Instant {
    match expires_in {
        Some(secs) => now + Duration::from_secs(secs).saturating_sub(EXPIRY_SKEW),
        None => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            tenant_id: "contoso-tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn test_token_url_uses_tenant() {
        let provider =
            TokenProvider::new(Client::new(), credentials(), "https://login.example.com/");
        assert_eq!(
            provider.token_url(),
            "https://login.example.com/contoso-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_refresh_deadline_applies_skew() {
        let now = Instant::now();
        assert_eq!(refresh_deadline(now, Some(3600)), now + Duration::from_secs(3540));
        // Lifetimes shorter than the skew refresh immediately
        assert_eq!(refresh_deadline(now, Some(30)), now);
        assert_eq!(refresh_deadline(now, None), now);
    }
}
