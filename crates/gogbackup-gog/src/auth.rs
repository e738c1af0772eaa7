//! Access token cache with refresh-token renewal.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::config::GogClientConfig;
use crate::error::{GogError, GogResult};
use crate::wire::TokenResponse;

struct TokenState {
    refresh_token: String,
    access_token: Option<String>,
    expires_at: Instant,
}

/// Holds the current access token and renews it on demand.
///
/// Every caller goes through one async mutex, so concurrent workers that find
/// the token stale trigger a single renewal between them.
pub struct TokenCache {
    state: Mutex<TokenState>,
    token_url: Url,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("token_url", &self.token_url.as_str())
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(config: &GogClientConfig) -> GogResult<Self> {
        let token_url = Url::parse(&format!("{}/token", config.auth_url))?;
        Ok(Self {
            state: Mutex::new(TokenState {
                refresh_token: config.refresh_token.clone(),
                access_token: None,
                expires_at: Instant::now(),
            }),
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_margin: config.refresh_margin,
        })
    }

    /// Return a valid access token, renewing it first if it is missing or
    /// has `refresh_margin` or less left.
    pub async fn access_token(&self, http: &reqwest::Client) -> GogResult<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = &state.access_token {
            if state.expires_at.saturating_duration_since(Instant::now()) > self.refresh_margin {
                return Ok(token.clone());
            }
        }

        tracing::info!("Renewing GOG access token");
        let response = self.request(http, &state.refresh_token).await?;

        state.expires_at = Instant::now() + Duration::from_secs(response.expires_in);
        if let Some(rotated) = response.refresh_token.filter(|t| !t.is_empty()) {
            state.refresh_token = rotated;
        }
        state.access_token = Some(response.access_token.clone());
        Ok(response.access_token)
    }

    async fn request(
        &self,
        http: &reqwest::Client,
        refresh_token: &str,
    ) -> GogResult<TokenResponse> {
        let mut url = self.token_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", refresh_token);

        let response = http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(GogError::TokenRefresh {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url_is_built_from_auth_url() {
        let config = GogClientConfig::new("r").with_auth_url("http://localhost:1234/");
        let cache = TokenCache::new(&config).unwrap();
        assert_eq!(cache.token_url.as_str(), "http://localhost:1234/token");
    }

    #[test]
    fn test_invalid_auth_url_is_rejected() {
        let config = GogClientConfig::new("r").with_auth_url("not a url");
        assert!(matches!(
            TokenCache::new(&config),
            Err(GogError::InvalidUrl(_))
        ));
    }
}
