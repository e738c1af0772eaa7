//! Public configuration for the GOG client.

use std::time::Duration;

/// OAuth client id of the GOG Galaxy desktop client.
pub(crate) const GALAXY_CLIENT_ID: &str = "46899977096215655";
/// OAuth client secret of the GOG Galaxy desktop client.
pub(crate) const GALAXY_CLIENT_SECRET: &str =
    "9d85c43b1482497dbbce61f6e4aa173a433796eeae2ca8c5f6129f2dc4de46d9";

/// Configuration for [`GogClient`](crate::GogClient).
///
/// # Example
///
/// ```
/// use gogbackup_gog::GogClientConfig;
/// use std::time::Duration;
///
/// let config = GogClientConfig::new("refresh-token")
///     .with_request_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Clone)]
pub struct GogClientConfig {
    /// Base URL of the auth service
    pub(crate) auth_url: String,
    /// Base URL of the embed API, also used to resolve relative download URLs
    pub(crate) embed_url: String,
    /// Long-lived refresh token
    pub(crate) refresh_token: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Connect timeout, applied to every request including downloads
    pub(crate) connect_timeout: Duration,
    /// Whole-request timeout for JSON calls (not downloads)
    pub(crate) request_timeout: Duration,
    /// Renew the access token when it has this much or less left
    pub(crate) refresh_margin: Duration,
}

impl std::fmt::Debug for GogClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GogClientConfig")
            .field("auth_url", &self.auth_url)
            .field("embed_url", &self.embed_url)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl GogClientConfig {
    /// Create a configuration with default endpoints for `refresh_token`.
    #[must_use]
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            auth_url: "https://auth.gog.com".to_string(),
            embed_url: "https://embed.gog.com".to_string(),
            refresh_token: refresh_token.into(),
            client_id: GALAXY_CLIENT_ID.to_string(),
            client_secret: GALAXY_CLIENT_SECRET.to_string(),
            user_agent: concat!("gog-backup/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            refresh_margin: Duration::from_secs(60),
        }
    }

    /// Set the auth service base URL.
    ///
    /// Defaults to `https://auth.gog.com`.
    #[must_use]
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the embed API base URL.
    ///
    /// Defaults to `https://embed.gog.com`.
    #[must_use]
    pub fn with_embed_url(mut self, url: impl Into<String>) -> Self {
        self.embed_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the user agent string for HTTP requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout for JSON requests.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how early before expiry the access token is renewed.
    ///
    /// Defaults to 60 seconds.
    #[must_use]
    pub const fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }
}
