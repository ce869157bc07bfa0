//! Configuration for the ecobee client.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::PersistentStore;
use crate::error::{AuthError, AuthResult};

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the ecobee API. Authorization, token and data endpoints hang off it.
    pub const BASE_URL: &str = "https://api.ecobee.com";

    /// Data API version prefix.
    pub const DATA_VERSION: &str = "1";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Refresh the access token when less than this remains.
    pub const REAUTH_THRESHOLD: Duration = Duration::from_secs(15);

    /// Subtracted from the server-declared token lifetime.
    pub const EXPIRY_MARGIN: Duration = Duration::from_secs(15);

    /// Caller-side retries for data requests. The auth layer never retries.
    pub const MAX_RETRIES: u32 = 0;

    /// Wait between PIN redemption attempts when the challenge suggests no interval.
    pub const PIN_POLL_INTERVAL: Duration = Duration::from_secs(30);
}

/// Environment variable names.
pub mod env {
    pub const APP_ID: &str = "ECOBEE_APP_ID";
    pub const API_URL: &str = "ECOBEE_API_URL";
    pub const STORE_PATH: &str = "ECOBEE_STORE_PATH";
    pub const MAX_RETRIES: &str = "ECOBEE_MAX_RETRIES";
}

/// Client configuration.
#[derive(Clone)]
pub struct Config {
    /// Application id (client id) registered with ecobee.
    pub app_id: String,

    /// Base URL for every endpoint (overridden in tests with a mock server).
    pub api_url: String,

    /// Location of the durable token store, if one is used.
    pub store_path: Option<PathBuf>,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Refresh when less than this remains on the access token.
    pub reauth_threshold: Duration,

    /// Subtracted from server-declared token lifetimes by stores opened with
    /// [`Config::open_store`]. Stores built directly keep their own margin.
    pub expiry_margin: Duration,

    /// Retries for transient data-request failures.
    pub max_retries: u32,
}

impl Config {
    /// Create a configuration for `app_id` with production defaults.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_url: api::BASE_URL.to_string(),
            store_path: None,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            reauth_threshold: api::REAUTH_THRESHOLD,
            expiry_margin: api::EXPIRY_MARGIN,
            max_retries: api::MAX_RETRIES,
        }
    }

    /// Create a test configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            app_id: "test-app".to_string(),
            api_url: base_url.trim_end_matches('/').to_string(),
            store_path: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            reauth_threshold: api::REAUTH_THRESHOLD,
            expiry_margin: api::EXPIRY_MARGIN,
            max_retries: 0, // Failures must surface in tests
        }
    }

    /// Create configuration from environment variables, after loading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns error if `ECOBEE_API_URL` is not a URL or `ECOBEE_MAX_RETRIES` is not a number.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::new(std::env::var(env::APP_ID).unwrap_or_default());
        if let Ok(raw) = std::env::var(env::API_URL) {
            let url = url::Url::parse(&raw)
                .map_err(|e| anyhow::anyhow!("invalid {}={raw:?}: {e}", env::API_URL))?;
            config.api_url = url.as_str().trim_end_matches('/').to_string();
        }
        config.store_path =
            std::env::var_os(env::STORE_PATH).filter(|p| !p.is_empty()).map(PathBuf::from);
        if let Ok(retries) = std::env::var(env::MAX_RETRIES) {
            config.max_retries = retries
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {}={retries:?}: {e}", env::MAX_RETRIES))?;
        }
        Ok(config)
    }

    /// Use a durable token store at `path`.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// The application id, or an error if none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfig`] if the id is empty.
    pub fn require_app_id(&self) -> AuthResult<&str> {
        if self.app_id.is_empty() { Err(AuthError::missing("app_id")) } else { Ok(&self.app_id) }
    }

    /// The durable store path, or an error if none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfig`] if no path is set.
    pub fn require_store_path(&self) -> AuthResult<&std::path::Path> {
        match &self.store_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(AuthError::missing("store_path")),
        }
    }

    /// Open the durable store at `store_path` with this configuration's expiry margin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfig`] if no path is set.
    pub fn open_store(&self) -> AuthResult<PersistentStore> {
        let store = PersistentStore::open(self.require_store_path()?)?;
        Ok(store.with_margin(self.expiry_margin))
    }

    /// Check if an application id is configured.
    #[must_use]
    pub fn has_app_id(&self) -> bool {
        !self.app_id.is_empty()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("has_app_id", &self.has_app_id())
            .field("api_url", &self.api_url)
            .field("store_path", &self.store_path)
            .field("request_timeout", &self.request_timeout)
            .field("reauth_threshold", &self.reauth_threshold)
            .field("expiry_margin", &self.expiry_margin)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
