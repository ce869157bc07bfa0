//! Authorizing middleware.
//!
//! Sits at the end of the client's middleware chain. Before each request it makes sure the
//! store holds a usable access token, refreshing it through the token endpoint when it is
//! missing or about to expire, then attaches it as a bearer header.

use std::sync::Arc;
use std::time::Duration;

use http::Extensions;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use tokio::sync::Mutex;

use super::exchange::TokenExchange;
use super::store::{TokenStore, signed};
use crate::config::api;
use crate::error::{AuthError, AuthResult};

/// Middleware that injects `Authorization: Bearer <token>` and refreshes expired tokens.
pub struct AuthorizingMiddleware {
    store: Arc<dyn TokenStore>,
    exchange: TokenExchange,
    reauth_threshold: chrono::Duration,
    /// Serializes the refresh decision so concurrent callers trigger one exchange.
    reauth_lock: Mutex<()>,
}

impl AuthorizingMiddleware {
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, exchange: TokenExchange) -> Self {
        Self {
            store,
            exchange,
            reauth_threshold: signed(api::REAUTH_THRESHOLD),
            reauth_lock: Mutex::new(()),
        }
    }

    /// Refresh when fewer than `threshold` remain on the access token.
    #[must_use]
    pub fn with_reauth_threshold(mut self, threshold: Duration) -> Self {
        self.reauth_threshold = signed(threshold);
        self
    }

    /// The store this middleware reads and refreshes.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Whether the stored token is missing or too close to expiry. Never touches the network.
    pub async fn should_reauthenticate(&self) -> AuthResult<bool> {
        let access_token = self.store.access_token().await?;
        let valid_for = self.store.valid_for().await?;
        Ok(needs_reauthentication(&access_token, valid_for, self.reauth_threshold))
    }

    /// A bearer token that is valid for at least the reauthentication threshold,
    /// refreshing it first if necessary.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read, or the exchange's error if the
    /// refresh grant is rejected. The store is left untouched on a failed refresh.
    pub async fn valid_access_token(&self) -> AuthResult<String> {
        if !self.should_reauthenticate().await? {
            return Ok(self.store.access_token().await?);
        }

        let _guard = self.reauth_lock.lock().await;
        if self.should_reauthenticate().await? {
            self.reauthenticate().await?;
        } else {
            tracing::debug!("Access token already refreshed by a concurrent request");
        }
        Ok(self.store.access_token().await?)
    }

    async fn reauthenticate(&self) -> AuthResult<()> {
        let refresh_token = self.store.refresh_token().await?;
        tracing::debug!(threshold = %self.reauth_threshold, "Access token expiring, refreshing");

        let response = self.exchange.refresh(&refresh_token).await?;
        self.store.update(&response).await?;

        tracing::info!(expires_in = %response.expires_in, "Refreshed access token");
        Ok(())
    }
}

/// `true` when `access_token` is empty or has less than `threshold` left.
#[must_use]
pub fn needs_reauthentication(
    access_token: &str,
    valid_for: chrono::Duration,
    threshold: chrono::Duration,
) -> bool {
    access_token.is_empty() || valid_for < threshold
}

fn bearer(token: &str) -> AuthResult<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| AuthError::MalformedToken)?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait::async_trait]
impl Middleware for AuthorizingMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let header = self
            .valid_access_token()
            .await
            .and_then(|token| bearer(&token))
            .map_err(|e| reqwest_middleware::Error::Middleware(anyhow::Error::new(e)))?;

        req.headers_mut().insert(AUTHORIZATION, header);
        next.run(req, extensions).await
    }
}

impl std::fmt::Debug for AuthorizingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizingMiddleware")
            .field("exchange", &self.exchange)
            .field("reauth_threshold", &self.reauth_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenDuration;
    use crate::auth::store::MemoryStore;
    use crate::auth::types::TokenRefreshResponse;

    fn threshold() -> chrono::Duration {
        chrono::Duration::seconds(15)
    }

    fn unreachable_exchange() -> TokenExchange {
        TokenExchange::new(reqwest::Client::new(), "http://127.0.0.1:9", "app")
    }

    #[test]
    fn test_reauthentication_truth_table() {
        assert!(needs_reauthentication("x", chrono::Duration::seconds(10), threshold()));
        assert!(!needs_reauthentication("x", chrono::Duration::seconds(30), threshold()));
        assert!(needs_reauthentication("", chrono::Duration::seconds(3600), threshold()));
        assert!(needs_reauthentication("x", chrono::Duration::seconds(-5), threshold()));
        assert!(!needs_reauthentication("x", chrono::Duration::seconds(15), threshold()));
    }

    #[tokio::test]
    async fn test_fresh_token_is_returned_without_exchange() {
        let store = MemoryStore::new(&TokenRefreshResponse {
            access_token: "fresh".into(),
            refresh_token: "r".into(),
            expires_in: TokenDuration::from_secs(3600),
            ..Default::default()
        });
        let middleware = AuthorizingMiddleware::new(Arc::new(store), unreachable_exchange());

        assert!(!middleware.should_reauthenticate().await.unwrap());
        assert_eq!(middleware.valid_access_token().await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_empty_store_fails_without_exchange() {
        let middleware =
            AuthorizingMiddleware::new(Arc::new(MemoryStore::empty()), unreachable_exchange());

        assert!(middleware.should_reauthenticate().await.unwrap());
        let err = middleware.valid_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::NoRefreshToken));
    }

    #[test]
    fn test_bearer_header_is_sensitive() {
        let value = bearer("abc").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
        assert!(bearer("bad\ntoken").is_err());
    }
}
