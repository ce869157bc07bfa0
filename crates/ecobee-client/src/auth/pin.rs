//! PIN authorization workflow.
//!
//! The user is shown a short PIN, enters it in the ecobee portal, and the application then
//! redeems the matching authorization code for its first token pair:
//!
//! ```text
//! Uninitialized --request_pin--> PinRequested --finalize--> Finalized
//!                                     ^                          |
//!                                     +-------request_pin--------+
//! ```

use std::time::Duration;

use super::exchange::{TokenExchange, classify_failure};
use super::store::TokenStore;
use super::types::{PinAuthenticationChallenge, Scope};
use crate::config::api;
use crate::error::{AuthError, AuthResult};

/// Where the workflow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// No PIN requested yet.
    Uninitialized,
    /// A PIN has been issued and is waiting for approval.
    PinRequested,
    /// The authorization code was exchanged successfully.
    Finalized,
}

/// Drives the PIN workflow for one application.
#[derive(Debug)]
pub struct PinAuthenticator {
    exchange: TokenExchange,
    authorize_url: String,
    scope: Scope,
    challenge: Option<PinAuthenticationChallenge>,
    state: PinState,
}

impl PinAuthenticator {
    #[must_use]
    pub fn new(http: reqwest::Client, api_base_url: &str, app_id: impl Into<String>) -> Self {
        Self {
            exchange: TokenExchange::new(http, api_base_url, app_id),
            authorize_url: format!("{}/authorize", api_base_url.trim_end_matches('/')),
            scope: Scope::SmartWrite,
            challenge: None,
            state: PinState::Uninitialized,
        }
    }

    /// Request a different scope than the default `smartWrite`.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub const fn state(&self) -> PinState {
        self.state
    }

    /// The PIN of the pending challenge, if any.
    #[must_use]
    pub fn pin(&self) -> Option<&str> {
        self.challenge.as_ref().map(|c| c.pin.as_str())
    }

    /// The pending challenge, if any.
    #[must_use]
    pub const fn challenge(&self) -> Option<&PinAuthenticationChallenge> {
        self.challenge.as_ref()
    }

    /// How long to wait before retrying [`finalize`](Self::finalize) after a pending
    /// rejection: the interval suggested by the challenge, or [`api::PIN_POLL_INTERVAL`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.challenge
            .as_ref()
            .and_then(|c| c.interval)
            .map_or(api::PIN_POLL_INTERVAL, Duration::from_secs)
            .max(Duration::from_secs(1))
    }

    /// Ask ecobee for a new PIN and remember the challenge. Any unfinalized challenge is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::MissingConfig`] before any network call if no application id
    /// is configured, [`AuthError::Transport`] if the call fails, [`AuthError::Vendor`] if
    /// ecobee answers with an error body, or [`AuthError::Decode`] if the body is not a
    /// challenge.
    pub async fn request_pin(&mut self) -> AuthResult<String> {
        if self.exchange.app_id().is_empty() {
            return Err(AuthError::missing("app_id"));
        }

        tracing::debug!(url = %self.authorize_url, scope = %self.scope, "Requesting PIN");
        let response = self
            .exchange
            .http()
            .get(&self.authorize_url)
            .query(&[
                ("response_type", "ecobeePin"),
                ("scope", self.scope.as_str()),
                ("client_id", self.exchange.app_id()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let challenge: PinAuthenticationChallenge = serde_json::from_str(&body)?;
        let pin = challenge.pin.clone();
        tracing::info!(scope = %challenge.scope, "PIN issued, awaiting approval");

        self.challenge = Some(challenge);
        self.state = PinState::PinRequested;
        Ok(pin)
    }

    /// Redeem the pending challenge and seed `store` with the resulting token pair.
    ///
    /// The challenge is consumed by the exchange. The one exception is a pending
    /// rejection (`authorization_pending` or `slow_down`): the user has not approved the
    /// PIN yet, so the challenge is kept and `finalize` may be retried after a delay. A
    /// second call after success fails locally with [`AuthError::NoChallenge`].
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::NoChallenge`] without any network call if no challenge is
    /// pending. A vendor rejection is returned as [`AuthError::Vendor`]. If the store
    /// cannot be written, the redeemed code is spent and the workflow must start over.
    pub async fn finalize(&mut self, store: &dyn TokenStore) -> AuthResult<()> {
        let challenge = match self.challenge.take() {
            Some(c) if !c.authorization_code.is_empty() => c,
            Some(_) => {
                self.state = PinState::Uninitialized;
                return Err(AuthError::NoChallenge);
            }
            None => return Err(AuthError::NoChallenge),
        };

        let response = match self.exchange.redeem_pin(&challenge.authorization_code).await {
            Ok(response) => response,
            Err(e) if e.is_pending() => {
                tracing::debug!(code = ?e.vendor_code(), "PIN not approved yet");
                self.challenge = Some(challenge);
                return Err(e);
            }
            Err(e) => {
                self.state = PinState::Uninitialized;
                return Err(e);
            }
        };
        if let Err(e) = store.update(&response).await {
            tracing::warn!(error = %e, "Redeemed PIN but could not store the token pair");
            self.state = PinState::Uninitialized;
            return Err(e.into());
        }

        self.state = PinState::Finalized;
        tracing::info!(scope = %response.scope, "PIN authorization complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;

    fn authenticator(app_id: &str) -> PinAuthenticator {
        PinAuthenticator::new(reqwest::Client::new(), "http://127.0.0.1:9/", app_id)
    }

    #[test]
    fn test_initial_state() {
        let auth = authenticator("app");
        assert_eq!(auth.state(), PinState::Uninitialized);
        assert!(auth.pin().is_none());
        assert_eq!(auth.authorize_url, "http://127.0.0.1:9/authorize");
    }

    #[tokio::test]
    async fn test_finalize_without_challenge() {
        let mut auth = authenticator("app");
        let store = MemoryStore::empty();

        let err = auth.finalize(&store).await.unwrap_err();
        assert!(matches!(err, AuthError::NoChallenge));
        assert_eq!(auth.state(), PinState::Uninitialized);
    }

    fn challenge(code: &str, interval: Option<u64>) -> PinAuthenticationChallenge {
        PinAuthenticationChallenge {
            pin: "ABCD-1234".into(),
            authorization_code: code.into(),
            scope: Scope::SmartWrite,
            expires_in: None,
            interval,
        }
    }

    #[tokio::test]
    async fn test_finalize_with_empty_code() {
        let mut auth = authenticator("app");
        auth.challenge = Some(challenge("", None));
        auth.state = PinState::PinRequested;

        let err = auth.finalize(&MemoryStore::empty()).await.unwrap_err();
        assert!(matches!(err, AuthError::NoChallenge));
        assert_eq!(auth.state(), PinState::Uninitialized);
        assert!(auth.pin().is_none());
    }

    #[test]
    fn test_poll_interval() {
        let mut auth = authenticator("app");
        assert_eq!(auth.poll_interval(), api::PIN_POLL_INTERVAL);

        auth.challenge = Some(challenge("code", Some(5)));
        assert_eq!(auth.poll_interval(), Duration::from_secs(5));

        auth.challenge = Some(challenge("code", Some(0)));
        assert_eq!(auth.poll_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_request_pin_requires_app_id() {
        let mut auth = authenticator("");
        let err = auth.request_pin().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingConfig { field: "app_id" }));
    }
}
