//! Token endpoint calls shared by the PIN workflow and the authorizing middleware.

use reqwest::StatusCode;

use super::types::{AuthorizationErrorResponse, TokenRefreshResponse};
use crate::error::{AuthError, AuthResult};

/// Grant type for redeeming an approved PIN.
const GRANT_PIN: &str = "ecobeePin";
/// Grant type for renewing an access token.
const GRANT_REFRESH: &str = "refresh_token";

/// Client for the `/token` endpoint.
///
/// Uses a plain `reqwest::Client`, never the decorated one, so an exchange can't recurse
/// into reauthentication.
#[derive(Clone)]
pub struct TokenExchange {
    http: reqwest::Client,
    token_url: String,
    app_id: String,
}

impl TokenExchange {
    #[must_use]
    pub fn new(http: reqwest::Client, api_base_url: &str, app_id: impl Into<String>) -> Self {
        Self {
            http,
            token_url: format!("{}/token", api_base_url.trim_end_matches('/')),
            app_id: app_id.into(),
        }
    }

    /// Registered application id (client id).
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The undecorated HTTP client used for authorization calls.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// Parameters go in the query string with an empty body, as the API expects.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenRefreshResponse> {
        self.require_app_id()?;
        if refresh_token.is_empty() {
            return Err(AuthError::NoRefreshToken);
        }

        tracing::debug!(url = %self.token_url, "Requesting token refresh");
        let response = self
            .http
            .post(&self.token_url)
            .query(&[
                ("grant_type", GRANT_REFRESH),
                ("refresh_token", refresh_token),
                ("client_id", self.app_id.as_str()),
            ])
            .send()
            .await?;

        decode_grant_response(response).await
    }

    /// Redeem the authorization code of an approved PIN for the first token pair.
    pub async fn redeem_pin(&self, authorization_code: &str) -> AuthResult<TokenRefreshResponse> {
        self.require_app_id()?;

        tracing::debug!(url = %self.token_url, "Redeeming PIN authorization code");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", GRANT_PIN),
                ("code", authorization_code),
                ("client_id", self.app_id.as_str()),
            ])
            .send()
            .await?;

        decode_grant_response(response).await
    }

    fn require_app_id(&self) -> AuthResult<()> {
        if self.app_id.is_empty() { Err(AuthError::missing("app_id")) } else { Ok(()) }
    }
}

impl std::fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchange").field("token_url", &self.token_url).finish_non_exhaustive()
    }
}

/// Interpret a token endpoint response: a 2xx must hold a token pair, anything else
/// should hold a vendor error body.
pub(crate) async fn decode_grant_response(
    response: reqwest::Response,
) -> AuthResult<TokenRefreshResponse> {
    let status = response.status();
    let body = response.text().await?;
    decode_grant_body(status, &body)
}

pub(crate) fn decode_grant_body(
    status: StatusCode,
    body: &str,
) -> AuthResult<TokenRefreshResponse> {
    if status.is_success() {
        return Ok(serde_json::from_str(body)?);
    }
    Err(classify_failure(status, body))
}

/// Turn a non-2xx response into the most specific error its body allows.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<AuthorizationErrorResponse>(body) {
        Ok(err) if err.is_classified() => {
            tracing::warn!(
                status = status.as_u16(),
                code = %err.error,
                "Token endpoint rejected grant"
            );
            AuthError::Vendor { code: err.error, description: err.description, uri: err.uri }
        }
        _ => {
            tracing::warn!(
                status = status.as_u16(),
                "Token endpoint failed with unrecognised body"
            );
            AuthError::Unrecognized { status: status.as_u16(), body: body.to_string() }
        }
    }
}
