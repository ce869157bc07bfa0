//! Wire types for the ecobee authorization and token endpoints.
//!
//! See <https://www.ecobee.com/home/developer/api/documentation/v1/auth/auth-intro.shtml>.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::duration::TokenDuration;

/// Permission scope of a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    /// Read-only access to thermostats.
    SmartRead,
    /// Read and write access to thermostats.
    #[default]
    SmartWrite,
    /// Energy-management-system access.
    Ems,
    /// A scope this crate does not know about.
    Other(String),
}

impl Scope {
    /// The wire name of the scope.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SmartRead => "smartRead",
            Self::SmartWrite => "smartWrite",
            Self::Ems => "ems",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        match s.as_str() {
            "smartRead" => Self::SmartRead,
            "smartWrite" => Self::SmartWrite,
            "ems" => Self::Ems,
            _ => Self::Other(s),
        }
    }
}

impl From<Scope> for String {
    fn from(s: Scope) -> Self {
        match s {
            Scope::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error codes returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthorizationErrorCode {
    AccessDenied,
    InvalidRequest,
    InvalidClient,
    /// The refresh token or authorization code was revoked, expired or already used.
    InvalidGrant,
    UnauthorizedClient,
    UnsupportedGrantType,
    InvalidScope,
    NotSupported,
    AccountLocked,
    AccountDisabled,
    /// The user has not yet approved the PIN.
    AuthorizationPending,
    /// The PIN expired before the user approved it.
    AuthorizationExpired,
    /// Polling too fast.
    SlowDown,
    /// A code this crate does not know about (including the empty string).
    Other(String),
}

impl AuthorizationErrorCode {
    /// The wire name of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::NotSupported => "not_supported",
            Self::AccountLocked => "account_locked",
            Self::AccountDisabled => "account_disabled",
            Self::AuthorizationPending => "authorization_pending",
            Self::AuthorizationExpired => "authorization_expired",
            Self::SlowDown => "slow_down",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AuthorizationErrorCode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "access_denied" => Self::AccessDenied,
            "invalid_request" => Self::InvalidRequest,
            "invalid_client" => Self::InvalidClient,
            "invalid_grant" => Self::InvalidGrant,
            "unauthorized_client" => Self::UnauthorizedClient,
            "unsupported_grant_type" => Self::UnsupportedGrantType,
            "invalid_scope" => Self::InvalidScope,
            "not_supported" => Self::NotSupported,
            "account_locked" => Self::AccountLocked,
            "account_disabled" => Self::AccountDisabled,
            "authorization_pending" => Self::AuthorizationPending,
            "authorization_expired" => Self::AuthorizationExpired,
            "slow_down" => Self::SlowDown,
            _ => Self::Other(s),
        }
    }
}

impl From<AuthorizationErrorCode> for String {
    fn from(c: AuthorizationErrorCode) -> Self {
        match c {
            AuthorizationErrorCode::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AuthorizationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationErrorResponse {
    /// Machine-readable error code.
    pub error: AuthorizationErrorCode,

    /// Human-readable description.
    #[serde(rename = "error_description", default)]
    pub description: String,

    /// Link to documentation for the error.
    #[serde(rename = "error_uri", default)]
    pub uri: String,
}

impl AuthorizationErrorResponse {
    /// Whether the body carries enough to be reported as a vendor error.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        !self.error.as_str().is_empty()
    }
}

/// Success body returned by the token endpoint, for both the PIN grant and
/// the refresh grant.
///
/// See <https://www.ecobee.com/home/developer/api/documentation/v1/auth/token-refresh.shtml>.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    pub expires_in: TokenDuration,

    /// Empty when the server did not rotate the refresh token.
    #[serde(default)]
    pub refresh_token: String,

    #[serde(default)]
    pub scope: Scope,
}

impl fmt::Debug for TokenRefreshResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefreshResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("scope", &self.scope)
            .finish()
    }
}

/// First response of the PIN workflow.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAuthenticationChallenge {
    /// Code shown to the user, who enters it in the ecobee portal.
    #[serde(rename = "ecobeePin")]
    pub pin: String,

    /// One-time code redeemed once the user approved the PIN.
    #[serde(rename = "code")]
    pub authorization_code: String,

    pub scope: Scope,

    /// Minutes until the PIN expires. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Suggested polling interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
}

impl fmt::Debug for PinAuthenticationChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinAuthenticationChallenge")
            .field("pin", &self.pin)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
