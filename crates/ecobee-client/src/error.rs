//! Error types for the ecobee client.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Each layer has its own enum so callers can tell "can't reach disk" ([`StoreError`])
//! apart from "ecobee said no" ([`AuthError::Vendor`]) apart from "can't reach ecobee"
//! ([`AuthError::Transport`]).

use std::path::PathBuf;

use crate::auth::AuthorizationErrorCode;

/// Errors from a token store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The backing file does not exist yet; the PIN workflow has not been run.
    #[error("token store {} is not initialized", path.display())]
    Uninitialized {
        /// Location of the missing store.
        path: PathBuf,
    },

    /// The backing file could not be read or written.
    #[error("token store {} I/O error: {source}", path.display())]
    Io {
        /// Location of the store.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a token record.
    #[error("token store {} is corrupt: {source}", path.display())]
    Corrupt {
        /// Location of the store.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized.
    #[error("failed to encode token record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    /// Build an I/O error, mapping "not found" to [`StoreError::Uninitialized`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::Uninitialized { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Returns true if the store simply has not been seeded yet.
    #[must_use]
    pub const fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized { .. })
    }
}

/// Errors from the credential lifecycle: PIN workflow and token refresh.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// A required setting is absent. Raised before any network call.
    #[error("missing configuration: {field}")]
    MissingConfig {
        /// Name of the missing setting.
        field: &'static str,
    },

    /// Network failure, timeout, or malformed HTTP exchange.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint rejected the grant with a recognised error body.
    #[error("unable to re-authenticate: {code}: {description}")]
    Vendor {
        /// Vendor error code, e.g. `invalid_grant`.
        code: AuthorizationErrorCode,
        /// Human-readable description from the vendor.
        description: String,
        /// Documentation link from the vendor.
        uri: String,
    },

    /// The token endpoint failed with a body that is not a recognisable error.
    #[error("unable to re-authenticate for unknown reasons (HTTP {status})")]
    Unrecognized {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A success response did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The token store failed.
    #[error("token store error: {0}")]
    Store(#[from] StoreError),

    /// The store holds no refresh token, so there is nothing to exchange.
    #[error("no refresh token stored; run the PIN workflow first")]
    NoRefreshToken,

    /// The stored access token cannot be sent as an HTTP header.
    #[error("stored access token is not a valid header value")]
    MalformedToken,

    /// `finalize` was called without a pending PIN challenge.
    #[error("no PIN challenge pending; request a PIN first")]
    NoChallenge,
}

impl AuthError {
    /// Create a missing-configuration error.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingConfig { field }
    }

    /// The vendor error code, if this is a vendor rejection.
    #[must_use]
    pub const fn vendor_code(&self) -> Option<&AuthorizationErrorCode> {
        match self {
            Self::Vendor { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns true if the credentials are dead and the PIN workflow must be rerun.
    #[must_use]
    pub const fn requires_reauthorization(&self) -> bool {
        if matches!(self, Self::NoRefreshToken) {
            return true;
        }
        matches!(
            self.vendor_code(),
            Some(
                AuthorizationErrorCode::InvalidGrant
                    | AuthorizationErrorCode::AuthorizationExpired
                    | AuthorizationErrorCode::AccessDenied
                    | AuthorizationErrorCode::AccountDisabled
                    | AuthorizationErrorCode::AccountLocked
            )
        )
    }

    /// Returns true if the user has not approved the PIN yet; retry later.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(
            self.vendor_code(),
            Some(AuthorizationErrorCode::AuthorizationPending | AuthorizationErrorCode::SlowDown)
        )
    }
}

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error not raised by the authorizing middleware
    #[error("Middleware error: {0}")]
    Middleware(anyhow::Error),

    /// Credentials could not be obtained or refreshed
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// The API rejected the bearer token (401 response)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Response body
        message: String,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },

    /// A 2xx response whose `status` object reports failure
    #[error("API error {code}: {message}")]
    Api {
        /// ecobee status code (non-zero)
        code: i64,
        /// Status message
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[source] serde_json::Error),

    /// Selection could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<reqwest_middleware::Error> for ClientError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => Self::Http(e),
            reqwest_middleware::Error::Middleware(e) => match e.downcast::<AuthError>() {
                Ok(auth) => Self::Auth(auth),
                Err(other) => Self::Middleware(other),
            },
        }
    }
}

impl ClientError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if a caller-side retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Auth(AuthError::Transport(e)) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The underlying authorization error, if any.
    #[must_use]
    pub const fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(code: AuthorizationErrorCode) -> AuthError {
        AuthError::Vendor { code, description: "desc".into(), uri: String::new() }
    }

    #[test]
    fn test_store_error_not_found_is_uninitialized() {
        let err = StoreError::io("/nope", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_uninitialized());

        let err =
            StoreError::io("/nope", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!err.is_uninitialized());
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn test_vendor_error_message_carries_code_and_description() {
        let err = AuthError::Vendor {
            code: AuthorizationErrorCode::InvalidGrant,
            description: "The refresh token has been revoked.".into(),
            uri: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid_grant"));
        assert!(msg.contains("The refresh token has been revoked."));
    }

    #[test]
    fn test_auth_error_classification() {
        assert!(vendor(AuthorizationErrorCode::InvalidGrant).requires_reauthorization());
        assert!(!vendor(AuthorizationErrorCode::InvalidGrant).is_pending());
        assert!(vendor(AuthorizationErrorCode::AuthorizationPending).is_pending());
        assert!(vendor(AuthorizationErrorCode::SlowDown).is_pending());
        assert!(!AuthError::NoChallenge.requires_reauthorization());
        assert!(AuthError::NoRefreshToken.requires_reauthorization());
        assert!(!AuthError::missing("app_id").is_pending());
    }

    #[test]
    fn test_middleware_error_downcasts_to_auth() {
        let err = reqwest_middleware::Error::Middleware(anyhow::Error::new(AuthError::NoChallenge));
        let client_err = ClientError::from(err);
        assert!(matches!(client_err.as_auth(), Some(AuthError::NoChallenge)));

        let err = reqwest_middleware::Error::Middleware(anyhow::anyhow!("something else"));
        assert!(matches!(ClientError::from(err), ClientError::Middleware(_)));
    }

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::server(500, "Internal error").is_retryable());
        assert!(!ClientError::not_found("thermostat").is_retryable());
        assert!(!ClientError::bad_request("bad selection").is_retryable());
        assert!(!ClientError::Auth(vendor(AuthorizationErrorCode::InvalidGrant)).is_retryable());
    }
}
