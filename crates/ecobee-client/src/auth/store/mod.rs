//! Token storage.
//!
//! A [`TokenStore`] holds exactly one [`TokenRecord`]. The authorizing middleware and the
//! PIN workflow only ever talk to the trait, so persistence strategy is invisible to them:
//!
//! - [`MemoryStore`]: process-local, lost on exit.
//! - [`PersistentStore`]: a single JSON record on disk, re-read on every access so that
//!   another process refreshing the same file is observed.

mod memory;
mod persistent;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

use super::types::TokenRefreshResponse;

pub use memory::MemoryStore;
pub use persistent::PersistentStore;

/// Default safety margin subtracted from the server-declared lifetime.
pub const DEFAULT_EXPIRY_MARGIN: Duration = crate::config::api::EXPIRY_MARGIN;

/// Capability set shared by all token backends.
///
/// All methods are safe to call concurrently. Reads never observe a half-applied update.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// The current access token; empty if none has been issued. Never touches the network.
    async fn access_token(&self) -> StoreResult<String>;

    /// The current refresh token.
    async fn refresh_token(&self) -> StoreResult<String>;

    /// Time left until the access token must be treated as expired. Zero or negative
    /// means expired.
    async fn valid_for(&self) -> StoreResult<chrono::Duration>;

    /// Replace the stored record with the contents of a token response.
    async fn update(&self, response: &TokenRefreshResponse) -> StoreResult<()>;
}

/// The three fields that make up a credential, always read and written together.
///
/// This is also the on-disk format of [`PersistentStore`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    pub valid_until: DateTime<Utc>,
}

impl TokenRecord {
    /// A record with no credentials, already expired.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            access_token: String::new(),
            refresh_token: String::new(),
            valid_until: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Build the record that replaces `previous` after `response` arrived at `now`.
    ///
    /// `valid_until` is `now + expires_in - margin`. The previous refresh token is kept
    /// when the response does not carry a new one.
    #[must_use]
    pub fn from_response(
        response: &TokenRefreshResponse,
        previous: Option<&Self>,
        now: DateTime<Utc>,
        margin: Duration,
    ) -> Self {
        let refresh_token = if response.refresh_token.is_empty() {
            previous.map(|p| p.refresh_token.clone()).unwrap_or_default()
        } else {
            response.refresh_token.clone()
        };

        let lifetime = signed(response.expires_in.as_duration()) - signed(margin);
        Self {
            access_token: response.access_token.clone(),
            refresh_token,
            valid_until: now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// `valid_until - now`.
    #[must_use]
    pub fn valid_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.valid_until - now
    }
}

impl Default for TokenRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("has_access_token", &!self.access_token.is_empty())
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

/// Convert a std duration to a signed chrono duration, saturating well below overflow.
pub(crate) fn signed(d: Duration) -> chrono::Duration {
    // Clamp to a millennium; `chrono::Duration::MAX` itself would overflow subtraction.
    let max = chrono::Duration::days(365 * 1000);
    chrono::Duration::from_std(d).ok().filter(|d| *d <= max).unwrap_or(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenDuration;

    fn response(access: &str, refresh: &str, secs: u64) -> TokenRefreshResponse {
        TokenRefreshResponse {
            access_token: access.into(),
            refresh_token: refresh.into(),
            expires_in: TokenDuration::from_secs(secs),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_until_subtracts_margin() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let record =
            TokenRecord::from_response(&response("a", "r", 3600), None, now, DEFAULT_EXPIRY_MARGIN);
        assert_eq!(record.valid_for(now), chrono::Duration::seconds(3585));
    }

    #[test]
    fn test_refresh_token_preserved_when_not_rotated() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let first =
            TokenRecord::from_response(&response("a1", "r1", 3600), None, now, Duration::ZERO);
        let second = TokenRecord::from_response(
            &response("a2", "", 3600),
            Some(&first),
            now,
            Duration::ZERO,
        );
        assert_eq!(second.access_token, "a2");
        assert_eq!(second.refresh_token, "r1");

        let third = TokenRecord::from_response(
            &response("a3", "r3", 3600),
            Some(&second),
            now,
            Duration::ZERO,
        );
        assert_eq!(third.refresh_token, "r3");
    }

    #[test]
    fn test_record_file_format() {
        let record = TokenRecord {
            access_token: "a".into(),
            refresh_token: "r".into(),
            valid_until: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        let valid_until = json["validUntil"].as_str().unwrap();
        assert!(valid_until.starts_with("2023-11-14T22:13:20"));
        assert_eq!(DateTime::parse_from_rfc3339(valid_until).unwrap(), record.valid_until);
    }

    #[test]
    fn test_empty_record_is_expired() {
        assert!(TokenRecord::empty().valid_for(Utc::now()) < chrono::Duration::zero());
    }
}
