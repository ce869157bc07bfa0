//! Volatile token store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::{DEFAULT_EXPIRY_MARGIN, TokenRecord, TokenStore};
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::types::TokenRefreshResponse;
use crate::error::StoreResult;

/// Token store backed only by memory.
pub struct MemoryStore {
    record: RwLock<TokenRecord>,
    clock: Arc<dyn Clock>,
    margin: Duration,
}

impl MemoryStore {
    /// A store seeded from a token response.
    #[must_use]
    pub fn new(response: &TokenRefreshResponse) -> Self {
        let store = Self::empty();
        let record = TokenRecord::from_response(response, None, store.clock.now(), store.margin);
        Self { record: RwLock::new(record), ..store }
    }

    /// A store holding no credentials. The first request through the authorizing
    /// middleware will attempt a refresh and fail until the store is seeded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            record: RwLock::new(TokenRecord::empty()),
            clock: Arc::new(SystemClock),
            margin: DEFAULT_EXPIRY_MARGIN,
        }
    }

    /// Use `clock` for all expiry math.
    ///
    /// Applies to later updates and reads; an already-stored `valid_until` is kept.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subtract `margin` from server-declared lifetimes on later updates.
    #[must_use]
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// A copy of the whole record.
    pub async fn snapshot(&self) -> TokenRecord {
        self.record.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryStore {
    async fn access_token(&self) -> StoreResult<String> {
        Ok(self.record.read().await.access_token.clone())
    }

    async fn refresh_token(&self) -> StoreResult<String> {
        Ok(self.record.read().await.refresh_token.clone())
    }

    async fn valid_for(&self) -> StoreResult<chrono::Duration> {
        Ok(self.record.read().await.valid_for(self.clock.now()))
    }

    async fn update(&self, response: &TokenRefreshResponse) -> StoreResult<()> {
        let mut record = self.record.write().await;
        let now = self.clock.now();
        *record = TokenRecord::from_response(response, Some(&*record), now, self.margin);
        tracing::debug!(valid_until = %record.valid_until, "Updated in-memory token record");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").field("margin", &self.margin).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::duration::TokenDuration;

    fn response(access: &str, refresh: &str, secs: u64) -> TokenRefreshResponse {
        TokenRefreshResponse {
            access_token: access.into(),
            refresh_token: refresh.into(),
            expires_in: TokenDuration::from_secs(secs),
            ..Default::default()
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    #[tokio::test]
    async fn test_reads_return_what_was_written() {
        let clock = clock();
        let store = MemoryStore::empty().with_clock(Arc::new(clock.clone()));

        store.update(&response("access-1", "refresh-1", 3600)).await.unwrap();

        assert_eq!(store.access_token().await.unwrap(), "access-1");
        assert_eq!(store.refresh_token().await.unwrap(), "refresh-1");
        assert_eq!(store.valid_for().await.unwrap(), chrono::Duration::seconds(3585));
    }

    #[tokio::test]
    async fn test_valid_for_decreases_and_crosses_zero_at_valid_until() {
        let clock = clock();
        let store = MemoryStore::empty().with_clock(Arc::new(clock.clone()));
        store.update(&response("a", "r", 75)).await.unwrap();

        let mut last = store.valid_for().await.unwrap();
        assert_eq!(last, chrono::Duration::seconds(60));

        for _ in 0..6 {
            clock.advance(chrono::Duration::seconds(10));
            let now = store.valid_for().await.unwrap();
            assert!(now < last);
            last = now;
        }
        assert_eq!(last, chrono::Duration::zero());

        clock.advance(chrono::Duration::seconds(1));
        assert!(store.valid_for().await.unwrap() < chrono::Duration::zero());
    }

    #[tokio::test]
    async fn test_empty_store_has_no_token() {
        let store = MemoryStore::empty();
        assert_eq!(store.access_token().await.unwrap(), "");
        assert!(store.valid_for().await.unwrap() <= chrono::Duration::zero());
    }

    #[tokio::test]
    async fn test_new_seeds_record() {
        let store = MemoryStore::new(&response("a", "r", 300));
        assert_eq!(store.access_token().await.unwrap(), "a");
        let valid_for = store.valid_for().await.unwrap();
        assert!(valid_for > chrono::Duration::seconds(280));
        assert!(valid_for <= chrono::Duration::seconds(285));
    }

    #[tokio::test]
    async fn test_update_keeps_refresh_token_when_absent() {
        let store = MemoryStore::new(&response("a1", "r1", 300));
        store.update(&response("a2", "", 300)).await.unwrap();

        let record = store.snapshot().await;
        assert_eq!(record.access_token, "a2");
        assert_eq!(record.refresh_token, "r1");
    }

    #[tokio::test]
    async fn test_concurrent_updates_never_mix_fields() {
        let store = Arc::new(MemoryStore::empty());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.update(&response(&format!("a{i}"), &format!("r{i}"), 300)).await.unwrap();
                let record = store.snapshot().await;
                assert_eq!(record.access_token[1..], record.refresh_token[1..]);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
