//! Durable token store: a single JSON record in a file.
//!
//! Every read goes back to the file so that a refresh performed by another process sharing
//! the same path is picked up. Every update writes a sibling temporary file and renames it
//! over the target, so an observer sees either the old record or the new one, never a mix.
//! Writers in different processes are not coordinated; the last rename wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::{DEFAULT_EXPIRY_MARGIN, TokenRecord, TokenStore};
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::types::TokenRefreshResponse;
use crate::error::{AuthError, AuthResult, StoreError, StoreResult};

/// Token store persisted to disk.
pub struct PersistentStore {
    path: PathBuf,
    /// Readers of the file share it; an update holds it exclusively.
    lock: RwLock<()>,
    clock: Arc<dyn Clock>,
    margin: Duration,
}

impl PersistentStore {
    /// Attach to the store at `path`. Does not touch the file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingConfig`] if `path` is empty.
    pub fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(AuthError::missing("store_path"));
        }
        Ok(Self {
            path,
            lock: RwLock::new(()),
            clock: Arc::new(SystemClock),
            margin: DEFAULT_EXPIRY_MARGIN,
        })
    }

    /// Create (or overwrite) the store at `path` from a token response.
    pub async fn create(
        path: impl Into<PathBuf>,
        response: &TokenRefreshResponse,
    ) -> AuthResult<Self> {
        let store = Self::open(path)?;
        store.update(response).await?;
        Ok(store)
    }

    /// Use `clock` for all expiry math.
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

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file holds a record. `Ok(false)` means the PIN workflow has not been
    /// run yet; an unreadable or corrupt file is an error.
    pub async fn is_initialized(&self) -> StoreResult<bool> {
        match self.snapshot().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_uninitialized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The record currently on disk.
    pub async fn snapshot(&self) -> StoreResult<TokenRecord> {
        let _guard = self.lock.read().await;
        self.load().await
    }

    async fn load(&self) -> StoreResult<TokenRecord> {
        let bytes =
            tokio::fs::read(&self.path).await.map_err(|e| StoreError::io(&self.path, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt { path: self.path.clone(), source })
    }

    async fn persist(&self, record: &TokenRecord) -> StoreResult<()> {
        let mut bytes = serde_json::to_vec_pretty(record).map_err(StoreError::Encode)?;
        bytes.push(b'\n');

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await.map_err(|e| StoreError::io(&dir, e))?;

        let file_name = self.path.file_name().and_then(|n| n.to_str()).unwrap_or("tokens");
        let tmp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

        if let Err(e) = write_new_file(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&self.path, e));
        }
        sync_dir(&dir).await.map_err(|e| StoreError::io(&dir, e))
    }
}

/// Flush directory metadata so a completed rename survives a crash.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Write `bytes` to a fresh file readable only by the owner and flush it to disk.
async fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[async_trait::async_trait]
impl TokenStore for PersistentStore {
    async fn access_token(&self) -> StoreResult<String> {
        Ok(self.snapshot().await?.access_token)
    }

    async fn refresh_token(&self) -> StoreResult<String> {
        Ok(self.snapshot().await?.refresh_token)
    }

    async fn valid_for(&self) -> StoreResult<chrono::Duration> {
        Ok(self.snapshot().await?.valid_for(self.clock.now()))
    }

    async fn update(&self, response: &TokenRefreshResponse) -> StoreResult<()> {
        let _guard = self.lock.write().await;

        let previous = match self.load().await {
            Ok(record) => Some(record),
            Err(e) if e.is_uninitialized() => None,
            Err(StoreError::Corrupt { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "Overwriting corrupt token store"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let record =
            TokenRecord::from_response(response, previous.as_ref(), self.clock.now(), self.margin);
        self.persist(&record).await?;

        tracing::debug!(
            path = %self.path.display(),
            valid_until = %record.valid_until,
            "Persisted token record"
        );
        Ok(())
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("path", &self.path)
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}
