//! Persistent credential storage.
//!
//! Stores never fail loudly: a read that cannot be served is `None`, a write
//! that cannot be performed is `false`, and the cause is logged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Default credentials file name within the pame config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// The credentials the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    UserEmail,
}

impl CredentialKey {
    /// All keys, in storage order.
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::UserEmail,
    ];

    /// Storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "auth_token",
            CredentialKey::RefreshToken => "auth_refresh_token",
            CredentialKey::UserEmail => "auth_email",
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CredentialStore Trait
// ============================================================================

/// Durable key-value storage for credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Read a value; `None` if absent or unreadable.
    async fn get(&self, key: CredentialKey) -> Option<String>;

    /// Write a value; `false` if it could not be persisted.
    async fn set(&self, key: CredentialKey, value: &str) -> bool;

    /// Remove a value; `false` if the removal could not be persisted.
    async fn delete(&self, key: CredentialKey) -> bool;
}

/// Shared credential store for use across async contexts.
pub type SharedCredentialStore = Arc<dyn CredentialStore>;

// ============================================================================
// FileCredentialStore
// ============================================================================

/// JSON-file credential store.
///
/// The whole map is rewritten on every change. On Unix the file is created
/// with mode `0600`.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl FileCredentialStore {
    /// Store at `<data_dir>/credentials.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(CREDENTIALS_FILE))
    }

    /// Store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
        }
    }

    /// Get the credentials file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> std::io::Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Apply `change` to the stored map and persist it.
    async fn update<F>(&self, key: CredentialKey, change: F) -> bool
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut cache = self.cache.write().await;

        let mut entries = match cache.as_ref() {
            Some(entries) => entries.clone(),
            None => match self.read_file() {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(key = %key, path = %self.path.display(), error = %e, "failed to read credentials file");
                    return false;
                }
            },
        };

        change(&mut entries);

        match self.write_file(&entries) {
            Ok(()) => {
                *cache = Some(entries);
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, path = %self.path.display(), error = %e, "failed to write credentials file");
                false
            }
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Option<String> {
        {
            let cache = self.cache.read().await;
            if let Some(entries) = cache.as_ref() {
                return entries.get(key.as_str()).cloned();
            }
        }

        let entries = match self.read_file() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %key, path = %self.path.display(), error = %e, "failed to read credentials file");
                return None;
            }
        };

        let value = entries.get(key.as_str()).cloned();
        *self.cache.write().await = Some(entries);
        value
    }

    async fn set(&self, key: CredentialKey, value: &str) -> bool {
        self.update(key, |entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
        .await
    }

    async fn delete(&self, key: CredentialKey) -> bool {
        self.update(key, |entries| {
            entries.remove(key.as_str());
        })
        .await
    }
}

// ============================================================================
// MemoryCredentialStore
// ============================================================================

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<BTreeMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with initial values.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CredentialKey, String)>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries.read().await.get(&key).cloned()
    }

    async fn set(&self, key: CredentialKey, value: &str) -> bool {
        self.entries.write().await.insert(key, value.to_string());
        true
    }

    async fn delete(&self, key: CredentialKey) -> bool {
        self.entries.write().await.remove(&key);
        true
    }
}
