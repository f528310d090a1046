//! Bearer credential storage
//!
//! Provides the `TokenStore` capability the HTTP client uses to attach an
//! `Authorization: Bearer` header, plus an in-memory store and a store that
//! persists the token to a JSON file in the XDG config directory.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the token file inside the store directory
const TOKEN_FILE: &str = "token.json";

/// Errors that can occur when reading or writing a stored credential
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Reading or writing the token file failed
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The token could not be serialized
    #[error("Failed to serialize token: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A reload found the same credential that is already in use
    #[error("Stored credential has not changed")]
    Unchanged,
}

/// Source of the bearer credential attached to outgoing requests
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// The current token without any `Bearer ` prefix, if one is stored
    fn bearer(&self) -> Option<String>;

    /// Replaces the stored token
    fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Forgets the stored token
    fn clear(&self) -> Result<(), TokenStoreError>;

    /// Re-reads the token from the backing store
    ///
    /// # Returns
    /// * `Ok(true)` if the token in use changed
    /// * `Ok(false)` if it is the same as before (or there is no backing store)
    fn reload(&self) -> Result<bool, TokenStoreError> {
        Ok(false)
    }
}

/// Strips surrounding whitespace and a leading `Bearer ` scheme
///
/// Returns `None` for an empty token.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let token = match (trimmed.get(..6), trimmed.get(6..)) {
        (Some(scheme), Some(rest))
            if scheme.eq_ignore_ascii_case("bearer") && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            rest.trim_start()
        }
        _ => trimmed,
    };
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Token store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(normalize_token(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn bearer(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.write() = normalize_token(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token as persisted on disk
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    saved_at: DateTime<Utc>,
}

/// Token store backed by a JSON file
///
/// The file lives in an XDG-compliant config directory (`~/.config/odorok/` on
/// Linux). The token is read once on construction and again on `reload`, so a
/// login performed by another process is picked up after a 401.
#[derive(Debug)]
pub struct FileTokenStore {
    /// Directory where the token file is stored
    dir: PathBuf,
    /// Token currently in use
    current: RwLock<Option<String>>,
}

impl FileTokenStore {
    /// Creates a store in the XDG config directory
    ///
    /// Returns `None` if the config directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "odorok")?;
        Some(Self::with_dir(project_dirs.config_dir().to_path_buf()))
    }

    /// Creates a store in a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        let store = Self {
            dir,
            current: RwLock::new(None),
        };
        *store.current.write() = store.read_file();
        store
    }

    fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Reads the token file; a missing or unparseable file means no token
    fn read_file(&self) -> Option<String> {
        let content = fs::read_to_string(self.path()).ok()?;
        let stored: StoredToken = serde_json::from_str(&content).ok()?;
        normalize_token(&stored.access_token)
    }

    /// When the stored token was written, if there is one
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(self.path()).ok()?;
        let stored: StoredToken = serde_json::from_str(&content).ok()?;
        Some(stored.saved_at)
    }
}

impl TokenStore for FileTokenStore {
    fn bearer(&self) -> Option<String> {
        self.current.read().clone()
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let Some(token) = normalize_token(token) else {
            return self.clear();
        };

        fs::create_dir_all(&self.dir)?;
        let stored = StoredToken {
            access_token: token.clone(),
            saved_at: Utc::now(),
        };
        fs::write(self.path(), serde_json::to_string_pretty(&stored)?)?;

        *self.current.write() = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *self.current.write() = None;
        Ok(())
    }

    fn reload(&self) -> Result<bool, TokenStoreError> {
        let fresh = self.read_file();
        let mut current = self.current.write();
        let changed = *current != fresh;
        *current = fresh;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileTokenStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileTokenStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_normalize_strips_bearer_prefix() {
        assert_eq!(normalize_token("Bearer abc.def"), Some("abc.def".to_string()));
        assert_eq!(normalize_token("bearer   abc"), Some("abc".to_string()));
        assert_eq!(normalize_token("  abc  "), Some("abc".to_string()));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize_token(""), None);
        assert_eq!(normalize_token("Bearer "), None);
        assert_eq!(normalize_token("   "), None);
    }

    #[test]
    fn test_normalize_keeps_short_and_multibyte_tokens() {
        assert_eq!(normalize_token("abc"), Some("abc".to_string()));
        assert_eq!(normalize_token("토큰값입니다"), Some("토큰값입니다".to_string()));
    }

    #[test]
    fn test_memory_store_set_and_clear() {
        let store = MemoryTokenStore::new();
        assert!(store.bearer().is_none());

        store.set("Bearer xyz").unwrap();
        assert_eq!(store.bearer().as_deref(), Some("xyz"));

        store.clear().unwrap();
        assert!(store.bearer().is_none());
        assert!(!store.reload().unwrap());
    }

    #[test]
    fn test_file_store_starts_empty() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.bearer().is_none());
        assert!(store.saved_at().is_none());
    }

    #[test]
    fn test_file_store_persists_token() {
        let (store, temp_dir) = create_test_store();
        store.set("abc123").unwrap();

        let content = fs::read_to_string(temp_dir.path().join(TOKEN_FILE)).expect("Should read file");
        assert!(content.contains("\"access_token\""));
        assert!(content.contains("abc123"));

        let reopened = FileTokenStore::with_dir(temp_dir.path().to_path_buf());
        assert_eq!(reopened.bearer().as_deref(), Some("abc123"));
        assert!(reopened.saved_at().is_some());
    }

    #[test]
    fn test_file_store_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("config");
        let store = FileTokenStore::with_dir(nested.clone());

        store.set("tok").unwrap();
        assert!(nested.join(TOKEN_FILE).exists());
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let (store, temp_dir) = create_test_store();
        store.set("tok").unwrap();
        store.clear().unwrap();

        assert!(!temp_dir.path().join(TOKEN_FILE).exists());
        assert!(store.bearer().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_reload_picks_up_token_written_elsewhere() {
        let (store, temp_dir) = create_test_store();
        let other = FileTokenStore::with_dir(temp_dir.path().to_path_buf());

        other.set("from-another-shell").unwrap();
        assert!(store.bearer().is_none());

        assert!(store.reload().unwrap());
        assert_eq!(store.bearer().as_deref(), Some("from-another-shell"));
        assert!(!store.reload().unwrap());
    }

    #[test]
    fn test_corrupt_file_means_no_token() {
        let (_store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join(TOKEN_FILE), "not json").unwrap();

        let store = FileTokenStore::with_dir(temp_dir.path().to_path_buf());
        assert!(store.bearer().is_none());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileTokenStore::new() {
            let path_str = store.dir.to_string_lossy();
            assert!(path_str.contains("odorok"), "Config path should contain project name");
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
