//! Account registry persistence.
//!
//! This module provides the registry-side collaborator seams of the login
//! flow and their backing implementations:
//! - [`AccountRegistry`] - Register, list, and unregister accounts by type
//! - [`OwnerStore`] - Remember which account is active for an account type
//! - [`FileRegistry`] - Disk-backed JSON implementation
//! - [`MemoryRegistry`] - In-memory implementation for testing
//!
//! # Storage Location
//!
//! The file backend stores accounts at `~/.config/loginforge/accounts.json`
//! on Linux/macOS and `%APPDATA%\loginforge\accounts.json` on Windows. The
//! active-owner map and per-account attributes live in the same file; they
//! are account metadata, not secrets.

use crate::model::{Account, AccountType};
use crate::store::{AttributeStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Account already exists.
    #[error("account {account_type}/{name} already exists")]
    AlreadyExists { account_type: String, name: String },

    /// Account not found.
    #[error("account {account_type}/{name} not found")]
    NotFound { account_type: String, name: String },

    /// I/O error reading or writing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration directory not available.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,

    /// Internal lock poisoning error.
    #[error("internal lock error: {message}")]
    LockError { message: String },
}

/// Backing registry of accounts, keyed by `(account_type, name)`.
///
/// The registry enforces uniqueness of the pair but nothing more; upsert
/// semantics and retry safety are the resolver's responsibility.
pub trait AccountRegistry: Send + Sync {
    /// List all registered accounts of the given type.
    fn list_by_type(&self, account_type: &AccountType) -> Result<Vec<Account>, RegistryError>;

    /// Register a new account.
    ///
    /// Returns [`RegistryError::AlreadyExists`] if an account with the same
    /// `(account_type, name)` pair is already registered.
    fn register(&self, account: Account) -> Result<(), RegistryError>;

    /// Unregister an account.
    ///
    /// Returns [`RegistryError::NotFound`] if the account is not registered.
    fn unregister(&self, account: &Account) -> Result<(), RegistryError>;
}

/// Records which account is currently active for an account type.
pub trait OwnerStore: Send + Sync {
    /// Record `account` as the active account for `account_type`.
    fn set_active(&self, account_type: &AccountType, account: &Account)
        -> Result<(), RegistryError>;

    /// Get the currently active account for `account_type`, if any.
    fn active(&self, account_type: &AccountType) -> Result<Option<Account>, RegistryError>;
}

/// Internal storage format for the registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryData {
    /// Version of the store format (for future migrations).
    version: u32,

    /// All registered accounts.
    accounts: Vec<Account>,

    /// Active account name per account type.
    #[serde(default)]
    active: HashMap<String, String>,

    /// Attribute key/value pairs per account key.
    #[serde(default)]
    attributes: HashMap<String, HashMap<String, String>>,
}

impl Default for RegistryData {
    fn default() -> Self {
        Self {
            version: 1,
            accounts: Vec::new(),
            active: HashMap::new(),
            attributes: HashMap::new(),
        }
    }
}

impl RegistryData {
    fn find(&self, account_type: &AccountType, name: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| &a.account_type == account_type && a.name == name)
    }
}

/// Disk-backed account registry.
///
/// Stores accounts, the active-owner map, and per-account attributes in a
/// single JSON file in the platform-specific configuration directory.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is safe to
/// share across threads via `Arc`.
pub struct FileRegistry {
    /// Path to the accounts JSON file.
    path: PathBuf,

    /// In-memory cache of registry data.
    data: RwLock<RegistryData>,
}

impl FileRegistry {
    /// Get the default storage path for the registry.
    pub fn default_path() -> Result<PathBuf, RegistryError> {
        let dirs = directories::ProjectDirs::from("com", "raibid-labs", "loginforge")
            .ok_or(RegistryError::ConfigDirUnavailable)?;

        Ok(dirs.config_dir().join("accounts.json"))
    }

    /// Load the registry from the default location.
    ///
    /// Creates the file and parent directories if they don't exist.
    pub fn load() -> Result<Self, RegistryError> {
        let path = Self::default_path()?;
        Self::load_from_path(path)
    }

    /// Load the registry from a specific path.
    ///
    /// Creates the file and parent directories if they don't exist.
    pub fn load_from_path(path: PathBuf) -> Result<Self, RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            RegistryData::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Save the current state to disk.
    fn save(&self) -> Result<(), RegistryError> {
        let data = self.data.read().map_err(|e| RegistryError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        let contents = serde_json::to_string_pretty(&*data)?;
        fs::write(&self.path, contents)?;

        Ok(())
    }

    /// Get the storage path for this registry.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl AccountRegistry for FileRegistry {
    fn list_by_type(&self, account_type: &AccountType) -> Result<Vec<Account>, RegistryError> {
        let data = self.data.read().map_err(|e| RegistryError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        Ok(data
            .accounts
            .iter()
            .filter(|a| &a.account_type == account_type)
            .cloned()
            .collect())
    }

    fn register(&self, account: Account) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        if data.find(&account.account_type, &account.name).is_some() {
            return Err(RegistryError::AlreadyExists {
                account_type: account.account_type.to_string(),
                name: account.name.clone(),
            });
        }

        data.accounts.push(account);
        drop(data);

        self.save()
    }

    fn unregister(&self, account: &Account) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        let initial_len = data.accounts.len();
        data.accounts
            .retain(|a| a.account_type != account.account_type || a.name != account.name);

        if data.accounts.len() == initial_len {
            return Err(RegistryError::NotFound {
                account_type: account.account_type.to_string(),
                name: account.name.clone(),
            });
        }

        // Drop metadata that belonged to the removed account
        data.attributes.remove(&account.key());
        let type_key = account.account_type.to_string();
        if data.active.get(&type_key) == Some(&account.name) {
            data.active.remove(&type_key);
        }
        drop(data);

        self.save()
    }
}

impl OwnerStore for FileRegistry {
    fn set_active(
        &self,
        account_type: &AccountType,
        account: &Account,
    ) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        data.active
            .insert(account_type.to_string(), account.name.clone());
        drop(data);

        self.save()
    }

    fn active(&self, account_type: &AccountType) -> Result<Option<Account>, RegistryError> {
        let data = self.data.read().map_err(|e| RegistryError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        let Some(name) = data.active.get(account_type.as_str()) else {
            return Ok(None);
        };
        Ok(data.find(account_type, name).cloned())
    }
}

impl AttributeStore for FileRegistry {
    fn set_attribute(
        &self,
        account: &Account,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("write lock poisoned: {}", e),
        })?;

        let attrs = data.attributes.entry(account.key()).or_default();
        match value {
            Some(value) => {
                attrs.insert(key.to_string(), value.to_string());
            }
            None => {
                attrs.remove(key);
                if attrs.is_empty() {
                    data.attributes.remove(&account.key());
                }
            }
        }
        drop(data);

        self.save().map_err(|e| StoreError::BackendError {
            message: format!("failed to save registry: {}", e),
        })
    }

    fn attribute(&self, account: &Account, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("read lock poisoned: {}", e),
        })?;

        Ok(data
            .attributes
            .get(&account.key())
            .and_then(|attrs| attrs.get(key))
            .cloned())
    }
}

/// In-memory account registry for testing and embedders that manage their
/// own persistence.
pub struct MemoryRegistry {
    data: RwLock<RegistryData>,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(RegistryData::default()),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.data.read().map(|d| d.accounts.len()).unwrap_or(0);
        f.debug_struct("MemoryRegistry")
            .field("accounts_count", &count)
            .finish()
    }
}

impl AccountRegistry for MemoryRegistry {
    fn list_by_type(&self, account_type: &AccountType) -> Result<Vec<Account>, RegistryError> {
        let data = self.data.read().map_err(|e| RegistryError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        Ok(data
            .accounts
            .iter()
            .filter(|a| &a.account_type == account_type)
            .cloned()
            .collect())
    }

    fn register(&self, account: Account) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        if data.find(&account.account_type, &account.name).is_some() {
            return Err(RegistryError::AlreadyExists {
                account_type: account.account_type.to_string(),
                name: account.name.clone(),
            });
        }

        data.accounts.push(account);
        Ok(())
    }

    fn unregister(&self, account: &Account) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        let initial_len = data.accounts.len();
        data.accounts
            .retain(|a| a.account_type != account.account_type || a.name != account.name);

        if data.accounts.len() == initial_len {
            return Err(RegistryError::NotFound {
                account_type: account.account_type.to_string(),
                name: account.name.clone(),
            });
        }

        data.attributes.remove(&account.key());
        let type_key = account.account_type.to_string();
        if data.active.get(&type_key) == Some(&account.name) {
            data.active.remove(&type_key);
        }
        Ok(())
    }
}

impl OwnerStore for MemoryRegistry {
    fn set_active(
        &self,
        account_type: &AccountType,
        account: &Account,
    ) -> Result<(), RegistryError> {
        let mut data = self.data.write().map_err(|e| RegistryError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        data.active
            .insert(account_type.to_string(), account.name.clone());
        Ok(())
    }

    fn active(&self, account_type: &AccountType) -> Result<Option<Account>, RegistryError> {
        let data = self.data.read().map_err(|e| RegistryError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        let Some(name) = data.active.get(account_type.as_str()) else {
            return Ok(None);
        };
        Ok(data.find(account_type, name).cloned())
    }
}

impl AttributeStore for MemoryRegistry {
    fn set_attribute(
        &self,
        account: &Account,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("write lock poisoned: {}", e),
        })?;

        let attrs = data.attributes.entry(account.key()).or_default();
        match value {
            Some(value) => {
                attrs.insert(key.to_string(), value.to_string());
            }
            None => {
                attrs.remove(key);
                if attrs.is_empty() {
                    data.attributes.remove(&account.key());
                }
            }
        }
        Ok(())
    }

    fn attribute(&self, account: &Account, key: &str) -> Result<Option<String>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("read lock poisoned: {}", e),
        })?;

        Ok(data
            .attributes
            .get(&account.key())
            .and_then(|attrs| attrs.get(key))
            .cloned())
    }
}
