//! Credential and attribute storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`CredentialStore`] - Trait for credential storage backends
//! - [`AttributeStore`] - Trait for non-secret account metadata
//! - [`MemoryCredentialStore`] - In-memory implementation for testing
//! - [`KeyringCredentialStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_credential_store`] - Helper to select backend based on availability
//!
//! # Storage Key Convention
//!
//! Keys follow the pattern: `loginforge/{account_type}/{name}/{credential_type}`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::model::{Account, CredentialType, Credentials};

mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use memory::MemoryCredentialStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringCredentialStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing memory is zeroed on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for credential and attribute storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Build the storage key for a credential slot.
pub fn credential_key(account: &Account, credential_type: &CredentialType) -> String {
    format!(
        "loginforge/{}/{}/{}",
        account.account_type, account.name, credential_type
    )
}

/// Abstraction over credential storage backends.
///
/// A credential slot is identified by `(account, credential_type)`; `put`
/// replaces the whole slot, including dropping a previously stored refresh
/// token when the new [`Credentials`] carry none.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist credentials for the given slot, overwriting any prior value.
    async fn put(
        &self,
        account: &Account,
        credential_type: &CredentialType,
        credentials: &Credentials,
    ) -> Result<(), StoreError>;

    /// Retrieve the credentials stored for the given slot.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    async fn get(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<Option<Credentials>, StoreError>;

    /// Delete the credentials stored for the given slot.
    ///
    /// Returns `Ok(())` even if the slot was empty.
    async fn delete(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<(), StoreError>;
}

/// Non-secret metadata key/value storage against an account.
///
/// Attributes are independent of any credential type. Backends typically
/// keep them next to the account records rather than in the secret store.
pub trait AttributeStore: Send + Sync {
    /// Set or remove an attribute. A `None` value removes the key.
    fn set_attribute(
        &self,
        account: &Account,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Retrieve an attribute value.
    ///
    /// Returns `Ok(None)` if the key is not set.
    fn attribute(&self, account: &Account, key: &str) -> Result<Option<String>, StoreError>;
}

/// Create a credential store with automatic backend selection.
///
/// If `prefer_keyring` is `true` and the `keyring-store` feature is enabled,
/// attempts to use the OS keyring and falls back to [`MemoryCredentialStore`]
/// with a warning when the keyring is unavailable. Otherwise returns a
/// memory store.
pub fn create_credential_store(prefer_keyring: bool) -> Box<dyn CredentialStore> {
    #[cfg(feature = "keyring-store")]
    if prefer_keyring {
        match KeyringCredentialStore::try_new("loginforge") {
            Ok(store) => {
                tracing::info!("Using OS keyring for credential storage");
                return Box::new(store);
            }
            Err(e) => {
                tracing::warn!(
                    "Keyring unavailable ({}), falling back to memory store. \
                     Credentials will not persist across restarts.",
                    e
                );
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    if prefer_keyring {
        tracing::warn!(
            "Keyring storage requested but keyring-store feature not enabled. \
             Using memory store. Credentials will not persist across restarts."
        );
    }

    tracing::debug!("Using in-memory credential storage");
    Box::new(MemoryCredentialStore::new())
}
