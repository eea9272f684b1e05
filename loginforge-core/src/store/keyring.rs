//! OS keyring-backed credential storage implementation.

use async_trait::async_trait;
use keyring::Entry;

use super::{credential_key, CredentialStore, Secret, StoreError};
use crate::model::{Account, CredentialType, Credentials};

/// OS keyring-backed credential store.
///
/// This store uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// Each credential slot maps to up to two keyring entries, one per piece:
/// `{key}/access` and `{key}/refresh`. Overwriting a slot whose new
/// credentials carry no refresh token deletes the stale refresh entry.
pub struct KeyringCredentialStore {
    service_name: String,
}

impl KeyringCredentialStore {
    /// Create a new keyring store with the given service name.
    ///
    /// # Panics
    ///
    /// Panics if the keyring backend is not available on this platform.
    /// Use [`try_new`](Self::try_new) for a non-panicking version.
    pub fn new(service_name: &str) -> Self {
        Self::try_new(service_name).expect("keyring backend not available")
    }

    /// Try to create a new keyring store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        // Probe availability by constructing a throwaway entry
        let test_key = format!("{}/__test__", service_name);
        match Entry::new(&test_key, "availability_check") {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    /// Create a keyring entry for the given piece key.
    fn create_entry(&self, key: &str) -> Result<Entry, StoreError> {
        let service = format!("{}/{}", self.service_name, key);
        Entry::new(&service, "loginforge").map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }

    fn read_piece(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let entry = self.create_entry(key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(Secret::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => Err(StoreError::BackendError {
                message: format!("ambiguous keyring entry for key: {}", key),
            }),
            Err(e) => Err(StoreError::BackendError {
                message: format!("keyring error: {}", e),
            }),
        }
    }

    fn write_piece(&self, key: &str, value: &Secret) -> Result<(), StoreError> {
        let entry = self.create_entry(key)?;
        entry
            .set_password(value.expose())
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to set keyring password: {}", e),
            })
    }

    fn delete_piece(&self, key: &str) -> Result<(), StoreError> {
        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Idempotent delete
            Err(e) => Err(StoreError::BackendError {
                message: format!("failed to delete keyring entry: {}", e),
            }),
        }
    }
}

impl std::fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringCredentialStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn put(
        &self,
        account: &Account,
        credential_type: &CredentialType,
        credentials: &Credentials,
    ) -> Result<(), StoreError> {
        let key = credential_key(account, credential_type);
        self.write_piece(&format!("{}/access", key), &credentials.access_token)?;
        match &credentials.refresh_token {
            Some(refresh) => self.write_piece(&format!("{}/refresh", key), refresh),
            None => self.delete_piece(&format!("{}/refresh", key)),
        }
    }

    async fn get(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<Option<Credentials>, StoreError> {
        let key = credential_key(account, credential_type);
        let Some(access_token) = self.read_piece(&format!("{}/access", key))? else {
            return Ok(None);
        };
        let refresh_token = self.read_piece(&format!("{}/refresh", key))?;
        Ok(Some(Credentials {
            access_token,
            refresh_token,
        }))
    }

    async fn delete(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<(), StoreError> {
        let key = credential_key(account, credential_type);
        self.delete_piece(&format!("{}/access", key))?;
        self.delete_piece(&format!("{}/refresh", key))
    }
}
