//! In-memory credential storage implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{credential_key, CredentialStore, StoreError};
use crate::model::{Account, CredentialType, Credentials};

/// In-memory credential store for testing and development.
///
/// This store is not persistent; data is lost when the process exits.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is
/// safe to share across threads.
pub struct MemoryCredentialStore {
    data: RwLock<HashMap<String, Credentials>>,
}

impl MemoryCredentialStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.data.read().map(|d| d.len()).unwrap_or(0);
        f.debug_struct("MemoryCredentialStore")
            .field("slots_count", &count)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(
        &self,
        account: &Account,
        credential_type: &CredentialType,
        credentials: &Credentials,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        data.insert(credential_key(account, credential_type), credentials.clone());
        Ok(())
    }

    async fn get(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<Option<Credentials>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        Ok(data.get(&credential_key(account, credential_type)).cloned())
    }

    async fn delete(
        &self,
        account: &Account,
        credential_type: &CredentialType,
    ) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        data.remove(&credential_key(account, credential_type));
        Ok(())
    }
}
