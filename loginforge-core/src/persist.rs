//! Credential and attribute persistence for a resolved account.

use std::sync::Arc;
use tracing::debug;

use crate::model::{Account, CredentialType, Credentials};
use crate::store::{AttributeStore, CredentialStore, StoreError};

/// Writes login credentials and auxiliary metadata against an account.
///
/// The persister does not retain the credentials it is handed; they live in
/// the backing store after `store_credentials` returns.
pub struct CredentialPersister {
    credentials: Arc<dyn CredentialStore>,
    attributes: Arc<dyn AttributeStore>,
}

impl CredentialPersister {
    /// Create a persister over the given backends.
    pub fn new(credentials: Arc<dyn CredentialStore>, attributes: Arc<dyn AttributeStore>) -> Self {
        Self {
            credentials,
            attributes,
        }
    }

    /// Persist credentials against `(account, credential_type)`, overwriting
    /// any prior value for that exact slot.
    pub async fn store_credentials(
        &self,
        account: &Account,
        credential_type: &CredentialType,
        credentials: &Credentials,
    ) -> Result<(), StoreError> {
        self.credentials
            .put(account, credential_type, credentials)
            .await?;
        debug!(
            account = %account.key(),
            credential_type = %credential_type,
            has_refresh_token = credentials.refresh_token.is_some(),
            "stored credentials"
        );
        Ok(())
    }

    /// Persist an arbitrary metadata key/value pair against the account.
    ///
    /// A `None` value removes the key. Independent of any credential type.
    pub fn store_attribute(
        &self,
        account: &Account,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), StoreError> {
        self.attributes.set_attribute(account, key, value)?;
        debug!(account = %account.key(), key, removed = value.is_none(), "stored attribute");
        Ok(())
    }
}
