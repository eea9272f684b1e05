//! The login flow facade.
//!
//! [`LoginFlow`] is the handle a UI collaborator drives through one
//! interactive login session: initialize from a [`LaunchConfig`], resolve or
//! create the account the user named, persist the credentials the login
//! produced, then finalize (or abandon) the flow. Finalization records the
//! account in the terminal result, marks it active for its account type, and
//! tears the flow down; teardown delivers the terminal result exactly once.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, LaunchConfig};
use crate::error::FlowError;
use crate::model::{Account, AccountType, CredentialType, Credentials};
use crate::persist::CredentialPersister;
use crate::registry::{AccountRegistry, MemoryRegistry, OwnerStore, RegistryError};
use crate::report::{self, LoginResult, ResultReporter};
use crate::resolver::AccountResolver;
use crate::store::{AttributeStore, CredentialStore, MemoryCredentialStore};

/// Collaborator backends a flow is constructed over.
///
/// Passed in explicitly so embedders and tests can substitute their own
/// implementations.
#[derive(Clone)]
pub struct FlowServices {
    /// Account registry.
    pub registry: Arc<dyn AccountRegistry>,

    /// Credential store.
    pub credentials: Arc<dyn CredentialStore>,

    /// Attribute store.
    pub attributes: Arc<dyn AttributeStore>,

    /// Active-owner store.
    pub owners: Arc<dyn OwnerStore>,
}

impl FlowServices {
    /// Bundle explicit backends.
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        credentials: Arc<dyn CredentialStore>,
        attributes: Arc<dyn AttributeStore>,
        owners: Arc<dyn OwnerStore>,
    ) -> Self {
        Self {
            registry,
            credentials,
            attributes,
            owners,
        }
    }

    /// All-in-memory backends, for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        let registry = Arc::new(MemoryRegistry::new());
        Self {
            registry: registry.clone(),
            credentials: Arc::new(MemoryCredentialStore::new()),
            attributes: registry.clone(),
            owners: registry,
        }
    }
}

/// Marks an account as the active one for its account type.
pub struct OwnerSwitch {
    owners: Arc<dyn OwnerStore>,
}

impl OwnerSwitch {
    /// Create a switch over the given owner store.
    pub fn new(owners: Arc<dyn OwnerStore>) -> Self {
        Self { owners }
    }

    /// Record `account` as the currently active account for `account_type`.
    pub fn activate(
        &self,
        account_type: &AccountType,
        account: &Account,
    ) -> Result<(), RegistryError> {
        self.owners.set_active(account_type, account)?;
        info!(account = %account.key(), "account marked active");
        Ok(())
    }
}

/// One interactive login session from launch to terminal result delivery.
///
/// Driven sequentially by a single UI presentation; the state-transitioning
/// operations take `&mut self`, so a flow cannot finalize and tear down
/// concurrently.
///
/// # Examples
///
/// ```
/// use loginforge_core::{
///     Credentials, CredentialType, FlowServices, LaunchConfig, LoginFlow, LoginResult,
/// };
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), loginforge_core::FlowError> {
/// let config = LaunchConfig::new("app.auth").with_credential_type("bearer");
/// let mut flow = LoginFlow::initialize(config, FlowServices::in_memory())?;
///
/// let account = flow.resolve_or_create("alice")?;
/// let creds = Credentials::new("access-token").with_refresh_token("refresh-token");
/// flow.store_credentials(&account, &CredentialType::new("bearer"), &creds).await?;
///
/// let result = flow.finalize(&account, true)?;
/// assert!(matches!(result, Some(LoginResult::Success { .. })));
/// # Ok(())
/// # }
/// ```
pub struct LoginFlow {
    account_type: AccountType,
    credential_type: Option<CredentialType>,
    resolver: AccountResolver,
    persister: CredentialPersister,
    switch: OwnerSwitch,
    reporter: ResultReporter,
}

impl LoginFlow {
    /// Initialize a flow from its launch configuration.
    ///
    /// Fails with [`ConfigError`] if `account_type` is absent. The failure
    /// still pushes a cancellation signal into the response channel (if one
    /// was supplied) before propagating, so the original requester is never
    /// left waiting indefinitely.
    pub fn initialize(mut config: LaunchConfig, services: FlowServices) -> Result<Self, FlowError> {
        let Some(account_type) = config.account_type.take() else {
            if let Some(channel) = config.response_channel.take() {
                report::notify_canceled(channel);
            }
            return Err(ConfigError::MissingOption {
                key: "account_type",
            }
            .into());
        };

        let account_type = AccountType::new(account_type);
        let credential_type = config.credential_type.take().map(CredentialType::new);
        let reporter = ResultReporter::new(&account_type, config.response_channel.take());

        debug!(
            account_type = %account_type,
            requested_credential_type = credential_type.as_ref().map(|c| c.as_str()),
            "login flow initialized"
        );

        Ok(Self {
            resolver: AccountResolver::new(account_type.clone(), services.registry),
            persister: CredentialPersister::new(services.credentials, services.attributes),
            switch: OwnerSwitch::new(services.owners),
            reporter,
            account_type,
            credential_type,
        })
    }

    /// The account type this flow was launched for.
    pub fn account_type(&self) -> &AccountType {
        &self.account_type
    }

    /// The credential type the requester asked for, if any.
    ///
    /// Purely informational to the UI collaborator.
    pub fn requested_credential_type(&self) -> Option<&CredentialType> {
        self.credential_type.as_ref()
    }

    /// Look up an existing account by name, or create and register a new one.
    ///
    /// Safe to call repeatedly with the same name across retries of a failed
    /// login; at most one account per `(account_type, name)` pair ever
    /// exists.
    pub fn resolve_or_create(&self, name: &str) -> Result<Account, FlowError> {
        Ok(self.resolver.resolve_or_create(name)?)
    }

    /// Unregister an account created by this flow.
    ///
    /// Used to roll back a partially-completed login, e.g. when credential
    /// storage failed after the account was created. Removing an account
    /// that is not registered is a no-op.
    pub fn remove_account(&self, account: &Account) -> Result<(), FlowError> {
        Ok(self.resolver.remove(account)?)
    }

    /// Persist credentials against `(account, credential_type)`.
    pub async fn store_credentials(
        &self,
        account: &Account,
        credential_type: &CredentialType,
        credentials: &Credentials,
    ) -> Result<(), FlowError> {
        Ok(self
            .persister
            .store_credentials(account, credential_type, credentials)
            .await?)
    }

    /// Persist an auxiliary metadata key/value pair against the account.
    ///
    /// A `None` value removes the key.
    pub fn store_attribute(
        &self,
        account: &Account,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), FlowError> {
        Ok(self.persister.store_attribute(account, key, value)?)
    }

    /// Finalize the flow with a successfully logged-in account.
    ///
    /// Records the account name in the terminal result, marks the account
    /// active for its account type, then tears down immediately when
    /// `auto_close` is true. With `auto_close` false the caller defers
    /// teardown (e.g. to show a confirmation screen first) and must call
    /// [`teardown`](Self::teardown) later.
    ///
    /// Finalizing after the terminal result has been delivered is a logged
    /// no-op.
    pub fn finalize(
        &mut self,
        account: &Account,
        auto_close: bool,
    ) -> Result<Option<LoginResult>, FlowError> {
        if self.reporter.is_delivered() {
            warn!(account = %account.key(), "flow already torn down, ignoring finalize");
            return Ok(None);
        }

        self.reporter.record_success(&account.name);
        self.switch.activate(&self.account_type, account)?;

        if auto_close {
            Ok(self.teardown())
        } else {
            debug!(account = %account.key(), "finalized with deferred teardown");
            Ok(None)
        }
    }

    /// Tear the flow down, delivering the terminal result.
    ///
    /// Idempotent: the first call delivers through exactly one of the two
    /// conventions — a reply into the response channel (returning `None`
    /// here) or an implicit [`LoginResult`] returned to the caller. Any
    /// later call does nothing. If the flow was never finalized, the
    /// delivered result is a cancellation.
    pub fn teardown(&mut self) -> Option<LoginResult> {
        self.reporter.deliver()
    }
}
