//! Integration tests for the login flow lifecycle.
//!
//! These tests verify the end-to-end behavior of a flow:
//! - Launch configuration validation and requester notification
//! - Idempotent account resolution under retry
//! - Exactly-once terminal result delivery across both caller conventions
//! - Deferred finalization and rollback of partial logins

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use loginforge_core::{
    Account, AccountRegistry, AccountType, AttributeStore, CredentialStore, CredentialType, Credentials, FlowError,
    FlowServices, LaunchConfig, LoginFlow, LoginReply, LoginResult, MemoryRegistry, OwnerStore,
    RegistryError, StoreError, ERROR_CODE_CANCELED,
};
use tokio::sync::oneshot;

/// Helper to launch a flow over in-memory backends.
fn launch(config: LaunchConfig) -> Result<LoginFlow, FlowError> {
    LoginFlow::initialize(config, FlowServices::in_memory())
}

#[test]
fn test_missing_account_type_fails_initialization() {
    let result = launch(LaunchConfig::default());

    assert!(
        matches!(result, Err(FlowError::Config(_))),
        "flow must not start without an account type"
    );
}

#[test]
fn test_missing_account_type_notifies_requester_exactly_once() {
    let (tx, mut rx) = oneshot::channel();
    let config = LaunchConfig {
        account_type: None,
        credential_type: Some("bearer".to_string()),
        response_channel: Some(tx),
    };

    let result = launch(config);
    assert!(matches!(result, Err(FlowError::Config(_))));

    match rx.try_recv().unwrap() {
        LoginReply::Canceled { code } => assert_eq!(code, ERROR_CODE_CANCELED),
        other => panic!("expected cancellation signal, got {:?}", other),
    }
    assert!(
        rx.try_recv().is_err(),
        "channel must receive exactly one signal"
    );
}

#[test]
fn test_accessors_reflect_launch_configuration() {
    let flow = launch(LaunchConfig::new("app.auth")).unwrap();

    assert_eq!(flow.account_type().as_str(), "app.auth");
    assert!(
        flow.requested_credential_type().is_none(),
        "no credential type was requested"
    );

    let flow = launch(LaunchConfig::new("app.auth").with_credential_type("bearer")).unwrap();
    assert_eq!(
        flow.requested_credential_type().map(|c| c.as_str()),
        Some("bearer")
    );
}

#[test]
fn test_repeated_resolve_registers_exactly_one_account() {
    let registry = Arc::new(MemoryRegistry::new());
    let services = FlowServices {
        registry: registry.clone(),
        credentials: Arc::new(loginforge_core::MemoryCredentialStore::new()),
        attributes: registry.clone(),
        owners: registry.clone(),
    };
    let flow = LoginFlow::initialize(LaunchConfig::new("app.auth"), services).unwrap();

    let first = flow.resolve_or_create("alice").unwrap();
    let second = flow.resolve_or_create("alice").unwrap();

    assert_eq!(first, second, "both calls must return the same identity");
    let registered = registry.list_by_type(&AccountType::new("app.auth")).unwrap();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].name, "alice");
}

/// Owner store double that counts activations.
struct CountingOwnerStore {
    inner: Arc<MemoryRegistry>,
    activations: AtomicUsize,
}

impl OwnerStore for CountingOwnerStore {
    fn set_active(
        &self,
        account_type: &AccountType,
        account: &Account,
    ) -> Result<(), RegistryError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.inner.set_active(account_type, account)
    }

    fn active(&self, account_type: &AccountType) -> Result<Option<Account>, RegistryError> {
        self.inner.active(account_type)
    }
}

#[tokio::test]
async fn test_channel_flow_delivers_payload_and_activates_once() {
    let registry = Arc::new(MemoryRegistry::new());
    let owners = Arc::new(CountingOwnerStore {
        inner: registry.clone(),
        activations: AtomicUsize::new(0),
    });
    let services = FlowServices {
        registry: registry.clone(),
        credentials: Arc::new(loginforge_core::MemoryCredentialStore::new()),
        attributes: registry.clone(),
        owners: owners.clone(),
    };

    let (tx, mut rx) = oneshot::channel();
    let config = LaunchConfig::new("app.auth")
        .with_credential_type("bearer")
        .with_response_channel(tx);
    let mut flow = LoginFlow::initialize(config, services).unwrap();

    let account = flow.resolve_or_create("alice").unwrap();
    let creds = Credentials::new("access").with_refresh_token("refresh");
    flow.store_credentials(&account, &CredentialType::new("bearer"), &creds)
        .await
        .unwrap();

    // Channel convention: finalize returns nothing through the implicit path
    let implicit = flow.finalize(&account, true).unwrap();
    assert!(implicit.is_none());

    match rx.try_recv().unwrap() {
        LoginReply::Completed(payload) => {
            assert_eq!(payload.account_type, "app.auth");
            assert_eq!(payload.account_name.as_deref(), Some("alice"));
        }
        other => panic!("expected completion, got {:?}", other),
    }

    assert_eq!(owners.activations.load(Ordering::SeqCst), 1);
    assert_eq!(
        registry.active(&AccountType::new("app.auth")).unwrap().unwrap(),
        account
    );

    // Repeated teardown neither re-sends nor errors
    assert!(flow.teardown().is_none());
    assert!(flow.teardown().is_none());
    assert!(rx.try_recv().is_err());
    assert_eq!(owners.activations.load(Ordering::SeqCst), 1);
}

#[test]
fn test_abandoned_flow_delivers_implicit_cancellation_once() {
    let mut flow = launch(LaunchConfig::new("app.auth")).unwrap();

    assert_eq!(flow.teardown(), Some(LoginResult::Canceled));
    assert_eq!(flow.teardown(), None);
    assert_eq!(flow.teardown(), None);
}

#[test]
fn test_deferred_finalize_reflects_account_at_later_teardown() {
    let mut flow = launch(LaunchConfig::new("app.auth")).unwrap();
    let account = flow.resolve_or_create("alice").unwrap();

    // Caller keeps the flow open, e.g. for a confirmation screen
    let result = flow.finalize(&account, false).unwrap();
    assert!(result.is_none(), "teardown was deferred");

    let result = flow.teardown();
    assert_eq!(
        result,
        Some(LoginResult::Success {
            account_type: AccountType::new("app.auth"),
            account_name: "alice".to_string(),
        })
    );
    assert_eq!(flow.teardown(), None);
}

#[test]
fn test_finalize_after_teardown_is_ignored() {
    let mut flow = launch(LaunchConfig::new("app.auth")).unwrap();
    let account = flow.resolve_or_create("alice").unwrap();

    assert_eq!(flow.teardown(), Some(LoginResult::Canceled));

    // The session already answered; a late finalize must not produce a
    // second, contradictory result.
    let result = flow.finalize(&account, true).unwrap();
    assert!(result.is_none());
}

/// Credential store double whose writes always fail.
struct FailingCredentialStore;

#[async_trait]
impl CredentialStore for FailingCredentialStore {
    async fn put(
        &self,
        _account: &Account,
        _credential_type: &CredentialType,
        _credentials: &Credentials,
    ) -> Result<(), StoreError> {
        Err(StoreError::BackendError {
            message: "disk full".to_string(),
        })
    }

    async fn get(
        &self,
        _account: &Account,
        _credential_type: &CredentialType,
    ) -> Result<Option<Credentials>, StoreError> {
        Ok(None)
    }

    async fn delete(
        &self,
        _account: &Account,
        _credential_type: &CredentialType,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_storage_failure_rollback_leaves_no_orphan_account() {
    let registry = Arc::new(MemoryRegistry::new());
    let services = FlowServices {
        registry: registry.clone(),
        credentials: Arc::new(FailingCredentialStore),
        attributes: registry.clone(),
        owners: registry.clone(),
    };

    let (tx, mut rx) = oneshot::channel();
    let config = LaunchConfig::new("app.auth").with_response_channel(tx);
    let mut flow = LoginFlow::initialize(config, services).unwrap();

    let account = flow.resolve_or_create("alice").unwrap();
    let result = flow
        .store_credentials(&account, &CredentialType::new("bearer"), &Credentials::new("t"))
        .await;
    assert!(matches!(result, Err(FlowError::Storage(_))));

    // The UI collaborator abandons: roll back the account, then tear down
    flow.remove_account(&account).unwrap();
    assert!(
        registry.list_by_type(&AccountType::new("app.auth")).unwrap().is_empty(),
        "no orphan account may remain"
    );

    assert!(flow.teardown().is_none());
    match rx.try_recv().unwrap() {
        LoginReply::Canceled { code } => assert_eq!(code, ERROR_CODE_CANCELED),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_attributes_persist_independently_of_credential_type() {
    let registry = Arc::new(MemoryRegistry::new());
    let services = FlowServices {
        registry: registry.clone(),
        credentials: Arc::new(loginforge_core::MemoryCredentialStore::new()),
        attributes: registry.clone(),
        owners: registry.clone(),
    };
    let flow = LoginFlow::initialize(LaunchConfig::new("app.auth"), services).unwrap();
    let account = flow.resolve_or_create("alice").unwrap();

    // No credential write happens in this flow at all
    flow.store_attribute(&account, "server", Some("https://example.com"))
        .unwrap();
    flow.store_attribute(&account, "realm", Some("corp")).unwrap();
    flow.store_attribute(&account, "realm", None).unwrap();

    assert_eq!(
        registry.attribute(&account, "server").unwrap().as_deref(),
        Some("https://example.com")
    );
    assert!(registry.attribute(&account, "realm").unwrap().is_none());
}
