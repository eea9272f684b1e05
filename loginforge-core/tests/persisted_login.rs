//! Integration tests for a login session over the disk-backed registry.
//!
//! Verifies that a completed flow leaves durable state: the registered
//! account, its attributes, and the active-owner selection all survive a
//! registry reload, while credentials stay in their own store.

use std::sync::Arc;

use loginforge_core::{
    AccountRegistry, AccountType, AttributeStore, CredentialStore, CredentialType, Credentials,
    FileRegistry, FlowServices, LaunchConfig, LoginFlow, LoginResult, MemoryCredentialStore,
    OwnerStore,
};
use tempfile::TempDir;

fn file_services(registry: Arc<FileRegistry>) -> FlowServices {
    FlowServices {
        registry: registry.clone(),
        credentials: Arc::new(MemoryCredentialStore::new()),
        attributes: registry.clone(),
        owners: registry,
    }
}

#[tokio::test]
async fn test_completed_login_survives_registry_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("accounts.json");
    let account_type = AccountType::new("app.auth");

    // Run a complete interactive session against the file backend
    {
        let registry = Arc::new(FileRegistry::load_from_path(path.clone()).unwrap());
        let credentials: Arc<MemoryCredentialStore> = Arc::new(MemoryCredentialStore::new());
        let services = FlowServices {
            registry: registry.clone(),
            credentials: credentials.clone(),
            attributes: registry.clone(),
            owners: registry.clone(),
        };

        let config = LaunchConfig::new("app.auth").with_credential_type("bearer");
        let mut flow = LoginFlow::initialize(config, services).unwrap();

        let account = flow.resolve_or_create("alice").unwrap();
        flow.store_attribute(&account, "server", Some("https://example.com"))
            .unwrap();
        let creds = Credentials::new("access").with_refresh_token("refresh");
        flow.store_credentials(&account, &CredentialType::new("bearer"), &creds)
            .await
            .unwrap();

        let result = flow.finalize(&account, true).unwrap();
        assert!(matches!(result, Some(LoginResult::Success { .. })));

        let stored = credentials
            .get(&account, &CredentialType::new("bearer"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.access_token.expose(), "access");
    }

    // Reload the registry file and verify the durable side of the session
    {
        let registry = FileRegistry::load_from_path(path).unwrap();

        let accounts = registry.list_by_type(&account_type).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "alice");

        let active = registry.active(&account_type).unwrap().unwrap();
        assert_eq!(active.name, "alice");

        assert_eq!(
            registry.attribute(&accounts[0], "server").unwrap().as_deref(),
            Some("https://example.com")
        );
    }
}

#[test]
fn test_relogin_reuses_registered_account() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("accounts.json");
    let account_type = AccountType::new("app.auth");

    // First session registers the account
    {
        let registry = Arc::new(FileRegistry::load_from_path(path.clone()).unwrap());
        let mut flow =
            LoginFlow::initialize(LaunchConfig::new("app.auth"), file_services(registry)).unwrap();
        let account = flow.resolve_or_create("alice").unwrap();
        flow.finalize(&account, true).unwrap();
    }

    // A later session resolving the same name must not create a duplicate
    {
        let registry = Arc::new(FileRegistry::load_from_path(path.clone()).unwrap());
        let mut flow = LoginFlow::initialize(
            LaunchConfig::new("app.auth"),
            file_services(registry.clone()),
        )
        .unwrap();
        let account = flow.resolve_or_create("alice").unwrap();
        assert_eq!(account.name, "alice");
        flow.finalize(&account, true).unwrap();

        assert_eq!(registry.list_by_type(&account_type).unwrap().len(), 1);
    }
}

#[test]
fn test_abandoned_session_leaves_registry_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("accounts.json");
    let account_type = AccountType::new("app.auth");

    {
        let registry = Arc::new(FileRegistry::load_from_path(path.clone()).unwrap());
        let mut flow = LoginFlow::initialize(
            LaunchConfig::new("app.auth"),
            file_services(registry.clone()),
        )
        .unwrap();

        // The user backs out after the account was created
        let account = flow.resolve_or_create("alice").unwrap();
        flow.remove_account(&account).unwrap();
        assert_eq!(flow.teardown(), Some(LoginResult::Canceled));
    }

    let registry = FileRegistry::load_from_path(path).unwrap();
    assert!(registry.list_by_type(&account_type).unwrap().is_empty());
    assert!(registry.active(&account_type).unwrap().is_none());
}
