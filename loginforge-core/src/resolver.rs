//! Account resolution against the backing registry.

use std::sync::Arc;
use tracing::{debug, info};

use crate::model::{Account, AccountType};
use crate::registry::{AccountRegistry, RegistryError};

/// Resolves account names to registered accounts within one account type.
///
/// `resolve_or_create` is an idempotent upsert-by-name: however many times a
/// failed login is retried with the same name, at most one account per
/// `(account_type, name)` pair ever exists. Duplicate suppression lives
/// here, not in the registry.
pub struct AccountResolver {
    account_type: AccountType,
    registry: Arc<dyn AccountRegistry>,
}

impl AccountResolver {
    /// Create a resolver bound to one account type.
    pub fn new(account_type: AccountType, registry: Arc<dyn AccountRegistry>) -> Self {
        Self {
            account_type,
            registry,
        }
    }

    /// The account type this resolver operates on.
    pub fn account_type(&self) -> &AccountType {
        &self.account_type
    }

    /// Look up an existing account by name, or create and register a new one.
    ///
    /// An existing account is returned unchanged. A lost race on `register`
    /// (the registry reports the pair already exists) resolves by re-listing;
    /// the registered record wins.
    pub fn resolve_or_create(&self, name: &str) -> Result<Account, RegistryError> {
        if let Some(existing) = self.find(name)? {
            debug!(account = %existing.key(), "resolved existing account");
            return Ok(existing);
        }

        let account = Account::new(name, self.account_type.clone());
        match self.registry.register(account.clone()) {
            Ok(()) => {
                info!(account = %account.key(), "registered new account");
                Ok(account)
            }
            Err(RegistryError::AlreadyExists { .. }) => {
                debug!(account = %account.key(), "lost registration race, using registered account");
                self.find(name)?.ok_or_else(|| RegistryError::NotFound {
                    account_type: self.account_type.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Unregister an account, rolling back a partially-completed login.
    ///
    /// Removing an account that is not registered is a no-op.
    pub fn remove(&self, account: &Account) -> Result<(), RegistryError> {
        match self.registry.unregister(account) {
            Ok(()) => {
                info!(account = %account.key(), "unregistered account");
                Ok(())
            }
            Err(RegistryError::NotFound { .. }) => {
                debug!(account = %account.key(), "account already absent, nothing to remove");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn find(&self, name: &str) -> Result<Option<Account>, RegistryError> {
        Ok(self
            .registry
            .list_by_type(&self.account_type)?
            .into_iter()
            .find(|a| a.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;

    fn test_resolver() -> (AccountResolver, Arc<MemoryRegistry>) {
        let registry = Arc::new(MemoryRegistry::new());
        let resolver = AccountResolver::new(AccountType::new("app.auth"), registry.clone());
        (resolver, registry)
    }

    #[test]
    fn test_creates_account_on_first_resolve() {
        let (resolver, registry) = test_resolver();

        let account = resolver.resolve_or_create("alice").unwrap();
        assert_eq!(account.name, "alice");
        assert_eq!(account.account_type.as_str(), "app.auth");

        let registered = registry.list_by_type(&AccountType::new("app.auth")).unwrap();
        assert_eq!(registered.len(), 1);
    }

    #[test]
    fn test_repeated_resolve_registers_exactly_one_account() {
        let (resolver, registry) = test_resolver();

        let first = resolver.resolve_or_create("alice").unwrap();
        let second = resolver.resolve_or_create("alice").unwrap();
        let third = resolver.resolve_or_create("alice").unwrap();

        assert_eq!(first, second);
        assert_eq!(second, third);

        let registered = registry.list_by_type(&AccountType::new("app.auth")).unwrap();
        assert_eq!(registered.len(), 1, "retries must not create duplicates");
    }

    #[test]
    fn test_distinct_names_create_distinct_accounts() {
        let (resolver, registry) = test_resolver();

        resolver.resolve_or_create("alice").unwrap();
        resolver.resolve_or_create("bob").unwrap();

        let registered = registry.list_by_type(&AccountType::new("app.auth")).unwrap();
        assert_eq!(registered.len(), 2);
    }

    #[test]
    fn test_resolve_ignores_other_account_types() {
        let (resolver, registry) = test_resolver();

        registry
            .register(Account::new("alice", AccountType::new("other.auth")))
            .unwrap();

        let account = resolver.resolve_or_create("alice").unwrap();
        assert_eq!(account.account_type.as_str(), "app.auth");
        assert_eq!(
            registry.list_by_type(&AccountType::new("other.auth")).unwrap().len(),
            1
        );
    }

    /// Registry double where another writer always wins the register race.
    struct ContendedRegistry {
        inner: MemoryRegistry,
    }

    impl AccountRegistry for ContendedRegistry {
        fn list_by_type(&self, account_type: &AccountType) -> Result<Vec<Account>, RegistryError> {
            self.inner.list_by_type(account_type)
        }

        fn register(&self, account: Account) -> Result<(), RegistryError> {
            let err = RegistryError::AlreadyExists {
                account_type: account.account_type.to_string(),
                name: account.name.clone(),
            };
            let _ = self.inner.register(account);
            Err(err)
        }

        fn unregister(&self, account: &Account) -> Result<(), RegistryError> {
            self.inner.unregister(account)
        }
    }

    #[test]
    fn test_lost_registration_race_returns_registered_account() {
        let registry = Arc::new(ContendedRegistry {
            inner: MemoryRegistry::new(),
        });
        let resolver = AccountResolver::new(AccountType::new("app.auth"), registry.clone());

        let account = resolver.resolve_or_create("alice").unwrap();
        assert_eq!(account.name, "alice");
        assert_eq!(
            registry.list_by_type(&AccountType::new("app.auth")).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_remove_is_noop_for_unregistered_account() {
        let (resolver, _registry) = test_resolver();

        let ghost = Account::new("ghost", AccountType::new("app.auth"));
        resolver.remove(&ghost).unwrap();
    }

    #[test]
    fn test_remove_then_resolve_recreates() {
        let (resolver, registry) = test_resolver();

        let account = resolver.resolve_or_create("alice").unwrap();
        resolver.remove(&account).unwrap();
        assert!(registry.list_by_type(&AccountType::new("app.auth")).unwrap().is_empty());

        let recreated = resolver.resolve_or_create("alice").unwrap();
        assert_eq!(recreated.name, "alice");
    }
}
