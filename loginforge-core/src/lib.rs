//! # Loginforge Core
//!
//! Core library for the Loginforge interactive-login flow controller.
//!
//! This crate provides:
//! - A strict, small flow state machine with exactly-once terminal result
//!   delivery across two caller conventions (explicit response channel vs.
//!   implicit return value)
//! - Idempotent account resolution (upsert-by-name within an account type)
//! - Credential and attribute persistence seams with in-memory and
//!   (optionally) keyring-based implementations
//! - Disk-backed and in-memory account registries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use loginforge_core::{Credentials, CredentialType, FlowServices, LaunchConfig, LoginFlow};
//!
//! async fn login(services: FlowServices) -> Result<(), loginforge_core::FlowError> {
//!     let config = LaunchConfig::new("app.auth").with_credential_type("bearer");
//!     let mut flow = LoginFlow::initialize(config, services)?;
//!
//!     // ... UI collects username/password, exchanges them for tokens ...
//!     let account = flow.resolve_or_create("alice")?;
//!     let creds = Credentials::new("access-token").with_refresh_token("refresh-token");
//!     flow.store_credentials(&account, &CredentialType::new("bearer"), &creds).await?;
//!
//!     flow.finalize(&account, true)?;
//!     Ok(())
//! }
//! ```

pub mod model;
pub mod config;
pub mod store;
pub mod registry;
pub mod resolver;
pub mod persist;
pub mod report;
pub mod flow;
pub mod error;

// Re-export commonly used types at crate root
pub use model::{
    Account,
    AccountType,
    CredentialType,
    Credentials,
    ResultPayload,
};

pub use config::{
    ConfigError,
    LaunchConfig,
};

pub use store::{
    AttributeStore,
    CredentialStore,
    MemoryCredentialStore,
    Secret,
    StoreError,
    create_credential_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringCredentialStore;

pub use registry::{
    AccountRegistry,
    FileRegistry,
    MemoryRegistry,
    OwnerStore,
    RegistryError,
};

pub use resolver::AccountResolver;

pub use persist::CredentialPersister;

pub use report::{
    ERROR_CODE_CANCELED,
    LoginReply,
    LoginResult,
    ResultReporter,
};

pub use flow::{
    FlowServices,
    LoginFlow,
    OwnerSwitch,
};

pub use error::FlowError;
