//! Top-level error types for Loginforge.

use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::store::StoreError;

/// Top-level error type encompassing all login flow errors.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Required launch configuration is missing or invalid. Fatal to flow
    /// startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the account registry or owner store.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Credential or attribute persistence failed. Surfaced to the UI
    /// collaborator, which decides whether to retry or abandon.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
