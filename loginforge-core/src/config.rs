//! Launch configuration for a login flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::report::LoginReply;

/// Error type for launch configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required launch option is missing.
    #[error("missing required launch option: {key}")]
    MissingOption { key: &'static str },
}

/// Configuration a login flow is launched with.
///
/// `account_type` is required at initialization; `credential_type` is purely
/// informational to the UI collaborator. The response channel is a runtime
/// handle and never crosses a serialization boundary, so it is skipped the
/// same way other runtime-only fields are.
///
/// # Examples
///
/// ```
/// use loginforge_core::LaunchConfig;
///
/// let config = LaunchConfig::new("app.auth").with_credential_type("bearer");
/// assert_eq!(config.account_type.as_deref(), Some("app.auth"));
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Namespace for account resolution. Absence is a fatal configuration error.
    #[serde(default)]
    pub account_type: Option<String>,

    /// Kind of credential the requester is interested in.
    #[serde(default)]
    pub credential_type: Option<String>,

    /// Continuation handle of an external requester awaiting the terminal
    /// result. When absent, the flow uses the implicit return convention.
    #[serde(skip)]
    pub response_channel: Option<oneshot::Sender<LoginReply>>,
}

impl LaunchConfig {
    /// Create a launch configuration for the given account type.
    pub fn new(account_type: impl Into<String>) -> Self {
        Self {
            account_type: Some(account_type.into()),
            ..Self::default()
        }
    }

    /// Set the requested credential type.
    pub fn with_credential_type(mut self, credential_type: impl Into<String>) -> Self {
        self.credential_type = Some(credential_type.into());
        self
    }

    /// Attach a response channel for an external requester.
    pub fn with_response_channel(mut self, channel: oneshot::Sender<LoginReply>) -> Self {
        self.response_channel = Some(channel);
        self
    }
}
