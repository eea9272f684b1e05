//! Domain model types for Loginforge.
//!
//! This module defines the core types used throughout the login flow:
//! - [`AccountType`] - Namespace identifier for accounts (e.g., "app.auth")
//! - [`CredentialType`] - Kind of credential requested (e.g., "bearer")
//! - [`Account`] - Account identity within a registry
//! - [`Credentials`] - Secret material handed over by a completed login
//! - [`ResultPayload`] - Terminal result accumulated over the flow's lifetime

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::store::Secret;

/// Namespace identifier for a family of accounts (e.g., "app.auth").
///
/// Account types are opaque, caller-owned strings; they are compared
/// byte-for-byte and never normalized.
///
/// # Examples
///
/// ```
/// use loginforge_core::AccountType;
///
/// let app = AccountType::new("app.auth");
/// assert_eq!(app.as_str(), "app.auth");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountType(String);

impl AccountType {
    /// Create a new account type.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the account type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountType {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Kind of credential requested or stored (e.g., "bearer", "refresh").
///
/// Like [`AccountType`], this is an opaque string; the flow never interprets
/// it beyond using it as part of storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialType(String);

impl CredentialType {
    /// Create a new credential type.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the credential type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CredentialType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CredentialType {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An account identity within a registry.
///
/// Identity is the `(name, account_type)` pair: two accounts with the same
/// pair are the same account. `created_at` is registry bookkeeping and does
/// not participate in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The user-visible account name.
    pub name: String,

    /// The namespace this account belongs to.
    pub account_type: AccountType,

    /// When the account was first registered.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the current timestamp.
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            created_at: Utc::now(),
        }
    }

    /// Create a unique key for this account.
    pub fn key(&self) -> String {
        format!("{}/{}", self.account_type, self.name)
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.account_type == other.account_type
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.account_type.hash(state);
    }
}

/// Secret material obtained from a completed login.
///
/// Transient value object: it is passed into credential persistence and not
/// retained by the flow after the store call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// The access credential.
    pub access_token: Secret,

    /// The refresh credential, if the login produced one.
    pub refresh_token: Option<Secret>,
}

impl Credentials {
    /// Create credentials with just an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: None,
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token));
        self
    }
}

/// The terminal result of a flow, accumulated incrementally.
///
/// `account_type` is fixed at flow start; `account_name` is recorded only on
/// successful finalization. Presence of `account_name` at delivery time is
/// what distinguishes success from cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// The namespace the flow was launched for.
    pub account_type: String,

    /// The resolved account name, present only after finalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

impl ResultPayload {
    /// Create a payload for a freshly launched flow.
    pub fn new(account_type: impl Into<String>) -> Self {
        Self {
            account_type: account_type.into(),
            account_name: None,
        }
    }
}
