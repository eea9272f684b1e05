//! Terminal result delivery.
//!
//! A flow answers its initiator exactly once, through exactly one of two
//! conventions:
//! - an explicit [`LoginReply`] pushed into the requester's response channel
//! - an implicit [`LoginResult`] returned from teardown to the direct caller
//!
//! [`ResultReporter`] owns the accumulated [`ResultPayload`], the single
//! delivery sink, and the `delivered` guard that makes double teardown a
//! silent no-op instead of a double send.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::model::{AccountType, ResultPayload};

/// Error code carried by an explicit cancellation signal.
pub const ERROR_CODE_CANCELED: &str = "canceled";

/// Message delivered through the response channel of an external requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginReply {
    /// The flow finished; the payload carries the account identity on success.
    Completed(ResultPayload),

    /// The flow was abandoned before an account was finalized.
    Canceled {
        /// Always [`ERROR_CODE_CANCELED`].
        code: String,
    },
}

impl LoginReply {
    /// Build the cancellation signal.
    pub fn canceled() -> Self {
        Self::Canceled {
            code: ERROR_CODE_CANCELED.to_string(),
        }
    }
}

/// Result returned implicitly from teardown to a direct interactive caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    /// Login succeeded with the given account identity.
    Success {
        /// The namespace the flow was launched for.
        account_type: AccountType,
        /// The finalized account name.
        account_name: String,
    },

    /// Login was abandoned.
    Canceled,
}

/// Where the terminal result goes. Exactly one sink per flow, chosen at launch.
enum ResultSink {
    /// An external requester awaits an explicit reply.
    ///
    /// A oneshot sender is consumed by `send`; the `Option` only satisfies
    /// that move. The reporter's `delivered` flag is the authoritative guard.
    Channel(Option<oneshot::Sender<LoginReply>>),

    /// A direct caller picks the result up from the teardown return value.
    Implicit,
}

/// Owns the terminal result and guarantees it is delivered exactly once.
pub struct ResultReporter {
    payload: ResultPayload,
    sink: ResultSink,
    delivered: bool,
}

impl ResultReporter {
    /// Create a reporter for a freshly launched flow.
    pub fn new(account_type: &AccountType, channel: Option<oneshot::Sender<LoginReply>>) -> Self {
        Self {
            payload: ResultPayload::new(account_type.as_str()),
            sink: match channel {
                Some(tx) => ResultSink::Channel(Some(tx)),
                None => ResultSink::Implicit,
            },
            delivered: false,
        }
    }

    /// Record the finalized account name in the payload.
    ///
    /// Once set the name is never cleared. Recording after delivery is a
    /// logged no-op.
    pub fn record_success(&mut self, account_name: &str) {
        if self.delivered {
            warn!(
                account_name,
                "terminal result already delivered, ignoring late finalization"
            );
            return;
        }
        self.payload.account_name = Some(account_name.to_string());
    }

    /// Deliver the terminal result through the flow's sink.
    ///
    /// The first call sends a [`LoginReply`] into the response channel (and
    /// returns `None`), or returns `Some(LoginResult)` for the implicit
    /// convention. Every later call does nothing and returns `None`.
    pub fn deliver(&mut self) -> Option<LoginResult> {
        if self.delivered {
            debug!("terminal result already delivered, ignoring teardown");
            return None;
        }
        self.delivered = true;

        match &mut self.sink {
            ResultSink::Channel(tx) => {
                let reply = match self.payload.account_name {
                    Some(_) => LoginReply::Completed(self.payload.clone()),
                    None => LoginReply::canceled(),
                };
                debug!(account_type = %self.payload.account_type, "delivering terminal result via response channel");
                if let Some(tx) = tx.take() {
                    if tx.send(reply).is_err() {
                        warn!("response channel receiver dropped before delivery");
                    }
                }
                None
            }
            ResultSink::Implicit => {
                debug!(account_type = %self.payload.account_type, "delivering implicit terminal result");
                Some(match &self.payload.account_name {
                    Some(name) => LoginResult::Success {
                        account_type: AccountType::new(&self.payload.account_type),
                        account_name: name.clone(),
                    },
                    None => LoginResult::Canceled,
                })
            }
        }
    }

    /// Whether the terminal result has already been delivered.
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// The payload accumulated so far.
    pub fn payload(&self) -> &ResultPayload {
        &self.payload
    }
}

/// Push a cancellation signal into a channel for a flow that never started.
///
/// Used when launch configuration validation fails: the requester must not
/// be left waiting on a flow that will never tear down.
pub(crate) fn notify_canceled(channel: oneshot::Sender<LoginReply>) {
    if channel.send(LoginReply::canceled()).is_err() {
        warn!("response channel receiver dropped before cancellation signal");
    }
}
