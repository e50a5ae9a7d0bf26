//! Push provider trait and outcome types.

use async_trait::async_trait;
use pushrelay_core::Result;

use crate::message::{MessageTarget, ProviderMessage};

/// Provider-reported error for one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError {
    /// Provider error code, e.g. "UNREGISTERED".
    pub code: String,
    pub message: String,
}

impl SendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the device token is no longer usable and
    /// should be handed to the invalidation hook.
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self.code.as_str(),
            "UNREGISTERED"
                | "NOT_FOUND"
                | "registration-token-not-registered"
                | "invalid-registration-token"
        )
    }
}

/// Outcome of one provider send: a message id, or an error with a code.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message_id: Option<String>,
    pub error: Option<SendError>,
}

impl SendOutcome {
    pub fn ok(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn err(error: SendError) -> Self {
        Self {
            message_id: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.message_id.is_some()
    }
}

/// Aggregate outcome of a multicast send.
///
/// `responses` is positionally aligned with the token list that was
/// submitted; callers rely on that correspondence to identify failed tokens.
#[derive(Debug, Clone)]
pub struct MulticastOutcome {
    pub responses: Vec<SendOutcome>,
    pub success_count: u32,
    pub failure_count: u32,
}

impl MulticastOutcome {
    pub fn from_responses(responses: Vec<SendOutcome>) -> Self {
        let success_count = responses.iter().filter(|r| r.is_success()).count() as u32;
        let failure_count = responses.len() as u32 - success_count;
        Self {
            responses,
            success_count,
            failure_count,
        }
    }
}

/// Aggregate outcome of a topic subscribe/unsubscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutcome {
    pub success_count: u32,
    pub failure_count: u32,
}

/// The provider send primitive.
///
/// One long-lived, thread-safe implementation is constructed at process
/// start and shared (via `Arc`) by every dispatcher; implementations must
/// not keep per-call mutable state.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Send one message to a token or topic.
    ///
    /// `Ok` carries the provider's verdict (success with a message id, or a
    /// provider-reported error with a code); `Err` is reserved for transport
    /// and protocol failures.
    async fn send(&self, target: &MessageTarget, message: &ProviderMessage)
    -> Result<SendOutcome>;

    /// Send one message to many tokens, preserving input order in the
    /// per-token responses.
    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &ProviderMessage,
    ) -> Result<MulticastOutcome>;

    /// Subscribe tokens to a topic.
    async fn subscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome>;

    /// Unsubscribe tokens from a topic.
    async fn unsubscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome>;
}
