//! Topic membership — bulk subscribe/unsubscribe of device tokens.

use std::sync::Arc;

use pushrelay_core::types::DispatchResult;
use pushrelay_provider::PushProvider;

/// Bulk add/remove of device tokens to a named topic. Each operation is a
/// single provider round-trip; no local transaction spans them.
pub struct TopicManager {
    provider: Arc<dyn PushProvider>,
}

impl TopicManager {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Subscribe tokens to a topic. An empty token list is passed through
    /// to the provider unchanged.
    pub async fn subscribe(&self, tokens: &[String], topic: &str) -> DispatchResult {
        if topic.trim().is_empty() {
            return DispatchResult::failure("empty topic name");
        }
        match self.provider.subscribe_topic(tokens, topic).await {
            Ok(outcome) => {
                tracing::info!(
                    "Topic '{topic}' subscribe: {} ok, {} failed",
                    outcome.success_count,
                    outcome.failure_count
                );
                DispatchResult::batch(outcome.success_count, outcome.failure_count)
            }
            Err(e) => {
                tracing::error!("Topic '{topic}' subscribe failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }

    /// Unsubscribe tokens from a topic.
    pub async fn unsubscribe(&self, tokens: &[String], topic: &str) -> DispatchResult {
        if topic.trim().is_empty() {
            return DispatchResult::failure("empty topic name");
        }
        match self.provider.unsubscribe_topic(tokens, topic).await {
            Ok(outcome) => {
                tracing::info!(
                    "Topic '{topic}' unsubscribe: {} ok, {} failed",
                    outcome.success_count,
                    outcome.failure_count
                );
                DispatchResult::batch(outcome.success_count, outcome.failure_count)
            }
            Err(e) => {
                tracing::error!("Topic '{topic}' unsubscribe failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }
}
