//! Push dispatcher — translates notification requests into provider calls
//! and normalizes provider responses into [`DispatchResult`].

use std::collections::HashMap;
use std::sync::Arc;

use pushrelay_core::types::{DispatchResult, NotificationPayload};
use pushrelay_provider::{MessageTarget, ProviderMessage, PushProvider};

use crate::invalidation::{InvalidationHook, LogOnlyInvalidator};
use crate::pacer::{Pacer, TokioPacer};

/// Provider ceiling for one multicast call.
pub const MAX_BATCH_SIZE: usize = 1000;

pub struct Dispatcher {
    pub(crate) provider: Arc<dyn PushProvider>,
    pub(crate) invalidator: Arc<dyn InvalidationHook>,
    pub(crate) pacer: Arc<dyn Pacer>,
}

impl Dispatcher {
    /// Dispatcher with the default log-only invalidation hook and real
    /// inter-batch pacing.
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self::with_hooks(
            provider,
            Arc::new(LogOnlyInvalidator),
            Arc::new(TokioPacer::default()),
        )
    }

    pub fn with_hooks(
        provider: Arc<dyn PushProvider>,
        invalidator: Arc<dyn InvalidationHook>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            provider,
            invalidator,
            pacer,
        }
    }

    /// Build the provider message for a payload, stamping the send-time
    /// `timestamp` key (epoch millis). A caller-supplied `timestamp` key is
    /// overwritten.
    fn build_message(payload: &NotificationPayload) -> ProviderMessage {
        let mut data = payload.data.clone();
        data.insert(
            "timestamp".into(),
            chrono::Utc::now().timestamp_millis().to_string(),
        );
        ProviderMessage::notification(&payload.title, &payload.body, payload.priority)
            .with_data(data)
    }

    /// Send one notification to a single device token.
    pub async fn send_to_device(
        &self,
        token: &str,
        payload: &NotificationPayload,
    ) -> DispatchResult {
        if let Err(e) = payload.validate() {
            return DispatchResult::failure(e.to_string());
        }

        let message = Self::build_message(payload);
        let target = MessageTarget::Token(token.to_string());

        match self.provider.send(&target, &message).await {
            Ok(outcome) => {
                if let Some(message_id) = outcome.message_id {
                    tracing::info!("Push delivered, message id {message_id}");
                    return DispatchResult::success(message_id);
                }
                let error = outcome
                    .error
                    .unwrap_or_else(|| pushrelay_provider::SendError::new("UNKNOWN", "no outcome"));
                tracing::error!("Push to device failed: {} ({})", error.message, error.code);
                if error.is_invalid_token() {
                    self.invalidator.invalidate(&[token.to_string()]);
                }
                DispatchResult::failure(error.message)
            }
            Err(e) => {
                tracing::error!("Push to device failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }

    /// Send one notification to many device tokens.
    ///
    /// Empty lists are rejected without a provider call. Lists above
    /// [`MAX_BATCH_SIZE`] are split into fixed windows (see
    /// [`crate::batch`]); anything else is one multicast round-trip.
    pub async fn send_to_many(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> DispatchResult {
        if tokens.is_empty() {
            return DispatchResult::failure("empty recipient list");
        }
        if let Err(e) = payload.validate() {
            return DispatchResult::failure(e.to_string());
        }

        if tokens.len() > MAX_BATCH_SIZE {
            return self.send_in_batches(tokens, payload).await;
        }

        match self.multicast_once(tokens, payload).await {
            Ok((success_count, failure_count)) => {
                DispatchResult::batch(success_count, failure_count)
            }
            Err(e) => {
                tracing::error!("Multicast push failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }

    /// One multicast round-trip for a window of at most [`MAX_BATCH_SIZE`]
    /// tokens. Failed entries are reported to the invalidation hook using
    /// the positional correspondence guaranteed by the provider.
    pub(crate) async fn multicast_once(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> pushrelay_core::Result<(u32, u32)> {
        let message = Self::build_message(payload);
        let outcome = self.provider.send_multicast(tokens, &message).await?;

        if outcome.failure_count > 0 {
            let mut failed = Vec::new();
            for (token, response) in tokens.iter().zip(outcome.responses.iter()) {
                if let Some(error) = &response.error {
                    tracing::error!("Token {token} send failed: {}", error.message);
                    failed.push(token.clone());
                }
            }
            self.invalidator.invalidate(&failed);
        }

        tracing::info!(
            "Multicast complete: {} delivered, {} failed",
            outcome.success_count,
            outcome.failure_count
        );
        Ok((outcome.success_count, outcome.failure_count))
    }

    /// Send one notification to every device subscribed to a topic.
    /// Topic fan-out is the provider's responsibility; no batching applies.
    pub async fn send_to_topic(&self, topic: &str, payload: &NotificationPayload) -> DispatchResult {
        if topic.trim().is_empty() {
            return DispatchResult::failure("empty topic name");
        }
        if let Err(e) = payload.validate() {
            return DispatchResult::failure(e.to_string());
        }

        let message = Self::build_message(payload);
        let target = MessageTarget::Topic(topic.to_string());

        match self.provider.send(&target, &message).await {
            Ok(outcome) => {
                if let Some(message_id) = outcome.message_id {
                    tracing::info!("Topic push delivered to '{topic}', message id {message_id}");
                    return DispatchResult::success(message_id);
                }
                let error = outcome
                    .error
                    .unwrap_or_else(|| pushrelay_provider::SendError::new("UNKNOWN", "no outcome"));
                tracing::error!("Topic push to '{topic}' failed: {}", error.message);
                DispatchResult::failure(error.message)
            }
            Err(e) => {
                tracing::error!("Topic push to '{topic}' failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }

    /// Send a data-only message (no visible notification; the app decides
    /// what to do with it).
    pub async fn send_data(&self, token: &str, data: HashMap<String, String>) -> DispatchResult {
        let mut data = data;
        data.insert(
            "timestamp".into(),
            chrono::Utc::now().timestamp_millis().to_string(),
        );
        let message = ProviderMessage::data_only(data);
        let target = MessageTarget::Token(token.to_string());

        match self.provider.send(&target, &message).await {
            Ok(outcome) => {
                if let Some(message_id) = outcome.message_id {
                    tracing::info!("Data message delivered, message id {message_id}");
                    return DispatchResult::success(message_id);
                }
                let error = outcome
                    .error
                    .unwrap_or_else(|| pushrelay_provider::SendError::new("UNKNOWN", "no outcome"));
                tracing::error!("Data message failed: {}", error.message);
                if error.is_invalid_token() {
                    self.invalidator.invalidate(&[token.to_string()]);
                }
                DispatchResult::failure(error.message)
            }
            Err(e) => {
                tracing::error!("Data message failed: {e}");
                DispatchResult::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockProvider, NoopPacer, RecordingInvalidator, SendReply};
    use pushrelay_core::types::Priority;
    use pushrelay_provider::SendError;

    fn dispatcher_with(
        provider: Arc<MockProvider>,
        invalidator: Arc<RecordingInvalidator>,
    ) -> Dispatcher {
        Dispatcher::with_hooks(provider, invalidator, Arc::new(NoopPacer::default()))
    }

    #[tokio::test]
    async fn single_send_builds_expected_message() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Ok("msg-42".into()));
        let invalidator = Arc::new(RecordingInvalidator::default());
        let dispatcher = dispatcher_with(provider.clone(), invalidator);

        let payload = NotificationPayload::new("Standup", "9am").with_priority(Priority::High);
        let result = dispatcher.send_to_device("tok-1", &payload).await;

        assert_eq!(result, DispatchResult::success("msg-42"));
        let sends = provider.sends();
        assert_eq!(sends.len(), 1);
        let (target, message) = &sends[0];
        assert_eq!(*target, MessageTarget::Token("tok-1".into()));
        let notification = message.notification.as_ref().unwrap();
        assert_eq!(notification.title, "Standup");
        assert_eq!(notification.body, "9am");
        assert_eq!(message.android.priority, Priority::High);
        assert!(message.data.contains_key("timestamp"));
    }

    #[tokio::test]
    async fn timestamp_overwrites_caller_key_and_never_decreases() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Ok("m1".into()));
        provider.script_send(SendReply::Ok("m2".into()));
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let mut data = HashMap::new();
        data.insert("timestamp".to_string(), "0".to_string());
        let payload = NotificationPayload::new("t", "b").with_data(data);

        dispatcher.send_to_device("tok", &payload).await;
        dispatcher.send_to_device("tok", &payload).await;

        let sends = provider.sends();
        let first: i64 = sends[0].1.data["timestamp"].parse().unwrap();
        let second: i64 = sends[1].1.data["timestamp"].parse().unwrap();
        assert!(first > 0, "caller-supplied timestamp must be overwritten");
        assert!(second >= first);
    }

    #[tokio::test]
    async fn invalid_token_error_fires_hook_and_returns_failure() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Err(SendError::new("UNREGISTERED", "token gone")));
        let invalidator = Arc::new(RecordingInvalidator::default());
        let dispatcher = dispatcher_with(provider, invalidator.clone());

        let payload = NotificationPayload::new("t", "b");
        let result = dispatcher.send_to_device("dead-token", &payload).await;

        assert_eq!(result, DispatchResult::failure("token gone"));
        assert_eq!(invalidator.calls(), vec![vec!["dead-token".to_string()]]);
    }

    #[tokio::test]
    async fn non_token_error_does_not_fire_hook() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Err(SendError::new("UNAVAILABLE", "busy")));
        let invalidator = Arc::new(RecordingInvalidator::default());
        let dispatcher = dispatcher_with(provider, invalidator.clone());

        let result = dispatcher
            .send_to_device("tok", &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::failure("busy"));
        assert!(invalidator.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_recipient_list_skips_provider() {
        let provider = Arc::new(MockProvider::default());
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let result = dispatcher
            .send_to_many(&[], &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::failure("empty recipient list"));
        assert_eq!(provider.multicast_call_count(), 0);
        assert_eq!(provider.send_call_count(), 0);
    }

    #[tokio::test]
    async fn empty_title_rejected_before_provider() {
        let provider = Arc::new(MockProvider::default());
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let tokens = vec!["tok".to_string()];
        let result = dispatcher
            .send_to_many(&tokens, &NotificationPayload::new("", "b"))
            .await;

        assert!(!result.is_success());
        assert_eq!(provider.multicast_call_count(), 0);
    }

    #[tokio::test]
    async fn multicast_counts_match_recipients() {
        let provider = Arc::new(MockProvider::default());
        provider.script_multicast_fail_indices(vec![1, 4]);
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let tokens: Vec<String> = (0..7).map(|i| format!("tok-{i}")).collect();
        let result = dispatcher
            .send_to_many(&tokens, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::batch(5, 2));
    }

    #[tokio::test]
    async fn multicast_failure_invalidates_matching_token() {
        let provider = Arc::new(MockProvider::default());
        provider.script_multicast_fail_indices(vec![3]);
        let invalidator = Arc::new(RecordingInvalidator::default());
        let dispatcher = dispatcher_with(provider, invalidator.clone());

        let tokens: Vec<String> = (0..6).map(|i| format!("tok-{i}")).collect();
        let result = dispatcher
            .send_to_many(&tokens, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::batch(5, 1));
        assert_eq!(invalidator.calls(), vec![vec!["tok-3".to_string()]]);
    }

    #[tokio::test]
    async fn topic_send_targets_topic() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Ok("topic-msg".into()));
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let result = dispatcher
            .send_to_topic("updates", &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::success("topic-msg"));
        let sends = provider.sends();
        assert_eq!(sends[0].0, MessageTarget::Topic("updates".into()));
    }

    #[tokio::test]
    async fn empty_topic_rejected() {
        let provider = Arc::new(MockProvider::default());
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let result = dispatcher
            .send_to_topic("  ", &NotificationPayload::new("t", "b"))
            .await;

        assert!(!result.is_success());
        assert_eq!(provider.send_call_count(), 0);
    }

    #[tokio::test]
    async fn data_message_has_no_notification_block() {
        let provider = Arc::new(MockProvider::default());
        provider.script_send(SendReply::Ok("data-msg".into()));
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let mut data = HashMap::new();
        data.insert("action".to_string(), "sync".to_string());
        let result = dispatcher.send_data("tok", data).await;

        assert_eq!(result, DispatchResult::success("data-msg"));
        let sends = provider.sends();
        let message = &sends[0].1;
        assert!(message.notification.is_none());
        assert_eq!(message.data["action"], "sync");
        assert!(message.data.contains_key("timestamp"));
    }

    #[tokio::test]
    async fn transport_error_becomes_failure() {
        let provider = Arc::new(MockProvider::default());
        provider.script_multicast_transport_error("connection refused");
        let dispatcher =
            dispatcher_with(provider.clone(), Arc::new(RecordingInvalidator::default()));

        let tokens = vec!["tok".to_string()];
        let result = dispatcher
            .send_to_many(&tokens, &NotificationPayload::new("t", "b"))
            .await;

        assert!(!result.is_success());
    }
}
