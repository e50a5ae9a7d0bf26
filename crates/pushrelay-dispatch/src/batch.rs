//! Fixed-window batch splitting for oversized recipient lists.

use std::time::Duration;

use pushrelay_core::types::{DispatchResult, NotificationPayload};

use crate::dispatcher::{Dispatcher, MAX_BATCH_SIZE};

/// Pause between consecutive batch windows.
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

impl Dispatcher {
    /// Split `tokens` into windows of [`MAX_BATCH_SIZE`] and dispatch them
    /// sequentially, pausing between windows to smooth the request rate.
    ///
    /// A window whose multicast call fails outright counts its full length
    /// as failures, so `success + failure` always equals the number of
    /// recipients submitted.
    pub(crate) async fn send_in_batches(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> DispatchResult {
        let mut total_success = 0u32;
        let mut total_failure = 0u32;

        for (index, window) in tokens.chunks(MAX_BATCH_SIZE).enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }

            match self.multicast_once(window, payload).await {
                Ok((success_count, failure_count)) => {
                    total_success += success_count;
                    total_failure += failure_count;
                }
                Err(e) => {
                    tracing::warn!(
                        "Batch window {index} ({} recipients) failed outright: {e}",
                        window.len()
                    );
                    total_failure += window.len() as u32;
                }
            }
        }

        tracing::info!(
            "Batched send complete: {total_success} delivered, {total_failure} failed across {} window(s)",
            tokens.len().div_ceil(MAX_BATCH_SIZE)
        );
        DispatchResult::batch(total_success, total_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockProvider, RecordingInvalidator, RecordingPacer};
    use std::sync::Arc;

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("tok-{i}")).collect()
    }

    fn dispatcher(provider: Arc<MockProvider>, pacer: Arc<RecordingPacer>) -> Dispatcher {
        Dispatcher::with_hooks(provider, Arc::new(RecordingInvalidator::default()), pacer)
    }

    #[tokio::test]
    async fn windows_preserve_order_and_sizes() {
        let provider = Arc::new(MockProvider::default());
        let pacer = Arc::new(RecordingPacer::default());
        let d = dispatcher(provider.clone(), pacer.clone());

        let input = tokens(2500);
        let result = d
            .send_to_many(&input, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::batch(2500, 0));

        let calls = provider.multicasts();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0.len(), 1000);
        assert_eq!(calls[1].0.len(), 1000);
        assert_eq!(calls[2].0.len(), 500);

        // Concatenating the windows reproduces the input, in order.
        let recombined: Vec<String> = calls.iter().flat_map(|(w, _)| w.clone()).collect();
        assert_eq!(recombined, input);

        // One pause between windows 1→2 and 2→3, none after the last.
        assert_eq!(pacer.pause_count(), 2);
    }

    #[tokio::test]
    async fn aggregates_counts_across_windows() {
        let provider = Arc::new(MockProvider::default());
        // First window all delivered, second window all delivered.
        let pacer = Arc::new(RecordingPacer::default());
        let d = dispatcher(provider.clone(), pacer);

        let input = tokens(1200);
        let result = d
            .send_to_many(&input, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::batch(1200, 0));
        assert_eq!(provider.multicast_call_count(), 2);
    }

    #[tokio::test]
    async fn failed_window_counts_as_failures() {
        let provider = Arc::new(MockProvider::default());
        provider.script_multicast_ok();
        provider.script_multicast_transport_error("provider unreachable");
        let pacer = Arc::new(RecordingPacer::default());
        let d = dispatcher(provider.clone(), pacer);

        let input = tokens(1500);
        let result = d
            .send_to_many(&input, &NotificationPayload::new("t", "b"))
            .await;

        // The second window (500 recipients) never reached the provider;
        // its recipients are counted as failures rather than dropped from
        // the totals, keeping success + failure == len(input).
        assert_eq!(result, DispatchResult::batch(1000, 500));
    }

    #[tokio::test]
    async fn failed_window_does_not_abort_remaining_windows() {
        let provider = Arc::new(MockProvider::default());
        provider.script_multicast_transport_error("provider unreachable");
        provider.script_multicast_ok();
        provider.script_multicast_ok();
        let pacer = Arc::new(RecordingPacer::default());
        let d = dispatcher(provider.clone(), pacer);

        let input = tokens(2500);
        let result = d
            .send_to_many(&input, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(provider.multicast_call_count(), 3);
        assert_eq!(result, DispatchResult::batch(1500, 1000));
    }

    #[tokio::test]
    async fn exactly_max_batch_size_is_not_split() {
        let provider = Arc::new(MockProvider::default());
        let pacer = Arc::new(RecordingPacer::default());
        let d = dispatcher(provider.clone(), pacer.clone());

        let input = tokens(MAX_BATCH_SIZE);
        let result = d
            .send_to_many(&input, &NotificationPayload::new("t", "b"))
            .await;

        assert_eq!(result, DispatchResult::batch(1000, 0));
        assert_eq!(provider.multicast_call_count(), 1);
        assert_eq!(pacer.pause_count(), 0);
    }
}
