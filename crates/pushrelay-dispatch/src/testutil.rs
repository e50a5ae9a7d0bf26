//! Hand-rolled test doubles for the provider, pacer, and invalidation seams.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pushrelay_core::error::{PushRelayError, Result};
use pushrelay_provider::{
    MessageTarget, MulticastOutcome, ProviderMessage, PushProvider, SendError, SendOutcome,
    TopicOutcome,
};

use crate::invalidation::InvalidationHook;
use crate::pacer::Pacer;

/// Scripted reply for a single-target send.
pub(crate) enum SendReply {
    Ok(String),
    Err(SendError),
}

enum MulticastReply {
    AllOk,
    FailIndices(Vec<usize>),
    Transport(String),
}

/// Recording mock provider with scriptable replies. Unscripted calls
/// succeed (every recipient delivered).
#[derive(Default)]
pub(crate) struct MockProvider {
    sends: Mutex<Vec<(MessageTarget, ProviderMessage)>>,
    multicasts: Mutex<Vec<(Vec<String>, ProviderMessage)>>,
    topic_ops: Mutex<Vec<(String, Vec<String>, String)>>,
    send_replies: Mutex<VecDeque<SendReply>>,
    multicast_replies: Mutex<VecDeque<MulticastReply>>,
    topic_replies: Mutex<VecDeque<TopicOutcome>>,
}

impl MockProvider {
    pub fn script_send(&self, reply: SendReply) {
        self.send_replies.lock().unwrap().push_back(reply);
    }

    pub fn script_multicast_ok(&self) {
        self.multicast_replies
            .lock()
            .unwrap()
            .push_back(MulticastReply::AllOk);
    }

    pub fn script_multicast_fail_indices(&self, indices: Vec<usize>) {
        self.multicast_replies
            .lock()
            .unwrap()
            .push_back(MulticastReply::FailIndices(indices));
    }

    pub fn script_multicast_transport_error(&self, message: &str) {
        self.multicast_replies
            .lock()
            .unwrap()
            .push_back(MulticastReply::Transport(message.to_string()));
    }

    pub fn script_topic_counts(&self, success: u32, failure: u32) {
        self.topic_replies.lock().unwrap().push_back(TopicOutcome {
            success_count: success,
            failure_count: failure,
        });
    }

    pub fn sends(&self) -> Vec<(MessageTarget, ProviderMessage)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn multicasts(&self) -> Vec<(Vec<String>, ProviderMessage)> {
        self.multicasts.lock().unwrap().clone()
    }

    pub fn topic_calls(&self) -> Vec<(String, Vec<String>, String)> {
        self.topic_ops.lock().unwrap().clone()
    }

    pub fn send_call_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn multicast_call_count(&self) -> usize {
        self.multicasts.lock().unwrap().len()
    }
}

#[async_trait]
impl PushProvider for MockProvider {
    async fn send(
        &self,
        target: &MessageTarget,
        message: &ProviderMessage,
    ) -> Result<SendOutcome> {
        self.sends
            .lock()
            .unwrap()
            .push((target.clone(), message.clone()));
        let reply = self.send_replies.lock().unwrap().pop_front();
        match reply {
            Some(SendReply::Ok(id)) => Ok(SendOutcome::ok(id)),
            Some(SendReply::Err(e)) => Ok(SendOutcome::err(e)),
            None => Ok(SendOutcome::ok("mock-msg")),
        }
    }

    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &ProviderMessage,
    ) -> Result<MulticastOutcome> {
        self.multicasts
            .lock()
            .unwrap()
            .push((tokens.to_vec(), message.clone()));
        let reply = self.multicast_replies.lock().unwrap().pop_front();
        let responses = match reply {
            None | Some(MulticastReply::AllOk) => (0..tokens.len())
                .map(|i| SendOutcome::ok(format!("mock-{i}")))
                .collect(),
            Some(MulticastReply::FailIndices(indices)) => (0..tokens.len())
                .map(|i| {
                    if indices.contains(&i) {
                        SendOutcome::err(SendError::new("UNREGISTERED", "token gone"))
                    } else {
                        SendOutcome::ok(format!("mock-{i}"))
                    }
                })
                .collect(),
            Some(MulticastReply::Transport(msg)) => {
                return Err(PushRelayError::Http(msg));
            }
        };
        Ok(MulticastOutcome::from_responses(responses))
    }

    async fn subscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome> {
        self.topic_ops.lock().unwrap().push((
            "subscribe".to_string(),
            tokens.to_vec(),
            topic.to_string(),
        ));
        let reply = self.topic_replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or(TopicOutcome {
            success_count: tokens.len() as u32,
            failure_count: 0,
        }))
    }

    async fn unsubscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome> {
        self.topic_ops.lock().unwrap().push((
            "unsubscribe".to_string(),
            tokens.to_vec(),
            topic.to_string(),
        ));
        let reply = self.topic_replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or(TopicOutcome {
            success_count: tokens.len() as u32,
            failure_count: 0,
        }))
    }
}

/// Records which tokens were flagged for invalidation.
#[derive(Default)]
pub(crate) struct RecordingInvalidator {
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingInvalidator {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl InvalidationHook for RecordingInvalidator {
    fn invalidate(&self, tokens: &[String]) {
        self.calls.lock().unwrap().push(tokens.to_vec());
    }
}

/// Counts pauses without sleeping.
#[derive(Default)]
pub(crate) struct RecordingPacer {
    pauses: AtomicUsize,
}

impl RecordingPacer {
    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pacer that does nothing at all.
#[derive(Default)]
pub(crate) struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}
