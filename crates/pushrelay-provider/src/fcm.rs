//! FCM client — HTTP v1 send API plus Instance ID topic management.
//!
//! One `FcmClient` is constructed at process start and shared behind an
//! `Arc` by every dispatcher; the inner `reqwest::Client` pools connections
//! across all requests.

use async_trait::async_trait;
use futures::future::join_all;
use pushrelay_core::config::FcmConfig;
use pushrelay_core::error::{PushRelayError, Result};
use serde_json::{Value, json};

use crate::message::{MessageTarget, ProviderMessage, encode};
use crate::traits::{MulticastOutcome, PushProvider, SendError, SendOutcome, TopicOutcome};

pub struct FcmClient {
    project_id: String,
    access_token: String,
    endpoint: String,
    iid_endpoint: String,
    client: reqwest::Client,
}

impl FcmClient {
    pub fn new(config: &FcmConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            access_token: config.resolve_access_token(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            iid_endpoint: config.iid_endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        )
    }

    fn topic_url(&self, op: &str) -> String {
        format!("{}/iid/v1:{}", self.iid_endpoint, op)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.access_token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.access_token))
        }
    }

    /// Issue one `messages:send` call. Provider-reported errors come back as
    /// `Ok(SendOutcome::err(..))` so callers can inspect the error code;
    /// `Err` means the call never produced a provider verdict.
    async fn send_raw(&self, body: &Value) -> Result<SendOutcome> {
        let req = self
            .client
            .post(self.send_url())
            .header("Content-Type", "application/json")
            .json(body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| PushRelayError::Http(format!("FCM send failed: {e}")))?;

        let status = resp.status();
        let json: Value = resp
            .json()
            .await
            .map_err(|e| PushRelayError::Http(format!("Invalid FCM response: {e}")))?;

        if status.is_success() {
            let message_id = parse_message_id(&json);
            tracing::debug!("FCM message sent: {message_id}");
            Ok(SendOutcome::ok(message_id))
        } else {
            Ok(SendOutcome::err(parse_send_error(status.as_u16(), &json)))
        }
    }

    async fn topic_batch(&self, op: &str, tokens: &[String], topic: &str) -> Result<TopicOutcome> {
        let body = json!({
            "to": format!("/topics/{topic}"),
            "registration_tokens": tokens,
        });

        let req = self
            .client
            .post(self.topic_url(op))
            .header("Content-Type", "application/json")
            .header("access_token_auth", "true")
            .json(&body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| PushRelayError::Http(format!("FCM topic call failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PushRelayError::Provider(format!(
                "FCM topic API error {status}: {text}"
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| PushRelayError::Http(format!("Invalid topic response: {e}")))?;
        Ok(parse_topic_response(&json, tokens.len()))
    }
}

/// Extract the message id from a successful `messages:send` response.
/// The v1 API returns `{"name": "projects/<p>/messages/<id>"}`.
pub fn parse_message_id(body: &Value) -> String {
    body["name"].as_str().unwrap_or("unknown").to_string()
}

/// Extract a structured error from a failed `messages:send` response.
///
/// The FCM-specific code lives in `error.details[].errorCode`; the gRPC
/// status string is the fallback.
pub fn parse_send_error(http_status: u16, body: &Value) -> SendError {
    let error = &body["error"];
    let code = error["details"]
        .as_array()
        .and_then(|details| {
            details
                .iter()
                .find_map(|d| d["errorCode"].as_str().map(String::from))
        })
        .or_else(|| error["status"].as_str().map(String::from))
        .unwrap_or_else(|| format!("HTTP_{http_status}"));
    let message = error["message"]
        .as_str()
        .unwrap_or("unknown provider error")
        .to_string();
    SendError::new(code, message)
}

/// Count successes/failures in an Instance ID batch response.
/// Each entry in `results` is `{}` on success or `{"error": "..."}`.
pub fn parse_topic_response(body: &Value, total: usize) -> TopicOutcome {
    let failure_count = body["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter(|r| r.get("error").is_some())
                .count() as u32
        })
        .unwrap_or(0);
    TopicOutcome {
        success_count: total as u32 - failure_count,
        failure_count,
    }
}

#[async_trait]
impl PushProvider for FcmClient {
    async fn send(
        &self,
        target: &MessageTarget,
        message: &ProviderMessage,
    ) -> Result<SendOutcome> {
        let body = encode(target, message);
        self.send_raw(&body).await
    }

    async fn send_multicast(
        &self,
        tokens: &[String],
        message: &ProviderMessage,
    ) -> Result<MulticastOutcome> {
        // The v1 API has no multicast endpoint; fan out one send per token,
        // keeping responses positionally aligned with the input list.
        let sends = tokens.iter().map(|token| {
            let body = encode(&MessageTarget::Token(token.clone()), message);
            async move {
                match self.send_raw(&body).await {
                    Ok(outcome) => outcome,
                    Err(e) => SendOutcome::err(SendError::new("UNAVAILABLE", e.to_string())),
                }
            }
        });
        let responses = join_all(sends).await;
        Ok(MulticastOutcome::from_responses(responses))
    }

    async fn subscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome> {
        self.topic_batch("batchAdd", tokens, topic).await
    }

    async fn unsubscribe_topic(&self, tokens: &[String], topic: &str) -> Result<TopicOutcome> {
        self.topic_batch("batchRemove", tokens, topic).await
    }
}
