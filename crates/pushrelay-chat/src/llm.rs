//! DashScope text-generation client (qwen-turbo).

use pushrelay_core::config::ChatConfig;
use pushrelay_core::error::{PushRelayError, Result};
use serde_json::{Value, json};

const SYSTEM_PROMPT: &str = "You are a professional schedule assistant. When a user \
describes a schedule item: understand the intent; extract the key details (time, \
location, event); confirm in a friendly tone that the item has been added (say \
'added for you', not 'I will add it'); ask politely for anything missing; and \
remind the user they can review items in the Schedule tab. Keep replies short \
and friendly.";

/// Client for the DashScope text-generation endpoint.
pub struct LlmClient {
    api_key: String,
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            api_key: config.resolve_api_key(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Ask the model for a reply to one user message.
    pub async fn chat(&self, user_message: &str) -> Result<String> {
        let body = build_request(&self.model, user_message);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-DashScope-SSE", "disable")
            .json(&body)
            .send()
            .await
            .map_err(|e| PushRelayError::Http(format!("LLM request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PushRelayError::Chat(format!(
                "LLM API error {status}: {text}"
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| PushRelayError::Http(format!("Invalid LLM response: {e}")))?;

        parse_reply(&json).ok_or_else(|| PushRelayError::Chat("LLM returned no reply".into()))
    }
}

/// Build the DashScope request body.
pub(crate) fn build_request(model: &str, user_message: &str) -> Value {
    json!({
        "model": model,
        "input": {
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_message},
            ]
        },
        "parameters": {
            "temperature": 0.7,
            "max_tokens": 1000,
            "top_p": 0.8,
        }
    })
}

/// Pull the reply text out of a DashScope response. Handles both the
/// `output.choices[].message.content` and the legacy `output.text` shapes;
/// returns `None` when the API reports an error code.
pub(crate) fn parse_reply(body: &Value) -> Option<String> {
    if let Some(code) = body["code"].as_str() {
        if code != "Success" && !code.is_empty() {
            tracing::error!(
                "LLM API returned error code {code}: {}",
                body["message"].as_str().unwrap_or("unknown")
            );
            return None;
        }
    }

    let output = &body["output"];
    if let Some(content) = output["choices"][0]["message"]["content"].as_str() {
        return Some(content.to_string());
    }
    if let Some(text) = output["text"].as_str() {
        return Some(text.to_string());
    }

    tracing::warn!("Unrecognized LLM response shape");
    None
}
