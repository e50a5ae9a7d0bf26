//! Provider message model and FCM v1 wire encoding.

use pushrelay_core::types::Priority;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

/// Where a single provider send is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Token(String),
    Topic(String),
}

/// The visible notification block (absent for data-only messages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Android delivery options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub priority: Priority,
    pub sound: Option<String>,
    pub channel_id: Option<String>,
}

impl AndroidConfig {
    /// Platform defaults for visible notifications.
    pub fn with_defaults(priority: Priority) -> Self {
        Self {
            priority,
            sound: Some("default".into()),
            channel_id: Some("default_channel".into()),
        }
    }

    /// Data-only messages carry no notification channel/sound.
    pub fn data_only(priority: Priority) -> Self {
        Self {
            priority,
            sound: None,
            channel_id: None,
        }
    }
}

/// A fully constructed message, ready for the provider.
///
/// Target-independent: the same message can be sent to one token, fanned out
/// to many tokens, or addressed to a topic.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub notification: Option<Notification>,
    pub data: HashMap<String, String>,
    pub android: AndroidConfig,
}

impl ProviderMessage {
    pub fn notification(title: &str, body: &str, priority: Priority) -> Self {
        Self {
            notification: Some(Notification {
                title: title.to_string(),
                body: body.to_string(),
            }),
            data: HashMap::new(),
            android: AndroidConfig::with_defaults(priority),
        }
    }

    pub fn data_only(data: HashMap<String, String>) -> Self {
        Self {
            notification: None,
            data,
            android: AndroidConfig::data_only(Priority::High),
        }
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = data;
        self
    }
}

/// Encode a message + target into the FCM v1 `messages:send` request body.
pub fn encode(target: &MessageTarget, message: &ProviderMessage) -> Value {
    let mut inner = serde_json::Map::new();

    match target {
        MessageTarget::Token(token) => {
            inner.insert("token".into(), json!(token));
        }
        MessageTarget::Topic(topic) => {
            inner.insert("topic".into(), json!(topic));
        }
    }

    if let Some(n) = &message.notification {
        inner.insert("notification".into(), json!({"title": n.title, "body": n.body}));
    }

    if !message.data.is_empty() {
        inner.insert("data".into(), json!(message.data));
    }

    let mut android = serde_json::Map::new();
    android.insert(
        "priority".into(),
        json!(message.android.priority.as_android_str()),
    );
    let mut android_notification = serde_json::Map::new();
    if let Some(sound) = &message.android.sound {
        android_notification.insert("sound".into(), json!(sound));
    }
    if let Some(channel) = &message.android.channel_id {
        android_notification.insert("channel_id".into(), json!(channel));
    }
    if !android_notification.is_empty() {
        android.insert("notification".into(), Value::Object(android_notification));
    }
    inner.insert("android".into(), Value::Object(android));

    json!({ "message": Value::Object(inner) })
}
