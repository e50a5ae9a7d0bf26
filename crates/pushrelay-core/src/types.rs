//! Domain types shared across the dispatch and gateway crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Delivery priority for a notification.
///
/// Parsed leniently from client input: only a case-insensitive `"high"`
/// selects [`Priority::High`]; everything else (including absence) is
/// [`Priority::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
}

impl Priority {
    /// Map a raw priority string from a request to a priority level.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "high" => Priority::High,
            _ => Priority::Normal,
        }
    }

    /// The wire value used in the provider's android config.
    pub fn as_android_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
        }
    }
}

/// A notification to deliver: title, body, custom data, and priority.
///
/// Immutable once handed to a dispatch operation. The dispatcher stamps a
/// `timestamp` key into the data map at send time, overwriting any
/// caller-supplied value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub priority: Priority,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
            priority: Priority::Normal,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = data;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Reject empty titles/bodies before anything reaches the provider.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::PushRelayError::Validation("title is empty".into()));
        }
        if self.body.trim().is_empty() {
            return Err(crate::PushRelayError::Validation("body is empty".into()));
        }
        Ok(())
    }
}

/// Outcome of a dispatch operation.
///
/// Exactly one variant per call: single-target sends produce `Success` or
/// `Failure`; multi-target operations produce `Batch` with aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchResult {
    Success { message_id: String },
    Failure { error: String },
    Batch { success_count: u32, failure_count: u32 },
}

impl DispatchResult {
    pub fn success(message_id: impl Into<String>) -> Self {
        DispatchResult::Success {
            message_id: message_id.into(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        DispatchResult::Failure {
            error: error.into(),
        }
    }

    pub fn batch(success_count: u32, failure_count: u32) -> Self {
        DispatchResult::Batch {
            success_count,
            failure_count,
        }
    }

    /// `true` for `Success` and `Batch`, `false` for `Failure`.
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchResult::Failure { .. })
    }
}
