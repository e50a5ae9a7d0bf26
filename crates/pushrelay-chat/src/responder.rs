//! Chat responder — LLM-backed replies with the keyword fallback.

use std::sync::Arc;

use serde::Serialize;

use crate::heuristics::{self, ScheduleInfo};
use crate::llm::LlmClient;
use crate::store::{ChatStore, ChatTurn};

const SENDER_USER: &str = "USER";
const SENDER_ASSISTANT: &str = "ASSISTANT";

/// Reply to one processed chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub reply: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleInfo>,
}

/// Processes chat turns: persist, reply (LLM first, heuristics as
/// fallback), and surface extracted schedule info.
pub struct ChatResponder {
    llm: Option<LlmClient>,
    store: Arc<ChatStore>,
}

impl ChatResponder {
    pub fn new(llm: Option<LlmClient>, store: Arc<ChatStore>) -> Self {
        Self { llm, store }
    }

    /// Handle one user message within a conversation. A missing/empty
    /// conversation id starts a new conversation.
    pub async fn process_message(
        &self,
        user_message: &str,
        conversation_id: Option<&str>,
    ) -> ChatReply {
        let conversation_id = match conversation_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tracing::info!("New conversation: {id}");
                id
            }
        };

        if let Err(e) = self
            .store
            .append(&conversation_id, SENDER_USER, user_message)
        {
            tracing::error!("Failed to persist user turn: {e}");
            return ChatReply {
                success: false,
                reply: "Something went wrong handling your message — please try again.".into(),
                conversation_id,
                schedule: None,
            };
        }

        let reply = self.generate_reply(user_message).await;

        if let Err(e) = self
            .store
            .append(&conversation_id, SENDER_ASSISTANT, &reply)
        {
            tracing::error!("Failed to persist assistant turn: {e}");
        }

        let schedule = heuristics::extract_schedule_info(user_message, &reply);
        if let Some(info) = &schedule {
            tracing::info!("Extracted schedule info: {info:?}");
        }

        ChatReply {
            success: true,
            reply,
            conversation_id,
            schedule,
        }
    }

    /// LLM first; the keyword analyzer covers an unconfigured client, a
    /// failed call, and an empty reply.
    async fn generate_reply(&self, user_message: &str) -> String {
        match &self.llm {
            Some(llm) if llm.is_configured() => match llm.chat(user_message).await {
                Ok(reply) if !reply.trim().is_empty() => reply,
                Ok(_) => {
                    tracing::warn!("LLM returned an empty reply, using keyword analyzer");
                    heuristics::analyze(user_message)
                }
                Err(e) => {
                    tracing::warn!("LLM call failed ({e}), using keyword analyzer");
                    heuristics::analyze(user_message)
                }
            },
            _ => {
                tracing::debug!("LLM not configured, using keyword analyzer");
                heuristics::analyze(user_message)
            }
        }
    }

    /// Ordered history of a conversation; empty id yields an empty list.
    pub fn history(&self, conversation_id: &str) -> Vec<ChatTurn> {
        if conversation_id.trim().is_empty() {
            return Vec::new();
        }
        match self.store.history(conversation_id) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::error!("Failed to load history for {conversation_id}: {e}");
                Vec::new()
            }
        }
    }
}
