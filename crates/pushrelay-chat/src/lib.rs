//! # PushRelay Chat
//! Schedule-assistant chat turns: LLM-backed replies with a keyword/regex
//! fallback, persisted to SQLite.

pub mod heuristics;
pub mod llm;
pub mod responder;
pub mod store;

pub use llm::LlmClient;
pub use responder::{ChatReply, ChatResponder};
pub use store::{ChatStore, ChatTurn};
