//! # PushRelay Provider
//! The push-provider boundary: message model, provider trait, FCM client.

pub mod fcm;
pub mod message;
pub mod traits;

pub use fcm::FcmClient;
pub use message::{AndroidConfig, MessageTarget, Notification, ProviderMessage};
pub use traits::{MulticastOutcome, PushProvider, SendError, SendOutcome, TopicOutcome};
