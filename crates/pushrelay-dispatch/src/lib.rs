//! # PushRelay Dispatch
//! The dispatch core: single/multicast/topic sends, fixed-window batch
//! splitting with rate pacing, and the token-invalidation extension point.

pub mod batch;
pub mod dispatcher;
pub mod invalidation;
pub mod pacer;
pub mod topics;

#[cfg(test)]
mod testutil;

pub use dispatcher::{Dispatcher, MAX_BATCH_SIZE};
pub use invalidation::{InvalidationHook, LogOnlyInvalidator};
pub use pacer::{Pacer, TokioPacer};
pub use topics::TopicManager;
