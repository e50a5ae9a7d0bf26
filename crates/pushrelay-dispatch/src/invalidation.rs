//! Token invalidation extension point.
//!
//! When the provider reports a token as failed or unregistered, the
//! dispatcher signals *which* tokens should be invalidated through this
//! hook. What invalidation actually does (deleting from a device registry,
//! notifying another service) is the integrator's concern; the default
//! implementation only logs.

/// Receives device tokens the provider rejected.
pub trait InvalidationHook: Send + Sync {
    fn invalidate(&self, tokens: &[String]);
}

/// Default hook: logs the tokens and takes no further action.
pub struct LogOnlyInvalidator;

impl InvalidationHook for LogOnlyInvalidator {
    fn invalidate(&self, tokens: &[String]) {
        tracing::warn!(
            "{} stale device token(s) should be removed from the registry: {:?}",
            tokens.len(),
            tokens
        );
    }
}
