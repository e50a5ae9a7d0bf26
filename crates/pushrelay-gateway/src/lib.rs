//! # PushRelay Gateway
//! HTTP surface for push dispatch and chat.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
