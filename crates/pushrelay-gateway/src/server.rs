//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use pushrelay_chat::ChatResponder;
use pushrelay_core::config::GatewayConfig;
use pushrelay_dispatch::{Dispatcher, TopicManager};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub topics: Arc<TopicManager>,
    pub responder: Arc<ChatResponder>,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/push/send", post(super::routes::send_push))
        .route("/api/push/broadcast", post(super::routes::broadcast_push))
        .route("/api/push/topic", post(super::routes::topic_push))
        .route("/api/push/subscribe", post(super::routes::subscribe_topic))
        .route(
            "/api/push/unsubscribe",
            post(super::routes::unsubscribe_topic),
        )
        .route(
            "/api/push/register-token",
            post(super::routes::register_token),
        )
        .route("/api/chat/message", post(super::routes::chat_message))
        .route(
            "/api/chat/history/{conversation_id}",
            get(super::routes::chat_history),
        )
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
