//! API route handlers for the gateway.
//!
//! Response contract: JSON with `success: bool`; single-target successes add
//! `messageId`, batch successes add `successCount`/`failureCount`, failures
//! add `error`. 200 on logical success, 400 on missing/invalid input, 500 on
//! provider or unexpected failure.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use pushrelay_core::types::{DispatchResult, NotificationPayload, Priority};

use super::server::AppState;

type ApiResponse = (StatusCode, Json<Value>);

fn bad_request(error: &str) -> ApiResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": error})),
    )
}

fn server_error(error: &str) -> ApiResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "error": error})),
    )
}

/// Pull a string→string map out of a JSON body field.
fn data_map(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn single_result_response(result: DispatchResult) -> ApiResponse {
    match result {
        DispatchResult::Success { message_id } => (
            StatusCode::OK,
            Json(json!({"success": true, "messageId": message_id})),
        ),
        DispatchResult::Failure { error } => server_error(&error),
        DispatchResult::Batch { .. } => server_error("unexpected batch result"),
    }
}

fn batch_result_response(result: DispatchResult) -> ApiResponse {
    match result {
        DispatchResult::Batch {
            success_count,
            failure_count,
        } => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "successCount": success_count,
                "failureCount": failure_count,
            })),
        ),
        DispatchResult::Failure { error } => server_error(&error),
        DispatchResult::Success { .. } => server_error("unexpected single result"),
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pushrelay-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// POST /api/push/send?userId=<id> — single-target push.
///
/// The device token travels in the request's data map until a user→token
/// registry exists (registration is an acknowledged extension point).
pub async fn send_push(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let user_id = params.get("userId").map(String::as_str).unwrap_or("");
    let data = data_map(&body["data"]);

    let Some(token) = data.get("token").filter(|t| !t.is_empty()).cloned() else {
        return bad_request("user has no registered device token");
    };

    let title = body["title"].as_str().unwrap_or("");
    let text = body["body"].as_str().unwrap_or("");
    if title.trim().is_empty() || text.trim().is_empty() {
        return bad_request("title and body are required");
    }

    let priority = Priority::parse(body["priority"].as_str());
    let payload = NotificationPayload::new(title, text)
        .with_data(data)
        .with_priority(priority);

    tracing::info!("Push request for user '{user_id}'");
    single_result_response(state.dispatcher.send_to_device(&token, &payload).await)
}

/// POST /api/push/broadcast — multi-target push.
pub async fn broadcast_push(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let tokens = string_list(&body["userIds"]);
    if tokens.is_empty() {
        return bad_request("no device tokens given");
    }

    let title = body["title"].as_str().unwrap_or("");
    let text = body["body"].as_str().unwrap_or("");
    if title.trim().is_empty() || text.trim().is_empty() {
        return bad_request("title and body are required");
    }

    // Broadcasts default to high priority unless the caller says otherwise.
    let priority = match body["priority"].as_str() {
        Some(p) => Priority::parse(Some(p)),
        None => Priority::High,
    };
    let payload = NotificationPayload::new(title, text)
        .with_data(data_map(&body["data"]))
        .with_priority(priority);

    tracing::info!("Broadcast request for {} recipient(s)", tokens.len());
    batch_result_response(state.dispatcher.send_to_many(&tokens, &payload).await)
}

/// POST /api/push/topic — topic push.
pub async fn topic_push(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let topic = body["topic"].as_str().unwrap_or("");
    if topic.trim().is_empty() {
        return bad_request("topic is required");
    }

    let title = body["title"].as_str().unwrap_or("");
    let text = body["body"].as_str().unwrap_or("");
    if title.trim().is_empty() || text.trim().is_empty() {
        return bad_request("title and body are required");
    }

    let priority = match body["priority"].as_str() {
        Some(p) => Priority::parse(Some(p)),
        None => Priority::High,
    };
    let payload = NotificationPayload::new(title, text)
        .with_data(data_map(&body["data"]))
        .with_priority(priority);

    single_result_response(state.dispatcher.send_to_topic(topic, &payload).await)
}

/// POST /api/push/subscribe?topic=<name> — subscribe tokens to a topic.
pub async fn subscribe_topic(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let Some(topic) = params.get("topic").filter(|t| !t.trim().is_empty()) else {
        return bad_request("topic is required");
    };
    let tokens = string_list(&body);
    batch_result_response(state.topics.subscribe(&tokens, topic).await)
}

/// POST /api/push/unsubscribe?topic=<name> — unsubscribe tokens.
pub async fn unsubscribe_topic(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let Some(topic) = params.get("topic").filter(|t| !t.trim().is_empty()) else {
        return bad_request("topic is required");
    };
    let tokens = string_list(&body);
    batch_result_response(state.topics.unsubscribe(&tokens, topic).await)
}

/// POST /api/push/register-token — acknowledge a device token registration.
/// Persisting the token against a user is the integrator's concern; the
/// gateway only validates and logs it.
pub async fn register_token(Json(body): Json<Value>) -> ApiResponse {
    let token = body["token"].as_str().unwrap_or("");
    if token.trim().is_empty() {
        return bad_request("token is required");
    }
    tracing::info!("Device token registered ({} chars)", token.len());
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "token registered"})),
    )
}

/// POST /api/chat/message — process one chat message.
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResponse {
    let message = body["message"].as_str().unwrap_or("");
    if message.trim().is_empty() {
        return bad_request("message is required");
    }
    let conversation_id = body["conversationId"].as_str();

    let reply = state
        .responder
        .process_message(message, conversation_id)
        .await;
    let status = if reply.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(serde_json::to_value(&reply).unwrap_or_default()))
}

/// GET /api/chat/history/{conversation_id} — ordered turns.
pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResponse {
    let turns = state.responder.history(&conversation_id);
    (
        StatusCode::OK,
        Json(json!({"success": true, "messages": turns})),
    )
}
