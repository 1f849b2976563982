use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use bson::oid::ObjectId;
use futures::StreamExt;
use rollcall_db::models::ClassifierStrategy;
use rollcall_services::live::SubscriptionOptions;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    // Verify JWT before accepting the WebSocket
    let claims = match state.auth.verify_access_token(&params.token) {
        Ok(c) => c,
        Err(_) => {
            return Response::builder()
                .status(401)
                .body("Unauthorized".into())
                .unwrap();
        }
    };

    let user_id = match ObjectId::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            return Response::builder()
                .status(400)
                .body("Invalid user ID".into())
                .unwrap();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: ObjectId) {
    let connection_id = Uuid::new_v4().to_string();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    // Register connection
    state
        .ws_storage
        .add(connection_id.clone(), user_id, sender.clone());

    // Send connected message
    {
        let msg = serde_json::json!({
            "type": "connected",
            "user_id": user_id.to_hex(),
        });
        super::dispatcher::send_to_connection(&state.ws_storage, &connection_id, &msg).await;
    }

    // Message loop
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_message(&state, &user_id, &connection_id, &text).await;
            }
            Ok(Message::Ping(data)) => {
                use futures::SinkExt;
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup: drop the connection from storage and from every feed
    state.ws_storage.remove(&connection_id);
    state.live.remove_connection(&connection_id);

    info!(?user_id, %connection_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    user_id: &ObjectId,
    connection_id: &str,
    text: &str,
) {
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return,
    };

    let msg_type = parsed.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let data = parsed.get("data");

    debug!(?user_id, %connection_id, msg_type, "WS message received");

    match msg_type {
        "ping" => {
            let pong = serde_json::json!({ "type": "pong" });
            super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &pong).await;
        }
        "attendance:subscribe" => {
            handle_subscribe(state, connection_id, data).await;
        }
        "attendance:unsubscribe" => {
            handle_unsubscribe(state, connection_id, data).await;
        }
        _ => {
            debug!(?user_id, msg_type, "Unknown WS message type");
        }
    }
}

/// Sends an attendance error message to one connection.
async fn send_attendance_error(state: &AppState, connection_id: &str, message: &str) {
    let msg = serde_json::json!({
        "type": "attendance:error",
        "data": { "message": message }
    });
    super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &msg).await;
}

/// Handle attendance:subscribe — register the connection on the meeting's
/// feed and reply with the current snapshot.
async fn handle_subscribe(
    state: &AppState,
    connection_id: &str,
    data: Option<&serde_json::Value>,
) {
    let meeting_id_str = match data
        .and_then(|d| d.get("meeting_id"))
        .and_then(|m| m.as_str())
    {
        Some(s) => s,
        None => {
            send_attendance_error(state, connection_id, "Missing meeting_id").await;
            return;
        }
    };

    let meeting_id = match ObjectId::parse_str(meeting_id_str) {
        Ok(id) => id,
        Err(_) => {
            send_attendance_error(state, connection_id, "Invalid meeting_id").await;
            return;
        }
    };

    let meeting = match state.meetings.base.find_by_id(meeting_id).await {
        Ok(m) => m,
        Err(_) => {
            send_attendance_error(state, connection_id, "Meeting not found").await;
            return;
        }
    };

    let threshold = data
        .and_then(|d| d.get("threshold"))
        .and_then(|t| t.as_u64())
        .map(|t| t.min(100) as u32);
    let strategy = data
        .and_then(|d| d.get("strategy"))
        .and_then(|s| s.as_str())
        .and_then(ClassifierStrategy::parse);
    let options = SubscriptionOptions { threshold, strategy };

    state.live.subscribe(meeting_id, connection_id, options);

    let participants = match state.meetings.list_participants(meeting_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!(%meeting_id, %e, "Subscribe: participant lookup failed");
            send_attendance_error(state, connection_id, "Failed to load participants").await;
            return;
        }
    };
    let records: Vec<_> = participants
        .iter()
        .map(rollcall_services::attendance::record_from_participant)
        .collect();
    let seq = state.live.next_seq(meeting_id);
    let snapshot = super::publish::snapshot_for(&meeting, records, options, seq);

    let msg = serde_json::json!({
        "type": "attendance:initial",
        "data": snapshot,
    });
    super::dispatcher::send_to_connection(&state.ws_storage, connection_id, &msg).await;
}

/// Handle attendance:unsubscribe — drop the connection from the feed.
async fn handle_unsubscribe(
    state: &AppState,
    connection_id: &str,
    data: Option<&serde_json::Value>,
) {
    let meeting_id = data
        .and_then(|d| d.get("meeting_id"))
        .and_then(|m| m.as_str())
        .and_then(|s| ObjectId::parse_str(s).ok());

    if let Some(meeting_id) = meeting_id {
        state.live.unsubscribe(&meeting_id, connection_id);
    }
}
