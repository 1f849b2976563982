use axum::extract::ws::Message;
use bson::oid::ObjectId;
use futures::SinkExt;
use tracing::{debug, warn};

use super::storage::WsStorage;

/// Sends a JSON message to one connection.
pub async fn send_to_connection(
    ws_storage: &WsStorage,
    connection_id: &str,
    message: &serde_json::Value,
) {
    let Some(sender) = ws_storage.sender(connection_id) else {
        return;
    };
    let text = serde_json::to_string(message).unwrap_or_default();
    let mut guard = sender.lock().await;
    if let Err(e) = guard.send(Message::text(text)).await {
        warn!(%connection_id, %e, "Failed to send WS message");
    } else {
        debug!(%connection_id, "WS message sent");
    }
}

/// Sends a JSON message to every listed connection.
pub async fn send_to_connections(
    ws_storage: &WsStorage,
    connection_ids: &[String],
    message: &serde_json::Value,
) {
    for connection_id in connection_ids {
        send_to_connection(ws_storage, connection_id, message).await;
    }
}

/// Sends a JSON message to all of a user's connections.
pub async fn send_to_user(
    ws_storage: &WsStorage,
    user_id: &ObjectId,
    message: &serde_json::Value,
) {
    let text = serde_json::to_string(message).unwrap_or_default();
    for sender in ws_storage.senders_for_user(user_id) {
        let mut guard = sender.lock().await;
        if let Err(e) = guard.send(Message::text(text.clone())).await {
            warn!(?user_id, %e, "Failed to send WS message");
        }
    }
}

/// Sends a JSON message to every open connection.
pub async fn broadcast_all(ws_storage: &WsStorage, message: &serde_json::Value) {
    let ids = ws_storage.all_connection_ids();
    send_to_connections(ws_storage, &ids, message).await;
}
