use axum::extract::ws::{Message, WebSocket};
use bson::oid::ObjectId;
use dashmap::DashMap;
use futures::stream::SplitSink;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

struct WsConnection {
    user_id: ObjectId,
    sender: WsSender,
}

/// Tracks all active WebSocket connections by connection ID. A user can
/// hold several connections (multiple tabs/devices).
pub struct WsStorage {
    connections: DashMap<String, WsConnection>,
}

impl WsStorage {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn add(&self, connection_id: String, user_id: ObjectId, sender: WsSender) {
        self.connections
            .insert(connection_id, WsConnection { user_id, sender });
    }

    pub fn remove(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    pub fn sender(&self, connection_id: &str) -> Option<WsSender> {
        self.connections
            .get(connection_id)
            .map(|c| c.sender.clone())
    }

    pub fn senders_for_user(&self, user_id: &ObjectId) -> Vec<WsSender> {
        self.connections
            .iter()
            .filter(|entry| entry.value().user_id == *user_id)
            .map(|entry| entry.value().sender.clone())
            .collect()
    }

    pub fn all_connection_ids(&self) -> Vec<String> {
        self.connections.iter().map(|r| r.key().clone()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for WsStorage {
    fn default() -> Self {
        Self::new()
    }
}
