use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Append-only log of join/leave activity, one document per action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub meeting_id: Option<ObjectId>,
    pub meeting_code: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub action: JoinAction,
    #[serde(default)]
    pub metadata: JoinMetadata,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinAction {
    #[default]
    Joined,
    Left,
    Linked,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JoinMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: Option<String>,
}

impl JoinEvent {
    pub const COLLECTION: &'static str = "join_events";
}
