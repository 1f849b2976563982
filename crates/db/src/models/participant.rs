use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingParticipant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub meeting_id: ObjectId,
    /// Set once the participant is linked to an authenticated account.
    pub user_id: Option<ObjectId>,
    pub display_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_external: bool,
    pub student_info: Option<StudentInfo>,
    #[serde(default)]
    pub sessions: Vec<ParticipantSession>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// One join/leave cycle. `left_at == None` means the participant is still in
/// the meeting; attendance math substitutes the current time until the
/// session is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSession {
    pub joined_at: DateTime,
    pub left_at: Option<DateTime>,
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentInfo {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
}

impl MeetingParticipant {
    pub const COLLECTION: &'static str = "meeting_participants";

    pub fn has_open_session(&self) -> bool {
        self.sessions.iter().any(|s| s.left_at.is_none())
    }
}
