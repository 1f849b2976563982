use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub last_active_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Instructor,
    #[default]
    Student,
}

impl UserRole {
    pub fn can_manage_meetings(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Instructor)
    }
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
