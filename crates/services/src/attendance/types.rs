use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use rollcall_db::models::ClassifierStrategy;

/// Classification of one participant against one meeting. Never stored;
/// recomputed from session data and the current clock on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    #[serde(rename = "In Progress")]
    InProgress,
    Partial,
    Late,
    Absent,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::InProgress => "In Progress",
            AttendanceStatus::Partial => "Partial",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        };
        f.write_str(s)
    }
}

/// One join/leave cycle in canonical form. A missing `join_time` means the
/// source timestamp didn't parse; the session then contributes zero minutes.
/// A missing `leave_time` means the session is still open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub join_time: Option<DateTime<Utc>>,
    pub leave_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Canonical participant consumed by the calculators, independent of which
/// payload shape or collection it came from.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRecord {
    pub participant_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub student_info: Option<StudentDetails>,
    pub authenticated_user: Option<AuthenticatedUser>,
    pub sessions: Vec<SessionRecord>,
    /// Some sources carry their own active flag; it ORs with open sessions.
    pub explicit_active: Option<bool>,
}

/// Inputs to the meeting-length resolver, in priority order.
#[derive(Debug, Clone, Default)]
pub struct MeetingTiming {
    pub duration: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAttendance {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_info: Option<StudentDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_user: Option<AuthenticatedUser>,
    pub sessions: Vec<SessionRecord>,
    pub total_session_duration: u32,
    pub attendance_percentage: u32,
    pub attendance_status: AttendanceStatus,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStatistics {
    pub present: u32,
    pub in_progress: u32,
    pub partial: u32,
    pub late: u32,
    pub absent: u32,
    pub total: u32,
    pub average_percentage: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationStats {
    pub authenticated: u32,
    pub anonymous: u32,
    pub total: u32,
    /// Percentage of roster entries linked to an account, in [0,100].
    pub authentication_rate: u32,
}

/// The unit of fan-out: everything a dashboard needs, stamped with a
/// per-meeting monotonic sequence number so stale deliveries are detectable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSnapshot {
    pub meeting_id: String,
    pub seq: u64,
    pub threshold: u32,
    pub strategy: ClassifierStrategy,
    pub computed_at: DateTime<Utc>,
    pub participants: Vec<ParticipantAttendance>,
    pub statistics: AttendanceStatistics,
    pub authentication_stats: AuthenticationStats,
}
