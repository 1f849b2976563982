use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub topic: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: MeetingStatus,
    /// Scheduled length in minutes. When present it is the authoritative
    /// denominator for attendance percentages.
    pub duration: Option<u32>,
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    pub actual_start_time: Option<DateTime>,
    pub actual_end_time: Option<DateTime>,
    pub timezone: Option<String>,
    pub meeting_code: String,
    pub passcode: Option<String>,
    pub attendance_threshold: u32,
    #[serde(default)]
    pub classifier: ClassifierStrategy,
    /// None for meetings first seen through webhook events.
    pub organizer_id: Option<ObjectId>,
    #[serde(default)]
    pub participant_count: u32,
    #[serde(default)]
    pub peak_participant_count: u32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    InProgress,
    Ended,
}

/// How a participant's percentage is turned into a status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierStrategy {
    /// Fixed percentage bands, no configurable cutoff.
    Banded,
    /// Single configurable cutoff, present-or-absent.
    #[default]
    Threshold,
}

impl ClassifierStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "banded" => Some(ClassifierStrategy::Banded),
            "threshold" => Some(ClassifierStrategy::Threshold),
            _ => None,
        }
    }
}

impl Meeting {
    pub const COLLECTION: &'static str = "meetings";
}
