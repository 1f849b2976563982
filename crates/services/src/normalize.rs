//! Adapters from the payload shapes seen at the boundary to the canonical
//! records the calculators consume. Historical endpoints disagree on field
//! names and timestamp encodings; everything is absorbed here, and nothing
//! past this module ever sees a malformed shape.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::attendance::types::{
    AttendanceStatistics, AuthenticatedUser, AuthenticationStats, ParticipantRecord,
    SessionRecord, StudentDetails,
};

/// Which boundary a roster payload came from. The shapes overlap enough to
/// share one raw record type; the tag survives into logs and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RosterSource {
    /// Raw webhook events: snake_case, `join_time`/`leave_time`, `user_name`.
    Webhook,
    /// Enriched tracker responses: camelCase, nested sessions + studentInfo.
    #[default]
    Tracker,
    /// Live-participant responses: flat joinTime/leaveTime plus isActive.
    Live,
}

/// A roster made safe: participants always an array, statistics always
/// present (zeroed until computed).
#[derive(Debug, Clone, Default)]
pub struct NormalizedRoster {
    pub source: RosterSource,
    pub participants: Vec<ParticipantRecord>,
    pub statistics: AttendanceStatistics,
    pub authentication_stats: AuthenticationStats,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSession {
    #[serde(
        default,
        alias = "joinTime",
        alias = "joined_at",
        alias = "joinedAt",
        deserialize_with = "lenient_timestamp"
    )]
    pub join_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "leaveTime",
        alias = "left_at",
        alias = "leftAt",
        deserialize_with = "lenient_timestamp"
    )]
    pub leave_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStudentInfo {
    #[serde(default, alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAuthenticatedUser {
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One participant in any of the observed shapes. Every field is optional
/// and every timestamp is parsed leniently, so deserialization only fails
/// for non-object input.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawParticipant {
    #[serde(default, alias = "participant_id", alias = "participantId")]
    pub id: Option<String>,
    #[serde(default, alias = "user_name", alias = "userName", alias = "displayName")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(
        default,
        alias = "joinTime",
        alias = "joined_at",
        deserialize_with = "lenient_timestamp"
    )]
    pub join_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "leaveTime",
        alias = "left_at",
        deserialize_with = "lenient_timestamp"
    )]
    pub leave_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sessions: Vec<RawSession>,
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,
    #[serde(default, alias = "studentInfo")]
    pub student_info: Option<RawStudentInfo>,
    #[serde(default, alias = "authenticatedUser")]
    pub authenticated_user: Option<RawAuthenticatedUser>,
}

impl RawParticipant {
    /// Canonicalize. Participants that predate session arrays carry flat
    /// join/leave fields; those become a single synthesized session.
    pub fn into_record(self) -> ParticipantRecord {
        let sessions: Vec<SessionRecord> = if !self.sessions.is_empty() {
            self.sessions
                .into_iter()
                .map(|s| SessionRecord {
                    join_time: s.join_time,
                    leave_time: s.leave_time,
                })
                .collect()
        } else if self.join_time.is_some() || self.leave_time.is_some() {
            vec![SessionRecord {
                join_time: self.join_time,
                leave_time: self.leave_time,
            }]
        } else {
            Vec::new()
        };

        let student_info = self.student_info.and_then(|info| {
            info.student_id.map(|student_id| StudentDetails {
                student_id,
                first_name: info.first_name.unwrap_or_default(),
                last_name: info.last_name.unwrap_or_default(),
                department: info.department,
            })
        });

        let authenticated_user = self.authenticated_user.and_then(|user| {
            user.user_id.map(|user_id| AuthenticatedUser {
                user_id,
                username: user.username,
                role: user.role,
            })
        });

        ParticipantRecord {
            participant_id: self.id,
            display_name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            email: self.email,
            student_info,
            authenticated_user,
            sessions,
            explicit_active: self.is_active,
        }
    }
}

/// Normalizes an arbitrary roster payload. Null, missing or garbage input
/// degrades to an empty roster with zeroed statistics rather than an error.
pub fn sanitize(source: RosterSource, payload: Option<&Value>) -> NormalizedRoster {
    let mut roster = NormalizedRoster {
        source,
        ..Default::default()
    };

    let Some(payload) = payload else {
        return roster;
    };

    let raw_participants: &[Value] = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("participants") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    for item in raw_participants {
        match serde_json::from_value::<RawParticipant>(item.clone()) {
            Ok(raw) => roster.participants.push(raw.into_record()),
            Err(e) => {
                warn!(?source, %e, "Dropping malformed participant entry");
            }
        }
    }

    roster
}

/// Best-effort timestamp parsing: RFC 3339, bare date-times with or without
/// a `T`, and epoch seconds/milliseconds (numeric or string). Anything else
/// is `None`, never an error.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(epoch) = s.parse::<i64>() {
        return epoch_to_datetime(epoch);
    }

    warn!(value = s, "Unparseable timestamp");
    None
}

fn epoch_to_datetime(epoch: i64) -> Option<DateTime<Utc>> {
    // Heuristic: anything past ~5138 AD in seconds is really milliseconds.
    if epoch.abs() >= 100_000_000_000 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp_value))
}

fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(epoch_to_datetime),
        _ => None,
    }
}
