use chrono::{DateTime, Utc};

use super::duration::session_duration;
use super::types::SessionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAggregate {
    pub total_duration: u32,
    pub is_active: bool,
}

/// Folds a participant's join/leave cycles into total attended minutes and
/// an in-the-meeting flag. Rejoin cycles accumulate; overlapping sessions
/// (same person from two devices) are summed as-is.
pub fn aggregate_sessions(
    sessions: &[SessionRecord],
    explicit_active: Option<bool>,
    now: DateTime<Utc>,
) -> SessionAggregate {
    let mut total = 0u32;
    let mut open = false;

    for session in sessions {
        if session.leave_time.is_none() {
            open = true;
        }
        if let Some(joined) = session.join_time {
            total = total.saturating_add(session_duration(joined, session.leave_time, now));
        }
    }

    SessionAggregate {
        total_duration: total,
        is_active: open || explicit_active == Some(true),
    }
}
