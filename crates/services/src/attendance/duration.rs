use chrono::{DateTime, Utc};

use super::types::MeetingTiming;

/// Minutes between join and leave, rounded to the nearest whole minute and
/// clamped at zero. An open session (no leave) is measured against `now`.
pub fn session_duration(
    joined_at: DateTime<Utc>,
    left_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u32 {
    let end = left_at.unwrap_or(now);
    let millis = end.signed_duration_since(joined_at).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    ((millis + 30_000) / 60_000) as u32
}

/// Resolves the meeting length in minutes. Payloads disagree on where the
/// length lives, so the first applicable source wins: an explicit duration,
/// the scheduled window, the actual window, or elapsed-so-far when only a
/// start is known.
pub fn meeting_duration(timing: &MeetingTiming, now: DateTime<Utc>) -> u32 {
    if let Some(duration) = timing.duration {
        return duration;
    }

    if let (Some(start), Some(end)) = (timing.start_time, timing.end_time) {
        return span_minutes(start, end);
    }

    if let (Some(start), Some(end)) = (timing.actual_start_time, timing.actual_end_time) {
        return span_minutes(start, end);
    }

    if let Some(start) = timing.start_time.or(timing.actual_start_time) {
        return span_minutes(start, now);
    }

    0
}

fn span_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let millis = end.signed_duration_since(start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    ((millis + 30_000) / 60_000) as u32
}
