use super::types::{AttendanceStatus, ClassifierStrategy};

/// Attended minutes as a percentage of the meeting length, clamped to
/// [0,100]. A zero-length meeting can't be divided by: someone currently
/// present counts as fully attending, anyone else as absent. Someone who
/// just joined (active, nothing elapsed) likewise counts as fully present.
pub fn attendance_percentage(total_duration: u32, meeting_duration: u32, is_active: bool) -> u32 {
    if meeting_duration == 0 {
        return if is_active { 100 } else { 0 };
    }
    if is_active && total_duration == 0 {
        return 100;
    }

    let capped = total_duration.min(meeting_duration) as u64;
    let pct = (capped * 100 + meeting_duration as u64 / 2) / meeting_duration as u64;
    pct.min(100) as u32
}

/// Derives a status from the computed numbers. An open session always wins:
/// the participant is in the meeting right now, whatever their percentage
/// says. The two strategies only differ for participants who have left.
pub fn classify(
    strategy: ClassifierStrategy,
    threshold: u32,
    percentage: u32,
    total_duration: u32,
    is_active: bool,
) -> AttendanceStatus {
    if is_active {
        return AttendanceStatus::InProgress;
    }
    if total_duration == 0 {
        return AttendanceStatus::Absent;
    }

    match strategy {
        ClassifierStrategy::Banded => {
            if percentage >= 90 {
                AttendanceStatus::Present
            } else if percentage >= 70 {
                AttendanceStatus::Partial
            } else if percentage >= 30 {
                AttendanceStatus::Late
            } else {
                AttendanceStatus::Absent
            }
        }
        ClassifierStrategy::Threshold => {
            if percentage >= threshold {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            }
        }
    }
}
