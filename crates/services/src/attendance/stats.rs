use super::types::{
    AttendanceStatistics, AttendanceStatus, AuthenticationStats, ParticipantAttendance,
};

/// Folds classified participants into per-status counts and an average
/// percentage. An empty roster yields all zeros.
pub fn reduce(participants: &[ParticipantAttendance]) -> AttendanceStatistics {
    let mut stats = AttendanceStatistics::default();
    if participants.is_empty() {
        return stats;
    }

    let mut percentage_sum = 0u64;
    for p in participants {
        match p.attendance_status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::InProgress => stats.in_progress += 1,
            AttendanceStatus::Partial => stats.partial += 1,
            AttendanceStatus::Late => stats.late += 1,
            AttendanceStatus::Absent => stats.absent += 1,
        }
        percentage_sum += p.attendance_percentage as u64;
    }

    stats.total = participants.len() as u32;
    stats.average_percentage =
        ((percentage_sum + participants.len() as u64 / 2) / participants.len() as u64) as u32;
    stats
}

/// How much of the roster is linked to an authenticated account.
pub fn authentication_stats(participants: &[ParticipantAttendance]) -> AuthenticationStats {
    let mut stats = AuthenticationStats::default();
    if participants.is_empty() {
        return stats;
    }

    for p in participants {
        if p.authenticated_user.is_some() {
            stats.authenticated += 1;
        } else {
            stats.anonymous += 1;
        }
    }
    stats.total = participants.len() as u32;
    stats.authentication_rate =
        ((stats.authenticated as u64 * 100 + stats.total as u64 / 2) / stats.total as u64) as u32;
    stats
}
