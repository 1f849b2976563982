use chrono::{DateTime, Utc};
use rollcall_db::models::{Meeting, MeetingParticipant};

use super::aggregate::aggregate_sessions;
use super::classify::{attendance_percentage, classify};
use super::duration::meeting_duration;
use super::stats::{authentication_stats, reduce};
use super::types::{
    AttendanceSnapshot, AuthenticatedUser, ClassifierStrategy, MeetingTiming,
    ParticipantAttendance, ParticipantRecord, SessionRecord, StudentDetails,
};

/// Composes the whole pipeline: aggregate each participant's sessions,
/// derive percentage and status, fold the roster into statistics. This is
/// the single entry point behind REST reads, live pushes and exports.
pub fn evaluate(
    meeting_id: &str,
    timing: &MeetingTiming,
    strategy: ClassifierStrategy,
    threshold: u32,
    participants: Vec<ParticipantRecord>,
    now: DateTime<Utc>,
    seq: u64,
) -> AttendanceSnapshot {
    let meeting_mins = meeting_duration(timing, now);

    let classified: Vec<ParticipantAttendance> = participants
        .into_iter()
        .map(|record| {
            let agg = aggregate_sessions(&record.sessions, record.explicit_active, now);
            let percentage =
                attendance_percentage(agg.total_duration, meeting_mins, agg.is_active);
            let status = classify(
                strategy,
                threshold,
                percentage,
                agg.total_duration,
                agg.is_active,
            );

            ParticipantAttendance {
                id: record.participant_id,
                name: record.display_name,
                email: record.email,
                student_info: record.student_info,
                authenticated_user: record.authenticated_user,
                sessions: record.sessions,
                total_session_duration: agg.total_duration,
                attendance_percentage: percentage,
                attendance_status: status,
                is_active: agg.is_active,
            }
        })
        .collect();

    let statistics = reduce(&classified);
    let auth_stats = authentication_stats(&classified);

    AttendanceSnapshot {
        meeting_id: meeting_id.to_string(),
        seq,
        threshold,
        strategy,
        computed_at: now,
        participants: classified,
        statistics,
        authentication_stats: auth_stats,
    }
}

pub fn timing_from_meeting(meeting: &Meeting) -> MeetingTiming {
    MeetingTiming {
        duration: meeting.duration,
        start_time: meeting.start_time.map(|t| t.to_chrono()),
        end_time: meeting.end_time.map(|t| t.to_chrono()),
        actual_start_time: meeting.actual_start_time.map(|t| t.to_chrono()),
        actual_end_time: meeting.actual_end_time.map(|t| t.to_chrono()),
    }
}

pub fn record_from_participant(participant: &MeetingParticipant) -> ParticipantRecord {
    ParticipantRecord {
        participant_id: participant.id.map(|id| id.to_hex()),
        display_name: participant.display_name.clone(),
        email: participant.email.clone(),
        student_info: participant.student_info.as_ref().map(|info| StudentDetails {
            student_id: info.student_id.clone(),
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            department: info.department.clone(),
        }),
        authenticated_user: participant.user_id.map(|uid| AuthenticatedUser {
            user_id: uid.to_hex(),
            username: None,
            role: None,
        }),
        sessions: participant
            .sessions
            .iter()
            .map(|s| SessionRecord {
                join_time: Some(s.joined_at.to_chrono()),
                leave_time: s.left_at.map(|t| t.to_chrono()),
            })
            .collect(),
        explicit_active: None,
    }
}
