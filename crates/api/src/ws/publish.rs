use bson::oid::ObjectId;
use chrono::Utc;
use rollcall_db::models::Meeting;
use rollcall_services::attendance::{self, AttendanceSnapshot};
use rollcall_services::live::SubscriptionOptions;
use tracing::warn;

use super::dispatcher;
use crate::state::AppState;

/// Recomputes the meeting's snapshot and pushes `attendance:update` to every
/// subscriber. One sequence number is allocated per publish; subscribers
/// with different threshold/strategy overrides get their own evaluation
/// under the same seq. Failures are logged, never propagated — a broken
/// push must not take down the request that triggered it.
pub async fn publish_snapshot(state: &AppState, meeting_id: ObjectId) {
    let subscribers = state.live.subscribers(&meeting_id);
    if subscribers.is_empty() {
        return;
    }

    let meeting = match state.meetings.base.find_by_id(meeting_id).await {
        Ok(m) => m,
        Err(e) => {
            warn!(%meeting_id, %e, "Snapshot publish: meeting lookup failed");
            return;
        }
    };
    let participants = match state.meetings.list_participants(meeting_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!(%meeting_id, %e, "Snapshot publish: participant lookup failed");
            return;
        }
    };

    let records: Vec<_> = participants
        .iter()
        .map(attendance::record_from_participant)
        .collect();
    let seq = state.live.next_seq(meeting_id);

    // Evaluate once per distinct override set; most meetings have one.
    let mut evaluated: Vec<(SubscriptionOptions, AttendanceSnapshot)> = Vec::new();
    for (connection_id, options) in subscribers {
        let snapshot = match evaluated.iter().find(|(o, _)| *o == options) {
            Some((_, snapshot)) => snapshot.clone(),
            None => {
                let snapshot = snapshot_for(&meeting, records.clone(), options, seq);
                evaluated.push((options, snapshot.clone()));
                snapshot
            }
        };

        let message = serde_json::json!({
            "type": "attendance:update",
            "data": snapshot,
        });
        dispatcher::send_to_connection(&state.ws_storage, &connection_id, &message).await;
    }
}

/// Builds a snapshot for one meeting with optional per-subscriber overrides.
pub fn snapshot_for(
    meeting: &Meeting,
    records: Vec<attendance::ParticipantRecord>,
    options: SubscriptionOptions,
    seq: u64,
) -> AttendanceSnapshot {
    let threshold = options.threshold.unwrap_or(meeting.attendance_threshold);
    let strategy = options.strategy.unwrap_or(meeting.classifier);
    let timing = attendance::timing_from_meeting(meeting);
    let meeting_id = meeting.id.map(|id| id.to_hex()).unwrap_or_default();

    attendance::evaluate(
        &meeting_id,
        &timing,
        strategy,
        threshold,
        records,
        Utc::now(),
        seq,
    )
}

/// Announces a meeting lifecycle change to every open connection, so
/// dashboards that list meetings can refresh.
pub async fn emit_meeting_event(state: &AppState, event_type: &str, meeting: &Meeting) {
    let message = serde_json::json!({
        "type": event_type,
        "data": {
            "meeting_id": meeting.id.map(|id| id.to_hex()),
            "meeting_code": meeting.meeting_code,
            "topic": meeting.topic,
        }
    });
    dispatcher::broadcast_all(&state.ws_storage, &message).await;
}

/// Announces a participant movement to the meeting's subscribers.
pub async fn emit_participant_event(
    state: &AppState,
    meeting_id: ObjectId,
    event_type: &str,
    display_name: &str,
) {
    let subscribers = state.live.subscribers(&meeting_id);
    if subscribers.is_empty() {
        return;
    }
    let message = serde_json::json!({
        "type": event_type,
        "data": {
            "meeting_id": meeting_id.to_hex(),
            "display_name": display_name,
        }
    });
    for (connection_id, _) in subscribers {
        dispatcher::send_to_connection(&state.ws_storage, &connection_id, &message).await;
    }
}
