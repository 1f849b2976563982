use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use bson::oid::ObjectId;
use rollcall_db::models::{JoinAction, JoinEvent, JoinMetadata};
use rollcall_services::normalize::RawParticipant;
use rollcall_services::webhook::{self, WebhookError};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{error::ApiError, state::AppState, ws::publish};

#[derive(Debug, Deserialize)]
struct ZoomEvent {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Zoom-style event intake. Every request is signature-checked against the
/// shared secret; the URL-validation handshake is answered inline, meeting
/// and participant events update the store and fan out to subscribers.
pub async fn zoom(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let secret = &state.settings.webhook.zoom_secret_token;
    if secret.is_empty() {
        warn!("Webhook secret not configured; accepting event unverified");
    } else {
        let timestamp = headers
            .get("x-zm-request-timestamp")
            .and_then(|v| v.to_str().ok())
            .ok_or(WebhookError::MissingHeader("x-zm-request-timestamp"))?;
        let signature = headers
            .get("x-zm-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(WebhookError::MissingHeader("x-zm-signature"))?;
        webhook::verify_signature(secret, timestamp, &body, signature)?;
    }

    let event: ZoomEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid event payload: {e}")))?;

    debug!(event = %event.event, "Webhook event received");

    match event.event.as_str() {
        "endpoint.url_validation" => {
            let plain_token = event
                .payload
                .get("plainToken")
                .and_then(|t| t.as_str())
                .ok_or_else(|| ApiError::BadRequest("Missing plainToken".to_string()))?;
            let encrypted = webhook::encrypt_validation_token(secret, plain_token);
            return Ok(Json(serde_json::json!({
                "plainToken": plain_token,
                "encryptedToken": encrypted,
            })));
        }
        "meeting.started" => handle_meeting_started(&state, &event.payload).await?,
        "meeting.ended" => handle_meeting_ended(&state, &event.payload).await?,
        "meeting.participant_joined" => {
            handle_participant_event(&state, &event.payload, JoinAction::Joined).await?
        }
        "meeting.participant_left" => {
            handle_participant_event(&state, &event.payload, JoinAction::Left).await?
        }
        other => {
            debug!(event = other, "Ignoring unhandled webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

fn meeting_code(payload: &serde_json::Value) -> Result<String, ApiError> {
    match payload.get("object").and_then(|o| o.get("id")) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ApiError::BadRequest("Missing meeting id".to_string())),
    }
}

async fn handle_meeting_started(
    state: &AppState,
    payload: &serde_json::Value,
) -> Result<(), ApiError> {
    let code = meeting_code(payload)?;
    let topic = payload
        .get("object")
        .and_then(|o| o.get("topic"))
        .and_then(|t| t.as_str());

    let meeting = state
        .meetings
        .find_or_create_by_code(
            &code,
            topic,
            state.settings.attendance.default_threshold,
            state.default_strategy(),
        )
        .await?;

    let meeting_id = meeting.id.unwrap();
    state.meetings.start(meeting_id).await?;
    let meeting = state.meetings.base.find_by_id(meeting_id).await?;
    info!(code = %meeting.meeting_code, "Meeting started via webhook");
    publish::emit_meeting_event(state, "meeting:started", &meeting).await;
    Ok(())
}

async fn handle_meeting_ended(
    state: &AppState,
    payload: &serde_json::Value,
) -> Result<(), ApiError> {
    let code = meeting_code(payload)?;
    let Some(meeting) = state.meetings.find_by_code(&code).await? else {
        debug!(code, "Ended event for unknown meeting");
        return Ok(());
    };

    let meeting_id = meeting.id.unwrap();
    state.meetings.end(meeting_id).await?;
    let meeting = state.meetings.base.find_by_id(meeting_id).await?;
    info!(code = %meeting.meeting_code, "Meeting ended via webhook");
    publish::emit_meeting_event(state, "meeting:ended", &meeting).await;
    publish::publish_snapshot(state, meeting_id).await;
    Ok(())
}

async fn handle_participant_event(
    state: &AppState,
    payload: &serde_json::Value,
    action: JoinAction,
) -> Result<(), ApiError> {
    let code = meeting_code(payload)?;
    let raw = payload
        .get("object")
        .and_then(|o| o.get("participant"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let participant: RawParticipant = serde_json::from_value(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid participant payload: {e}")))?;
    let record = participant.into_record();

    let meeting = state
        .meetings
        .find_or_create_by_code(
            &code,
            None,
            state.settings.attendance.default_threshold,
            state.default_strategy(),
        )
        .await?;
    let meeting_id = meeting.id.unwrap();

    let session = record.sessions.first();
    match action {
        JoinAction::Joined => {
            let joined_at = session
                .and_then(|s| s.join_time)
                .map(bson::DateTime::from_chrono);
            state
                .meetings
                .join_participant(
                    meeting_id,
                    None,
                    &record.display_name,
                    record.email.clone(),
                    "zoom",
                    None,
                    joined_at,
                )
                .await?;
            publish::emit_participant_event(
                state,
                meeting_id,
                "participant:joined",
                &record.display_name,
            )
            .await;
        }
        JoinAction::Left => {
            let left_at = session
                .and_then(|s| s.leave_time)
                .map(bson::DateTime::from_chrono);
            state
                .meetings
                .leave_participant(meeting_id, None, &record.display_name, left_at)
                .await?;
            publish::emit_participant_event(
                state,
                meeting_id,
                "participant:left",
                &record.display_name,
            )
            .await;
        }
        _ => {}
    }

    state
        .join_events
        .append(JoinEvent {
            id: None,
            user_id: None,
            meeting_id: Some(meeting_id),
            meeting_code: Some(code),
            display_name: record.display_name.clone(),
            action,
            metadata: JoinMetadata {
                ip: None,
                user_agent: None,
                device_type: Some("zoom".to_string()),
            },
            created_at: bson::DateTime::now(),
        })
        .await?;

    publish::publish_snapshot(state, meeting_id).await;
    Ok(())
}

// Linking an anonymous roster entry to an account happens over REST, not
// webhooks, but shares the same audit trail.
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub participant_id: String,
    pub user_id: String,
}

pub async fn link_participant(
    State(state): State<AppState>,
    auth: crate::extractors::auth::AuthUser,
    Json(body): Json<LinkRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_meeting_manager()?;

    let participant_id = ObjectId::parse_str(&body.participant_id)
        .map_err(|_| ApiError::BadRequest("Invalid participant_id".to_string()))?;
    let user_id = ObjectId::parse_str(&body.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let participant = state.meetings.participants.find_by_id(participant_id).await?;
    let user = state.users.base.find_by_id(user_id).await?;

    let student_info = user.student_id.as_ref().map(|sid| {
        rollcall_db::models::StudentInfo {
            student_id: sid.clone(),
            first_name: user.display_name.clone(),
            last_name: String::new(),
            department: user.department.clone(),
        }
    });

    state
        .meetings
        .link_participant(participant_id, user_id, student_info)
        .await?;

    state
        .join_events
        .append(JoinEvent {
            id: None,
            user_id: Some(user_id),
            meeting_id: Some(participant.meeting_id),
            meeting_code: None,
            display_name: participant.display_name.clone(),
            action: JoinAction::Linked,
            metadata: JoinMetadata::default(),
            created_at: bson::DateTime::now(),
        })
        .await?;

    publish::publish_snapshot(&state, participant.meeting_id).await;

    Ok(Json(serde_json::json!({ "linked": true })))
}
