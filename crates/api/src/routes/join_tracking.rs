use axum::{Json, extract::State};
use rollcall_db::models::{JoinAction, JoinEvent, JoinMetadata};
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

const HISTORY_LIMIT: i64 = 100;

/// The caller's join history, newest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let events = state
        .join_events
        .list_for_user(auth.user_id, HISTORY_LIMIT)
        .await?;

    let items: Vec<serde_json::Value> = events
        .iter()
        .map(|e| {
            serde_json::json!({
                "id": e.id.unwrap().to_hex(),
                "meeting_id": e.meeting_id.map(|m| m.to_hex()),
                "meeting_code": e.meeting_code,
                "display_name": e.display_name,
                "action": e.action,
                "created_at": e.created_at.to_chrono().to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub meeting_code: Option<String>,
    pub display_name: Option<String>,
    pub device_type: Option<String>,
}

/// Appends a manual entry (e.g. a QR check-in recorded outside a live
/// session).
pub async fn track(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TrackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let meeting_id = match &body.meeting_code {
        Some(code) => state
            .meetings
            .find_by_code(code)
            .await?
            .and_then(|m| m.id),
        None => None,
    };

    let event = JoinEvent {
        id: None,
        user_id: Some(auth.user_id),
        meeting_id,
        meeting_code: body.meeting_code.clone(),
        display_name: body
            .display_name
            .clone()
            .unwrap_or_else(|| auth.username.clone()),
        action: JoinAction::Manual,
        metadata: JoinMetadata {
            ip: None,
            user_agent: None,
            device_type: body.device_type.clone(),
        },
        created_at: bson::DateTime::now(),
    };

    let id = state.join_events.append(event).await?;

    Ok(Json(serde_json::json!({ "id": id.to_hex(), "tracked": true })))
}

/// Clears the caller's history.
pub async fn clear(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.join_events.clear_for_user(auth.user_id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
