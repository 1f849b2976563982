use axum::{Json, extract::{Path, Query, State}};
use rollcall_db::models::ClassifierStrategy;
use rollcall_services::attendance::{self, AttendanceSnapshot};
use rollcall_services::live::SubscriptionOptions;
use rollcall_services::normalize::{self, RosterSource};
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::publish};

use super::meeting::parse_oid;

#[derive(Debug, Deserialize, Default)]
pub struct ReportParams {
    pub threshold: Option<u32>,
    pub strategy: Option<String>,
    #[serde(default)]
    pub enriched: bool,
}

/// Current computed roster for a meeting: the live-dashboard feed over REST.
pub async fn live(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = compute_snapshot(&state, &meeting_id, &ReportParams::default()).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "seq": snapshot.seq,
        "participants": snapshot.participants,
        "statistics": snapshot.statistics,
    })))
}

/// Attendance report with optional threshold/strategy overrides. With
/// `enriched=true`, linked participants are hydrated with account details
/// and the response carries authentication statistics.
pub async fn report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
    Query(params): Query<ReportParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut snapshot = compute_snapshot(&state, &meeting_id, &params).await?;

    if params.enriched {
        hydrate_accounts(&state, &mut snapshot).await;
        return Ok(Json(serde_json::json!({
            "success": true,
            "seq": snapshot.seq,
            "threshold": snapshot.threshold,
            "participants": snapshot.participants,
            "statistics": snapshot.statistics,
            "authenticationStats": snapshot.authentication_stats,
        })));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "seq": snapshot.seq,
        "threshold": snapshot.threshold,
        "participants": snapshot.participants,
        "statistics": snapshot.statistics,
    })))
}

/// The stored roster rendered in the raw webhook wire shape, uncomputed.
pub async fn webhook_roster(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let participants = state.meetings.list_participants(mid).await?;

    let items: Vec<serde_json::Value> = participants
        .iter()
        .flat_map(|p| {
            p.sessions.iter().map(move |s| {
                serde_json::json!({
                    "user_name": p.display_name,
                    "email": p.email,
                    "join_time": s.joined_at.to_chrono().to_rfc3339(),
                    "leave_time": s.left_at.map(|t| t.to_chrono().to_rfc3339()),
                })
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "participants": items })))
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub source: RosterSource,
}

/// Bulk roster intake: accepts any of the historical payload shapes,
/// normalizes, and upserts the meeting's roster.
pub async fn import_roster(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
    Query(params): Query<ImportParams>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_meeting_manager()?;
    let mid = parse_oid(&meeting_id)?;
    state.meetings.base.find_by_id(mid).await?;

    let roster = normalize::sanitize(params.source, Some(&payload));
    let imported = roster.participants.len();

    for record in &roster.participants {
        state.meetings.import_roster_entry(mid, record).await?;
    }

    publish::publish_snapshot(&state, mid).await;

    Ok(Json(serde_json::json!({
        "success": true,
        "imported": imported,
    })))
}

async fn compute_snapshot(
    state: &AppState,
    meeting_id: &str,
    params: &ReportParams,
) -> Result<AttendanceSnapshot, ApiError> {
    let mid = parse_oid(meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    let participants = state.meetings.list_participants(mid).await?;

    let threshold = params.threshold.map(|t| t.min(100));
    let strategy = params
        .strategy
        .as_deref()
        .map(|s| {
            ClassifierStrategy::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown strategy: {s}")))
        })
        .transpose()?;

    let records: Vec<_> = participants
        .iter()
        .map(attendance::record_from_participant)
        .collect();

    let options = SubscriptionOptions {
        threshold,
        strategy,
    };
    let seq = state.live.current_seq(&mid);

    Ok(publish::snapshot_for(&meeting, records, options, seq))
}

/// Fills in usernames and roles for roster entries linked to an account.
async fn hydrate_accounts(state: &AppState, snapshot: &mut AttendanceSnapshot) {
    for participant in &mut snapshot.participants {
        let Some(linked) = participant.authenticated_user.as_mut() else {
            continue;
        };
        let Ok(user_id) = bson::oid::ObjectId::parse_str(&linked.user_id) else {
            continue;
        };
        if let Ok(user) = state.users.base.find_by_id(user_id).await {
            linked.username = Some(user.username);
            linked.role = Some(format!("{:?}", user.role).to_lowercase());
        }
    }
}
