use axum::{Json, extract::{Path, Query, State}};
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use rollcall_db::models::{ClassifierStrategy, JoinAction, JoinEvent, JoinMetadata, Meeting};
use rollcall_services::dao::base::PaginationParams;
use rollcall_services::dao::meeting::NewMeeting;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::publish};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMeetingRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    pub description: Option<String>,
    /// Minutes; when set it is the percentage denominator.
    pub duration: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 100))]
    pub attendance_threshold: Option<u32>,
    pub classifier: Option<ClassifierStrategy>,
}

#[derive(Debug, Serialize)]
pub struct MeetingResponse {
    pub id: String,
    pub topic: String,
    pub status: String,
    pub meeting_code: String,
    pub duration: Option<u32>,
    pub attendance_threshold: u32,
    pub classifier: ClassifierStrategy,
    pub organizer_id: Option<String>,
    pub participant_count: u32,
    pub peak_participant_count: u32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub actual_start_time: Option<String>,
    pub actual_end_time: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.meetings.list(&params).await?;
    let items: Vec<MeetingResponse> = result.items.into_iter().map(to_response).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateMeetingRequest>,
) -> Result<Json<MeetingResponse>, ApiError> {
    auth.require_meeting_manager()?;
    body.validate()?;

    let spec = NewMeeting {
        topic: body.topic,
        description: body.description,
        duration: body.duration,
        start_time: body.start_time.map(bson::DateTime::from_chrono),
        end_time: body.end_time.map(bson::DateTime::from_chrono),
        attendance_threshold: body
            .attendance_threshold
            .unwrap_or(state.settings.attendance.default_threshold),
        classifier: body.classifier.unwrap_or_else(|| state.default_strategy()),
    };

    let meeting = state.meetings.create(auth.user_id, spec).await?;
    Ok(Json(to_response(meeting)))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<MeetingResponse>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    Ok(Json(to_response(meeting)))
}

pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    require_organizer_or_admin(&auth, &meeting)?;

    state.meetings.start(mid).await?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    publish::emit_meeting_event(&state, "meeting:started", &meeting).await;

    Ok(Json(serde_json::json!({ "started": true })))
}

pub async fn end(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    require_organizer_or_admin(&auth, &meeting)?;

    state.meetings.end(mid).await?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    publish::emit_meeting_event(&state, "meeting:ended", &meeting).await;
    publish::publish_snapshot(&state, mid).await;

    Ok(Json(serde_json::json!({ "ended": true })))
}

/// Self check-in: opens a session for the calling user.
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    let user = state.users.base.find_by_id(auth.user_id).await?;

    let student_info = user.student_id.as_ref().map(|sid| {
        rollcall_db::models::StudentInfo {
            student_id: sid.clone(),
            first_name: user.display_name.clone(),
            last_name: String::new(),
            department: user.department.clone(),
        }
    });

    let participant = state
        .meetings
        .join_participant(
            mid,
            Some(auth.user_id),
            &user.display_name,
            Some(user.email.clone()),
            "web",
            student_info,
            None,
        )
        .await?;

    state
        .join_events
        .append(JoinEvent {
            id: None,
            user_id: Some(auth.user_id),
            meeting_id: Some(mid),
            meeting_code: Some(meeting.meeting_code.clone()),
            display_name: user.display_name.clone(),
            action: JoinAction::Joined,
            metadata: JoinMetadata::default(),
            created_at: bson::DateTime::now(),
        })
        .await?;

    publish::emit_participant_event(&state, mid, "participant:joined", &user.display_name).await;
    publish::publish_snapshot(&state, mid).await;

    Ok(Json(serde_json::json!({
        "participant_id": participant.id.unwrap().to_hex(),
        "joined": true,
    })))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    let user = state.users.base.find_by_id(auth.user_id).await?;

    let closed = state
        .meetings
        .leave_participant(mid, Some(auth.user_id), &user.display_name, None)
        .await?;

    if closed {
        state
            .join_events
            .append(JoinEvent {
                id: None,
                user_id: Some(auth.user_id),
                meeting_id: Some(mid),
                meeting_code: Some(meeting.meeting_code.clone()),
                display_name: user.display_name.clone(),
                action: JoinAction::Left,
                metadata: JoinMetadata::default(),
                created_at: bson::DateTime::now(),
            })
            .await?;

        publish::emit_participant_event(&state, mid, "participant:left", &user.display_name)
            .await;
        publish::publish_snapshot(&state, mid).await;
    }

    Ok(Json(serde_json::json!({ "left": closed })))
}

/// The stored roster, without derived attendance fields.
pub async fn participants(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(meeting_id): Path<String>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let mid = parse_oid(&meeting_id)?;
    let parts = state.meetings.list_participants(mid).await?;
    let items: Vec<serde_json::Value> = parts
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id.unwrap().to_hex(),
                "user_id": p.user_id.map(|u| u.to_hex()),
                "display_name": p.display_name,
                "email": p.email,
                "is_external": p.is_external,
                "session_count": p.sessions.len(),
                "has_open_session": p.has_open_session(),
            })
        })
        .collect();

    Ok(Json(items))
}

pub fn parse_oid(s: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(s).map_err(|_| ApiError::BadRequest(format!("Invalid ObjectId: {s}")))
}

fn require_organizer_or_admin(auth: &AuthUser, meeting: &Meeting) -> Result<(), ApiError> {
    if meeting.organizer_id == Some(auth.user_id) || auth.role.can_manage_meetings() {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "Only the organizer or an instructor can do this".to_string(),
    ))
}

fn to_response(m: Meeting) -> MeetingResponse {
    MeetingResponse {
        id: m.id.unwrap().to_hex(),
        topic: m.topic,
        status: format!("{:?}", m.status),
        meeting_code: m.meeting_code,
        duration: m.duration,
        attendance_threshold: m.attendance_threshold,
        classifier: m.classifier,
        organizer_id: m.organizer_id.map(|id| id.to_hex()),
        participant_count: m.participant_count,
        peak_participant_count: m.peak_participant_count,
        start_time: m.start_time.map(|t| t.to_chrono().to_rfc3339()),
        end_time: m.end_time.map(|t| t.to_chrono().to_rfc3339()),
        actual_start_time: m.actual_start_time.map(|t| t.to_chrono().to_rfc3339()),
        actual_end_time: m.actual_end_time.map(|t| t.to_chrono().to_rfc3339()),
    }
}
