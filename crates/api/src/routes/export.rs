use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, header},
};
use chrono::Utc;
use rollcall_db::models::ClassifierStrategy;
use rollcall_services::attendance;
use rollcall_services::export::csv::export_attendance;
use rollcall_services::live::SubscriptionOptions;
use serde::Deserialize;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState, ws::publish};

use super::meeting::parse_oid;

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub threshold: Option<u32>,
    pub strategy: Option<String>,
}

/// CSV download of the classified roster.
pub async fn attendance_csv(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(meeting_id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    auth.require_meeting_manager()?;

    let mid = parse_oid(&meeting_id)?;
    let meeting = state.meetings.base.find_by_id(mid).await?;
    let participants = state.meetings.list_participants(mid).await?;

    let records: Vec<_> = participants
        .iter()
        .map(attendance::record_from_participant)
        .collect();

    let strategy = params
        .strategy
        .as_deref()
        .map(|s| {
            ClassifierStrategy::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown strategy: {s}")))
        })
        .transpose()?;
    let options = SubscriptionOptions {
        threshold: params.threshold.map(|t| t.min(100)),
        strategy,
    };

    let snapshot = publish::snapshot_for(
        &meeting,
        records,
        options,
        state.live.current_seq(&mid),
    );
    let bytes = export_attendance(&snapshot)?;

    let filename = format!(
        "attendance-{}-{}.csv",
        meeting.meeting_code,
        Utc::now().format("%Y%m%d")
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, "text/csv".parse().unwrap());
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename)
            .parse()
            .unwrap(),
    );

    Ok((headers, bytes))
}
