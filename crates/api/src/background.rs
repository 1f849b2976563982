use std::time::Duration;
use tracing::{info, warn};

use crate::state::AppState;
use crate::ws::publish;

/// Periodically republishes snapshots for in-progress meetings that have
/// live watchers. Open sessions accrue time against the wall clock, so
/// dashboards need ticks even when nobody joins or leaves.
pub fn spawn_snapshot_republisher(state: AppState) {
    let interval_secs = state.settings.attendance.republish_interval_secs.max(1);
    info!(interval_secs, "Snapshot republisher started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;

            let in_progress = match state.meetings.in_progress_ids().await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(%e, "Republisher: meeting lookup failed");
                    continue;
                }
            };

            for meeting_id in in_progress {
                if state.live.has_subscribers(&meeting_id) {
                    publish::publish_snapshot(&state, meeting_id).await;
                }
            }
        }
    });
}
