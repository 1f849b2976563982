use mongodb::Database;
use rollcall_config::Settings;
use rollcall_db::models::ClassifierStrategy;
use rollcall_services::{
    AuthService, LiveAttendanceTracker,
    dao::{
        join_event::{JoinEventStore, MongoJoinEventStore},
        meeting::MeetingDao,
        user::UserDao,
    },
};
use std::sync::Arc;

use crate::ws::storage::WsStorage;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub meetings: Arc<MeetingDao>,
    pub join_events: Arc<dyn JoinEventStore>,
    pub live: Arc<LiveAttendanceTracker>,
    pub ws_storage: Arc<WsStorage>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let meetings = Arc::new(MeetingDao::new(&db));
        let join_events: Arc<dyn JoinEventStore> = Arc::new(MongoJoinEventStore::new(&db));
        let live = Arc::new(LiveAttendanceTracker::new());
        let ws_storage = Arc::new(WsStorage::new());

        Self {
            db,
            settings,
            auth,
            users,
            meetings,
            join_events,
            live,
            ws_storage,
        }
    }

    /// Classifier used when a meeting (or request) doesn't pick one.
    pub fn default_strategy(&self) -> ClassifierStrategy {
        ClassifierStrategy::parse(&self.settings.attendance.default_classifier)
            .unwrap_or_default()
    }
}
