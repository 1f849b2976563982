pub mod attendance;
pub mod auth;
pub mod dao;
pub mod export;
pub mod live;
pub mod normalize;
pub mod webhook;

pub use auth::AuthService;
pub use dao::*;
pub use live::LiveAttendanceTracker;
