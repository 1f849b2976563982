pub mod aggregate;
pub mod classify;
pub mod duration;
pub mod snapshot;
pub mod stats;
pub mod types;

pub use aggregate::{SessionAggregate, aggregate_sessions};
pub use classify::{attendance_percentage, classify};
pub use duration::{meeting_duration, session_duration};
pub use snapshot::{evaluate, record_from_participant, timing_from_meeting};
pub use stats::{authentication_stats, reduce};
pub use types::*;
