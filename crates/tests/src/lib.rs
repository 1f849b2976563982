pub mod fixtures;

#[cfg(test)]
mod meeting_tests;
#[cfg(test)]
mod attendance_tests;
#[cfg(test)]
mod webhook_tests;
#[cfg(test)]
mod join_tracking_tests;
#[cfg(test)]
mod ws_tests;
