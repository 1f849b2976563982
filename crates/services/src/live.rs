use bson::oid::ObjectId;
use dashmap::DashMap;
use rollcall_db::models::ClassifierStrategy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-subscription overrides. Absent values fall back to the meeting's
/// stored threshold and strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    pub threshold: Option<u32>,
    pub strategy: Option<ClassifierStrategy>,
}

struct MeetingFeed {
    seq: AtomicU64,
    subscribers: DashMap<String, SubscriptionOptions>,
}

impl MeetingFeed {
    fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            subscribers: DashMap::new(),
        }
    }
}

/// Tracks which WebSocket connections watch which meetings, and stamps each
/// published snapshot with a per-meeting monotonic sequence number. A
/// consumer that remembers the last seq it rendered can discard anything
/// older, whichever path (push or poll) delivered it.
pub struct LiveAttendanceTracker {
    feeds: DashMap<ObjectId, MeetingFeed>,
}

impl LiveAttendanceTracker {
    pub fn new() -> Self {
        Self {
            feeds: DashMap::new(),
        }
    }

    pub fn subscribe(
        &self,
        meeting_id: ObjectId,
        connection_id: &str,
        options: SubscriptionOptions,
    ) {
        self.feeds
            .entry(meeting_id)
            .or_insert_with(MeetingFeed::new)
            .subscribers
            .insert(connection_id.to_string(), options);
    }

    pub fn unsubscribe(&self, meeting_id: &ObjectId, connection_id: &str) {
        if let Some(feed) = self.feeds.get(meeting_id) {
            feed.subscribers.remove(connection_id);
        }
    }

    /// Drops the connection from every feed (socket closed).
    pub fn remove_connection(&self, connection_id: &str) {
        for feed in self.feeds.iter() {
            feed.subscribers.remove(connection_id);
        }
    }

    pub fn subscribers(&self, meeting_id: &ObjectId) -> Vec<(String, SubscriptionOptions)> {
        self.feeds
            .get(meeting_id)
            .map(|feed| {
                feed.subscribers
                    .iter()
                    .map(|entry| (entry.key().clone(), *entry.value()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_subscribers(&self, meeting_id: &ObjectId) -> bool {
        self.feeds
            .get(meeting_id)
            .map(|feed| !feed.subscribers.is_empty())
            .unwrap_or(false)
    }

    /// Meetings with at least one live watcher.
    pub fn watched_meetings(&self) -> Vec<ObjectId> {
        self.feeds
            .iter()
            .filter(|entry| !entry.value().subscribers.is_empty())
            .map(|entry| *entry.key())
            .collect()
    }

    /// Allocates the next sequence number for a meeting's snapshot stream.
    pub fn next_seq(&self, meeting_id: ObjectId) -> u64 {
        self.feeds
            .entry(meeting_id)
            .or_insert_with(MeetingFeed::new)
            .seq
            .fetch_add(1, Ordering::SeqCst)
            + 1
    }

    pub fn current_seq(&self, meeting_id: &ObjectId) -> u64 {
        self.feeds
            .get(meeting_id)
            .map(|feed| feed.seq.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl Default for LiveAttendanceTracker {
    fn default() -> Self {
        Self::new()
    }
}
