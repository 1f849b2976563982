use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::Database;
use rollcall_db::models::JoinEvent;

use super::base::{BaseDao, DaoResult};

/// Append-only store for the join audit trail. The trait is the seam:
/// handlers only ever append and read back, never update in place.
#[async_trait]
pub trait JoinEventStore: Send + Sync {
    async fn append(&self, event: JoinEvent) -> DaoResult<ObjectId>;
    async fn list_for_user(&self, user_id: ObjectId, limit: i64) -> DaoResult<Vec<JoinEvent>>;
    async fn list_for_meeting(&self, meeting_id: ObjectId) -> DaoResult<Vec<JoinEvent>>;
    async fn clear_for_user(&self, user_id: ObjectId) -> DaoResult<u64>;
}

pub struct MongoJoinEventStore {
    base: BaseDao<JoinEvent>,
}

impl MongoJoinEventStore {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, JoinEvent::COLLECTION),
        }
    }
}

#[async_trait]
impl JoinEventStore for MongoJoinEventStore {
    async fn append(&self, event: JoinEvent) -> DaoResult<ObjectId> {
        self.base.insert_one(&event).await
    }

    async fn list_for_user(&self, user_id: ObjectId, limit: i64) -> DaoResult<Vec<JoinEvent>> {
        let mut cursor = self
            .base
            .collection()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?;

        let mut events = Vec::new();
        while let Some(event) = cursor.try_next().await? {
            events.push(event);
        }
        Ok(events)
    }

    async fn list_for_meeting(&self, meeting_id: ObjectId) -> DaoResult<Vec<JoinEvent>> {
        self.base
            .find_many(
                doc! { "meeting_id": meeting_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    async fn clear_for_user(&self, user_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "user_id": user_id }).await
    }
}
