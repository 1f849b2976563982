use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
        ],
    )
    .await?;

    // Meetings
    create_indexes(
        db,
        "meetings",
        vec![
            index(bson::doc! { "status": 1, "start_time": -1 }),
            index(bson::doc! { "organizer_id": 1, "created_at": -1 }),
            index_unique(bson::doc! { "meeting_code": 1 }),
        ],
    )
    .await?;

    // Meeting Participants
    create_indexes(
        db,
        "meeting_participants",
        vec![
            index(bson::doc! { "meeting_id": 1, "user_id": 1 }),
            index(bson::doc! { "meeting_id": 1, "display_name": 1 }),
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Join Events
    create_indexes(
        db,
        "join_events",
        vec![
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "meeting_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
