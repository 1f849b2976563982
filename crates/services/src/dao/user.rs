use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use rollcall_db::models::{User, UserRole};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        username: String,
        display_name: String,
        password_hash: String,
        role: UserRole,
        student_id: Option<String>,
        department: Option<String>,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            username,
            display_name,
            password_hash: Some(password_hash),
            role,
            student_id,
            department,
            last_active_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "username": username })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn touch_last_active(&self, user_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! { "$set": { "last_active_at": DateTime::now() } },
            )
            .await
    }
}
