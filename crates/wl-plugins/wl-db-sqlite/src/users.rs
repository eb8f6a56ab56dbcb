//! Account lookups. The service only ever reads role and ban state;
//! `insert` exists for seeding and tests.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use wl_core::models::{Role, User};
use wl_core::traits::UserRepo;

use crate::{blob_to_uuid, uuid_to_blob};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, role, banned, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(user.role.as_str())
            .bind(user.banned)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        role: Role::parse(&row.get::<String, _>("role")).unwrap_or_default(),
        banned: row.get("banned"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row_to_user(&row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store;
    use chrono::Utc;

    #[tokio::test]
    async fn stores_role_and_ban_state() {
        let store = memory_store().await;
        let repo = store.users();
        let user = User {
            id: Uuid::now_v7(),
            role: Role::Moderator,
            banned: true,
            created_at: Utc::now(),
        };
        repo.insert(&user).await.unwrap();

        let loaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.role, Role::Moderator);
        assert!(loaded.banned);
        assert!(repo.find_by_id(Uuid::now_v7()).await.unwrap().is_none());
    }
}
