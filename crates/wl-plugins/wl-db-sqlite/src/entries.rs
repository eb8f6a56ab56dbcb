//! Journal entry persistence. Every statement carries the `user_id`
//! predicate, so an entry is unreachable outside its owner's scope.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use wl_core::models::{Entry, EntryDraft, MoodCount};
use wl_core::traits::EntryRepo;

use crate::{blob_to_uuid, uuid_to_blob};

pub struct SqliteEntryRepo {
    pool: SqlitePool,
}

impl SqliteEntryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &SqliteRow) -> Entry {
    Entry {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        user_id: blob_to_uuid(row.get::<Vec<u8>, _>("user_id").as_slice()),
        title: row.get("title"),
        content: row.get("content"),
        emotion_tags: serde_json::from_str(&row.get::<String, _>("emotion_tags"))
            .unwrap_or_default(),
        is_encrypted: row.get("is_encrypted"),
        encrypted_data: row.get("encrypted_data"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl EntryRepo for SqliteEntryRepo {
    async fn create(&self, entry: &Entry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO entries (id, user_id, title, content, emotion_tags, is_encrypted, encrypted_data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(entry.id))
        .bind(uuid_to_blob(entry.user_id))
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(serde_json::to_string(&entry.emotion_tags)?)
        .bind(entry.is_encrypted)
        .bind(&entry.encrypted_data)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Entry>> {
        let rows = sqlx::query(
            "SELECT * FROM entries WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Entry>> {
        let row = sqlx::query("SELECT * FROM entries WHERE id = ? AND user_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(user_id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row_to_entry(&row)))
    }

    async fn update_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        draft: &EntryDraft,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Entry>> {
        let applied = sqlx::query(
            "UPDATE entries
                SET title = ?, content = ?, emotion_tags = ?, is_encrypted = ?,
                    encrypted_data = ?, updated_at = ?
              WHERE id = ? AND user_id = ?",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(serde_json::to_string(&draft.emotion_tags)?)
        .bind(draft.is_encrypted)
        .bind(&draft.encrypted_data)
        .bind(updated_at)
        .bind(uuid_to_blob(id))
        .bind(uuid_to_blob(user_id))
        .execute(&self.pool)
        .await?
        .rows_affected();
        if applied == 0 {
            return Ok(None);
        }
        self.find_for_user(id, user_id).await
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let removed = sqlx::query("DELETE FROM entries WHERE id = ? AND user_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn mood_counts(&self, user_id: Uuid) -> anyhow::Result<Vec<MoodCount>> {
        let rows = sqlx::query(
            "SELECT value AS tag, COUNT(*) AS n
               FROM entries, json_each(entries.emotion_tags)
              WHERE user_id = ?
              GROUP BY value
              ORDER BY n DESC, tag ASC",
        )
        .bind(uuid_to_blob(user_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| MoodCount {
                tag: row.get("tag"),
                count: row.get("n"),
            })
            .collect())
    }
}
