//! Post persistence. Maps between the `posts` table and the domain model;
//! heart mutations are single guarded UPDATEs so set membership and the
//! counter always move together.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use wl_core::models::{BleedPost, Category, PostFilter, PostSort};
use wl_core::traits::PostRepo;

use crate::{blob_to_uuid, uuid_to_blob};

pub struct SqlitePostRepo {
    pool: SqlitePool,
}

impl SqlitePostRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_post(row: &SqliteRow) -> BleedPost {
    BleedPost {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        created_by: row
            .get::<Option<Vec<u8>>, _>("created_by")
            .map(|blob| blob_to_uuid(&blob)),
        content: row.get("content"),
        emotion_tags: serde_json::from_str(&row.get::<String, _>("emotion_tags"))
            .unwrap_or_default(),
        category: Category::parse(&row.get::<String, _>("category")).unwrap_or_default(),
        heart_count: row.get("heart_count"),
        hearted_by: serde_json::from_str(&row.get::<String, _>("hearted_by"))
            .unwrap_or_default(),
        hidden: row.get("hidden"),
        created_at: row.get("created_at"),
    }
}

/// WHERE fragment + bind values for a feed filter. `hidden = 0` is always
/// part of it; the binds line up with the `?` placeholders in order.
fn filter_sql(filter: &PostFilter) -> (String, Vec<String>) {
    let mut sql = String::from("hidden = 0");
    let mut binds = Vec::new();
    if let Some(emotion) = &filter.emotion {
        sql.push_str(" AND EXISTS (SELECT 1 FROM json_each(posts.emotion_tags) WHERE value = ?)");
        binds.push(emotion.clone());
    }
    if let Some(category) = filter.category {
        sql.push_str(" AND category = ?");
        binds.push(category.as_str().to_string());
    }
    if let Some(search) = &filter.search {
        sql.push_str(" AND instr(lower(content), lower(?)) > 0");
        binds.push(search.clone());
    }
    (sql, binds)
}

fn order_sql(sort: PostSort) -> &'static str {
    match sort {
        PostSort::Recent => "created_at DESC",
        PostSort::Top => "heart_count DESC, created_at DESC",
    }
}

#[async_trait]
impl PostRepo for SqlitePostRepo {
    async fn create(&self, post: &BleedPost) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, created_by, content, emotion_tags, category, heart_count, hearted_by, hidden, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(post.created_by.map(uuid_to_blob))
        .bind(&post.content)
        .bind(serde_json::to_string(&post.emotion_tags)?)
        .bind(post.category.as_str())
        .bind(post.heart_count)
        .bind(serde_json::to_string(&post.hearted_by)?)
        .bind(post.hidden)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row_to_post(&row)))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<BleedPost>> {
        let (where_sql, binds) = filter_sql(filter);
        let sql = format!(
            "SELECT * FROM posts WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
            order_sql(sort)
        );
        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind.as_str());
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    async fn count(&self, filter: &PostFilter) -> anyhow::Result<i64> {
        let (where_sql, binds) = filter_sql(filter);
        let sql = format!("SELECT COUNT(*) AS n FROM posts WHERE {where_sql}");
        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind.as_str());
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.get("n"))
    }

    async fn list_hearted_by(&self, user_id: Uuid) -> anyhow::Result<Vec<BleedPost>> {
        let rows = sqlx::query(
            "SELECT * FROM posts
             WHERE hidden = 0
               AND EXISTS (SELECT 1 FROM json_each(posts.hearted_by) WHERE value = ?)
             ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    /// The membership guard and both sub-effects live in one statement;
    /// SQLite applies it atomically, so a concurrent duplicate heart
    /// resolves to zero affected rows instead of a double increment.
    async fn add_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        let applied = sqlx::query(
            "UPDATE posts
                SET hearted_by = json_insert(hearted_by, '$[#]', ?1),
                    heart_count = heart_count + 1
              WHERE id = ?2
                AND NOT EXISTS (SELECT 1 FROM json_each(posts.hearted_by) WHERE value = ?1)",
        )
        .bind(user_id.to_string())
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?
        .rows_affected();
        if applied == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn remove_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        let applied = sqlx::query(
            "UPDATE posts
                SET hearted_by = (SELECT COALESCE(json_group_array(value), '[]')
                                    FROM json_each(posts.hearted_by) WHERE value <> ?1),
                    heart_count = MAX(heart_count - 1, 0)
              WHERE id = ?2
                AND EXISTS (SELECT 1 FROM json_each(posts.hearted_by) WHERE value = ?1)",
        )
        .bind(user_id.to_string())
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?
        .rows_affected();
        if applied == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> anyhow::Result<Option<BleedPost>> {
        let applied = sqlx::query("UPDATE posts SET hidden = ? WHERE id = ?")
            .bind(hidden)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        if applied == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let removed = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }
}
