//! # wl-db-sqlite
//!
//! SQLite implementation of the wl-core repository ports.
//!
//! The mapping keeps the store document-shaped: one row per post/report/
//! entry, with in-document sets (`hearted_by`, `emotion_tags`) embedded as
//! JSON TEXT columns and queried through `json_each`. Compound mutations
//! that must not tear (heart set + counter) are single guarded UPDATE
//! statements, so SQLite's per-statement atomicity carries the invariant.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

mod entries;
mod posts;
mod reports;
mod users;

pub use entries::SqliteEntryRepo;
pub use posts::SqlitePostRepo;
pub use reports::SqliteReportRepo;
pub use users::SqliteUserRepo;

// Helpers for UUID conversion
pub(crate) fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

pub(crate) fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id           BLOB PRIMARY KEY,
        created_by   BLOB,
        content      TEXT NOT NULL,
        emotion_tags TEXT NOT NULL DEFAULT '[]',
        category     TEXT NOT NULL DEFAULT 'Other',
        heart_count  INTEGER NOT NULL DEFAULT 0,
        hearted_by   TEXT NOT NULL DEFAULT '[]',
        hidden       INTEGER NOT NULL DEFAULT 0,
        created_at   TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at DESC)",
    "CREATE TABLE IF NOT EXISTS reports (
        id         BLOB PRIMARY KEY,
        post_id    BLOB NOT NULL,
        reporter   TEXT NOT NULL,
        reason     TEXT NOT NULL DEFAULT '',
        status     TEXT NOT NULL DEFAULT 'pending',
        created_at TIMESTAMP NOT NULL,
        UNIQUE (post_id, reporter)
    )",
    "CREATE INDEX IF NOT EXISTS idx_reports_post ON reports (post_id)",
    "CREATE TABLE IF NOT EXISTS users (
        id         BLOB PRIMARY KEY,
        role       TEXT NOT NULL DEFAULT 'user',
        banned     INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS entries (
        id             BLOB PRIMARY KEY,
        user_id        BLOB NOT NULL,
        title          TEXT,
        content        TEXT NOT NULL DEFAULT '',
        emotion_tags   TEXT NOT NULL DEFAULT '[]',
        is_encrypted   INTEGER NOT NULL DEFAULT 0,
        encrypted_data TEXT,
        created_at     TIMESTAMP NOT NULL,
        updated_at     TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_entries_user ON entries (user_id, created_at DESC)",
];

/// Connection pool plus schema bootstrap. The repos share the pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // An in-memory database exists per connection, so the pool must be
        // pinned to a single long-lived one or every checkout would see a
        // fresh empty schema.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::debug!("sqlite schema ready at {url}");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn posts(&self) -> SqlitePostRepo {
        SqlitePostRepo::new(self.pool())
    }

    pub fn reports(&self) -> SqliteReportRepo {
        SqliteReportRepo::new(self.pool())
    }

    pub fn users(&self) -> SqliteUserRepo {
        SqliteUserRepo::new(self.pool())
    }

    pub fn entries(&self) -> SqliteEntryRepo {
        SqliteEntryRepo::new(self.pool())
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}
