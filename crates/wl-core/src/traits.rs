//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//!
//! Repositories return `anyhow::Result`: a failure here means the store
//! itself misbehaved. Absence is `None`/`false`, never an error — the
//! service layer decides what absence means.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    BleedPost, Entry, EntryDraft, MoodCount, PostFilter, PostSort, Report, ReportStatus,
    ReporterId, User,
};

/// Persistence contract for bleed posts.
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn create(&self, post: &BleedPost) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<BleedPost>>;

    /// Non-hidden posts matching `filter`, ordered by `sort`.
    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<BleedPost>>;

    /// Count over the same implicit `hidden = false` filter as `list`.
    async fn count(&self, filter: &PostFilter) -> anyhow::Result<i64>;

    /// Non-hidden posts the user currently has a heart on, newest first.
    async fn list_hearted_by(&self, user_id: Uuid) -> anyhow::Result<Vec<BleedPost>>;

    /// Atomically adds `user_id` to the heart set and bumps the counter,
    /// as one compound mutation. Returns the updated post, or `None` when
    /// nothing was applied (post missing, or the user was already in the
    /// set — including via a concurrent duplicate call).
    async fn add_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>>;

    /// Mirror of [`add_heart`](PostRepo::add_heart): removes the user from
    /// the set and decrements the counter in one compound mutation.
    /// `None` when the post is missing or the user held no heart.
    async fn remove_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>>;

    /// Sets the moderation flag; `None` if the post is missing.
    async fn set_hidden(&self, id: Uuid, hidden: bool) -> anyhow::Result<Option<BleedPost>>;

    /// Returns whether a post was actually removed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Persistence contract for moderation reports.
#[async_trait]
pub trait ReportRepo: Send + Sync {
    /// Inserts the report. Returns `false` when a report for the same
    /// (post, reporter) pair already exists, in which case nothing is
    /// written.
    async fn create(&self, report: &Report) -> anyhow::Result<bool>;

    async fn find_by_post_and_reporter(
        &self,
        post_id: Uuid,
        reporter: &ReporterId,
    ) -> anyhow::Result<Option<Report>>;

    /// Reports against a post, any status. Derived on demand rather than
    /// denormalized so the audit trail stays the source of truth.
    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64>;

    /// Moves every report for a post to `status`; returns how many moved.
    async fn mark_all_for_post(&self, post_id: Uuid, status: ReportStatus)
        -> anyhow::Result<u64>;

    /// All reports, newest first, for the moderation queue.
    async fn list(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<Report>>;
    async fn count_all(&self) -> anyhow::Result<i64>;

    /// Single-report status change; `None` if the report is missing.
    async fn set_status(&self, id: Uuid, status: ReportStatus) -> anyhow::Result<Option<Report>>;
}

/// Account lookups, consumed for role and ban checks.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

/// Persistence contract for journal entries. Every accessor is scoped to
/// the owning user; there is no way to reach someone else's entry.
#[async_trait]
pub trait EntryRepo: Send + Sync {
    async fn create(&self, entry: &Entry) -> anyhow::Result<()>;
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Entry>>;
    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Entry>>;
    async fn update_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        draft: &EntryDraft,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Entry>>;
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    /// Tag frequencies across the user's entries, most frequent first.
    async fn mood_counts(&self, user_id: Uuid) -> anyhow::Result<Vec<MoodCount>>;
}

/// Bearer credential contract.
pub trait CredentialVerifier: Send + Sync {
    /// Maps a bearer token to the user id it certifies. Fails closed with
    /// `AppError::Unauthenticated` on anything malformed, forged, or
    /// expired.
    fn verify(&self, token: &str) -> Result<Uuid>;

    /// Issues a token for `user_id`, valid for `ttl`. Exists for seeding
    /// and tests; there is no issuance endpoint.
    fn issue(&self, user_id: Uuid, ttl: Duration) -> String;
}
