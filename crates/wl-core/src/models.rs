//! # Domain Models
//!
//! These structs represent the core entities of WoundLog.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Everything serializes camelCase, which is the wire format the clients
//! already speak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved id prefix for client-only decorative posts. Ids carrying this
/// prefix never exist in storage.
pub const FEATURED_PREFIX: &str = "featured-";

/// Coarse genre of a bleed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    Poetry,
    Rant,
    Confession,
    Story,
    Thought,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Poetry => "Poetry",
            Category::Rant => "Rant",
            Category::Confession => "Confession",
            Category::Story => "Story",
            Category::Thought => "Thought",
            Category::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Poetry" => Some(Category::Poetry),
            "Rant" => Some(Category::Rant),
            "Confession" => Some(Category::Confession),
            "Story" => Some(Category::Story),
            "Thought" => Some(Category::Thought),
            "Other" => Some(Category::Other),
            _ => None,
        }
    }
}

/// A public, optionally-anonymous confession entry on the shared feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BleedPost {
    pub id: Uuid,
    /// Absent for anonymous submissions
    pub created_by: Option<Uuid>,
    pub content: String,
    /// Free-form labels; the UI offers a fixed palette but anything goes
    pub emotion_tags: Vec<String>,
    pub category: Category,
    /// Always equals `hearted_by.len()`
    pub heart_count: i64,
    /// Users with an active heart on this post; set semantics
    pub hearted_by: Vec<Uuid>,
    /// Hidden posts are excluded from public listings but not deleted
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl BleedPost {
    /// A fresh, unhearted, visible post.
    pub fn new(
        created_by: Option<Uuid>,
        content: String,
        emotion_tags: Vec<String>,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_by,
            content,
            emotion_tags,
            category,
            heart_count: 0,
            hearted_by: Vec::new(),
            hidden: false,
            created_at: Utc::now(),
        }
    }
}

/// A path id as received from a route: either a real storage id or a
/// synthetic featured post that only exists client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRef {
    Real(Uuid),
    Featured(String),
}

impl PostRef {
    /// Classifies a raw path segment. `None` means the id is neither a
    /// UUID nor a featured id, i.e. nothing it could ever refer to.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with(FEATURED_PREFIX) {
            return Some(PostRef::Featured(raw.to_string()));
        }
        Uuid::parse_str(raw).ok().map(PostRef::Real)
    }
}

/// Who filed a report. Requests without a verifiable credential all share
/// the one anonymous sentinel, so a single stranger can never file twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReporterId {
    User(Uuid),
    Anonymous,
}

pub const ANONYMOUS_REPORTER: &str = "anonymous";

impl ReporterId {
    pub fn from_identity(user_id: Option<Uuid>) -> Self {
        match user_id {
            Some(id) => ReporterId::User(id),
            None => ReporterId::Anonymous,
        }
    }

    /// The stable string this identity is stored and deduplicated under.
    pub fn storage_key(&self) -> String {
        match self {
            ReporterId::User(id) => id.to_string(),
            ReporterId::Anonymous => ANONYMOUS_REPORTER.to_string(),
        }
    }
}

impl From<ReporterId> for String {
    fn from(value: ReporterId) -> Self {
        value.storage_key()
    }
}

impl TryFrom<String> for ReporterId {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == ANONYMOUS_REPORTER {
            Ok(ReporterId::Anonymous)
        } else {
            Uuid::parse_str(&value).map(ReporterId::User)
        }
    }
}

/// Review state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Actioned,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Actioned => "actioned",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ReportStatus::Pending),
            "reviewed" => Some(ReportStatus::Reviewed),
            "actioned" => Some(ReportStatus::Actioned),
            "dismissed" => Some(ReportStatus::Dismissed),
            _ => None,
        }
    }
}

/// A moderation signal against exactly one post. Reports are an
/// append-only audit trail and may outlive the post they point at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub post_id: Uuid,
    pub reporter: ReporterId,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(post_id: Uuid, reporter: ReporterId, reason: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            reporter,
            reason,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Site-wide privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Moderator,
}

impl Role {
    pub fn is_moderator(&self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "moderator" => Some(Role::Moderator),
            _ => None,
        }
    }
}

/// An account, consumed for role and ban checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    /// Banned users may not create posts
    pub banned: bool,
    pub created_at: DateTime<Utc>,
}

/// A private journal entry. When `is_encrypted` is set the server only
/// ever sees the opaque `encrypted_data` payload; plaintext and keys stay
/// on the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    /// Markdown
    pub content: String,
    pub emotion_tags: Vec<String>,
    pub is_encrypted: bool,
    pub encrypted_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of an entry, shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: Option<String>,
    pub content: String,
    pub emotion_tags: Vec<String>,
    pub is_encrypted: bool,
    pub encrypted_data: Option<String>,
}

/// How many of the caller's entries carry a given emotion tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodCount {
    pub tag: String,
    pub count: i64,
}

/// Listing filter for the public feed. `hidden = false` is always implied
/// by the repositories; it is not a caller choice.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Membership test against `emotion_tags`
    pub emotion: Option<String>,
    pub category: Option<Category>,
    /// Case-insensitive substring of `content`
    pub search: Option<String>,
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    /// Newest first
    #[default]
    Recent,
    /// Most hearts first, newest first among ties
    Top,
}
