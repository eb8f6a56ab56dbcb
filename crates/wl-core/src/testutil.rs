//! In-memory port implementations.
//!
//! Backing state is a plain `Mutex`ed collection, which is plenty for the
//! single-process test suites these exist for. Filter, sort, and
//! pagination semantics mirror the SQLite plugin so service tests see the
//! same behavior either way.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    BleedPost, Entry, EntryDraft, MoodCount, PostFilter, PostSort, Report, ReportStatus,
    ReporterId, User,
};
use crate::traits::{CredentialVerifier, EntryRepo, PostRepo, ReportRepo, UserRepo};

#[derive(Default)]
pub struct MemoryPostRepo {
    posts: Mutex<Vec<BleedPost>>,
}

fn matches(post: &BleedPost, filter: &PostFilter) -> bool {
    if post.hidden {
        return false;
    }
    if let Some(emotion) = &filter.emotion {
        if !post.emotion_tags.iter().any(|t| t == emotion) {
            return false;
        }
    }
    if let Some(category) = filter.category {
        if post.category != category {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        if !post
            .content
            .to_lowercase()
            .contains(&search.to_lowercase())
        {
            return false;
        }
    }
    true
}

fn order(posts: &mut [BleedPost], sort: PostSort) {
    match sort {
        PostSort::Recent => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        PostSort::Top => posts.sort_by(|a, b| {
            b.heart_count
                .cmp(&a.heart_count)
                .then(b.created_at.cmp(&a.created_at))
        }),
    }
}

#[async_trait]
impl PostRepo for MemoryPostRepo {
    async fn create(&self, post: &BleedPost) -> anyhow::Result<()> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<BleedPost>> {
        let mut matching: Vec<BleedPost> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches(p, filter))
            .cloned()
            .collect();
        order(&mut matching, sort);
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: &PostFilter) -> anyhow::Result<i64> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches(p, filter))
            .count() as i64)
    }

    async fn list_hearted_by(&self, user_id: Uuid) -> anyhow::Result<Vec<BleedPost>> {
        let mut liked: Vec<BleedPost> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| !p.hidden && p.hearted_by.contains(&user_id))
            .cloned()
            .collect();
        order(&mut liked, PostSort::Recent);
        Ok(liked)
    }

    async fn add_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if post.hearted_by.contains(&user_id) {
            return Ok(None);
        }
        post.hearted_by.push(user_id);
        post.heart_count += 1;
        Ok(Some(post.clone()))
    }

    async fn remove_heart(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<BleedPost>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let before = post.hearted_by.len();
        post.hearted_by.retain(|u| *u != user_id);
        if post.hearted_by.len() == before {
            return Ok(None);
        }
        post.heart_count = (post.heart_count - 1).max(0);
        Ok(Some(post.clone()))
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> anyhow::Result<Option<BleedPost>> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.hidden = hidden;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryReportRepo {
    reports: Mutex<Vec<Report>>,
}

#[async_trait]
impl ReportRepo for MemoryReportRepo {
    async fn create(&self, report: &Report) -> anyhow::Result<bool> {
        let mut reports = self.reports.lock().unwrap();
        if reports
            .iter()
            .any(|r| r.post_id == report.post_id && r.reporter == report.reporter)
        {
            return Ok(false);
        }
        reports.push(report.clone());
        Ok(true)
    }

    async fn find_by_post_and_reporter(
        &self,
        post_id: Uuid,
        reporter: &ReporterId,
    ) -> anyhow::Result<Option<Report>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.post_id == post_id && r.reporter == *reporter)
            .cloned())
    }

    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.post_id == post_id)
            .count() as i64)
    }

    async fn mark_all_for_post(
        &self,
        post_id: Uuid,
        status: ReportStatus,
    ) -> anyhow::Result<u64> {
        let mut reports = self.reports.lock().unwrap();
        let mut moved = 0;
        for report in reports.iter_mut().filter(|r| r.post_id == post_id) {
            report.status = status;
            moved += 1;
        }
        Ok(moved)
    }

    async fn list(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<Report>> {
        let mut reports = self.reports.lock().unwrap().clone();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_all(&self) -> anyhow::Result<i64> {
        Ok(self.reports.lock().unwrap().len() as i64)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> anyhow::Result<Option<Report>> {
        let mut reports = self.reports.lock().unwrap();
        let Some(report) = reports.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        report.status = status;
        Ok(Some(report.clone()))
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryEntryRepo {
    entries: Mutex<Vec<Entry>>,
}

#[async_trait]
impl EntryRepo for MemoryEntryRepo {
    async fn create(&self, entry: &Entry) -> anyhow::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Entry>> {
        let mut entries: Vec<Entry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Entry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned())
    }

    async fn update_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
        draft: &EntryDraft,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Entry>> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
        else {
            return Ok(None);
        };
        entry.title = draft.title.clone();
        entry.content = draft.content.clone();
        entry.emotion_tags = draft.emotion_tags.clone();
        entry.is_encrypted = draft.is_encrypted;
        entry.encrypted_data = draft.encrypted_data.clone();
        entry.updated_at = updated_at;
        Ok(Some(entry.clone()))
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(entries.len() != before)
    }

    async fn mood_counts(&self, user_id: Uuid) -> anyhow::Result<Vec<MoodCount>> {
        let entries = self.entries.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for entry in entries.iter().filter(|e| e.user_id == user_id) {
            for tag in &entry.emotion_tags {
                *counts.entry(tag.clone()).or_default() += 1;
            }
        }
        let mut moods: Vec<MoodCount> = counts
            .into_iter()
            .map(|(tag, count)| MoodCount { tag, count })
            .collect();
        moods.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
        Ok(moods)
    }
}

/// Verifier that only accepts tokens it issued in-process.
#[derive(Default)]
pub struct MemoryVerifier {
    tokens: Mutex<HashMap<String, Uuid>>,
}

impl CredentialVerifier for MemoryVerifier {
    fn verify(&self, token: &str) -> Result<Uuid> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or_else(|| AppError::Unauthenticated("Invalid or expired token".into()))
    }

    fn issue(&self, user_id: Uuid, _ttl: Duration) -> String {
        let token = format!("mem-{}-{}", user_id.simple(), Uuid::now_v7().simple());
        self.tokens.lock().unwrap().insert(token.clone(), user_id);
        token
    }
}
