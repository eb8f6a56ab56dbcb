//! # Bleed Wall
//!
//! The service owning the lifecycle of public posts: heart toggling,
//! crowd-report auto-takedown, moderator hide/unhide, and deletion.
//!
//! Every business rule is checked before any mutation; a rejected request
//! leaves no partial state behind. The compound heart mutations themselves
//! are delegated to [`PostRepo`] as single atomic operations so membership
//! and counter can never disagree.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    BleedPost, Category, PostFilter, PostRef, PostSort, Report, ReportStatus, ReporterId, Role,
};
use crate::traits::{PostRepo, ReportRepo, UserRepo};

/// A post is taken down automatically once this many reports exist for it.
pub const REPORT_TAKEDOWN_THRESHOLD: i64 = 5;

/// One page of the public feed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedPage {
    pub posts: Vec<BleedPost>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// One page of the moderation queue.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

/// What became of a report submission.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub deleted: bool,
    pub message: &'static str,
}

pub struct BleedWall {
    posts: Arc<dyn PostRepo>,
    reports: Arc<dyn ReportRepo>,
    users: Arc<dyn UserRepo>,
}

impl BleedWall {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        reports: Arc<dyn ReportRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            posts,
            reports,
            users,
        }
    }

    /// Submits a new post, anonymous or owned.
    pub async fn create_post(
        &self,
        author: Option<Uuid>,
        content: String,
        emotion_tags: Vec<String>,
        category: Category,
    ) -> Result<BleedPost> {
        if let Some(user_id) = author {
            let banned = self
                .users
                .find_by_id(user_id)
                .await?
                .map(|u| u.banned)
                .unwrap_or(false);
            if banned {
                return Err(AppError::Forbidden("Banned".into()));
            }
        }
        if content.trim().is_empty() {
            return Err(AppError::Validation("content must not be empty".into()));
        }
        let post = BleedPost::new(author, content, emotion_tags, category);
        self.posts.create(&post).await?;
        Ok(post)
    }

    /// Fetches a single post by id. Hidden posts stay individually
    /// fetchable; featured ids resolve to nothing, they have no storage.
    pub async fn get_post(&self, post: &PostRef) -> Result<BleedPost> {
        let id = match post {
            PostRef::Real(id) => *id,
            PostRef::Featured(raw) => return Err(not_found(raw)),
        };
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))
    }

    /// One page of the public feed. `page` is 1-indexed.
    pub async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: i64,
        limit: i64,
    ) -> Result<FeedPage> {
        let page = page.max(1);
        let limit = limit.max(1);
        let posts = self
            .posts
            .list(filter, sort, (page - 1) * limit, limit)
            .await?;
        let total = self.posts.count(filter).await?;
        Ok(FeedPage {
            posts,
            total,
            page,
            pages: page_count(total, limit),
        })
    }

    /// The most-hearted posts, without pagination bookkeeping.
    pub async fn top(&self, limit: i64) -> Result<Vec<BleedPost>> {
        let posts = self
            .posts
            .list(&PostFilter::default(), PostSort::Top, 0, limit.max(1))
            .await?;
        Ok(posts)
    }

    /// Everything the user currently has a heart on.
    pub async fn liked_by(&self, user_id: Uuid) -> Result<Vec<BleedPost>> {
        Ok(self.posts.list_hearted_by(user_id).await?)
    }

    /// Puts the caller's heart on a post. No self-hearts, no double
    /// hearts; membership and counter move together atomically.
    pub async fn heart(&self, post: &PostRef, user_id: Uuid) -> Result<BleedPost> {
        let id = real_id(post, "Featured posts cannot be hearted through the API")?;
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))?;
        if post.created_by == Some(user_id) {
            return Err(AppError::InvalidOperation(
                "You can't heart your own post.".into(),
            ));
        }
        if post.hearted_by.contains(&user_id) {
            return Err(AppError::InvalidOperation(
                "Already hearted this post".into(),
            ));
        }
        // The compound update re-checks membership; a concurrent duplicate
        // that slipped past the read above loses here, not at the counter.
        self.posts.add_heart(id, user_id).await?.ok_or_else(|| {
            AppError::InvalidOperation("Already hearted this post".into())
        })
    }

    /// Takes the caller's heart back off a post.
    pub async fn unheart(&self, post: &PostRef, user_id: Uuid) -> Result<BleedPost> {
        let id = real_id(post, "Featured posts cannot be unhearted through the API")?;
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))?;
        if !post.hearted_by.contains(&user_id) {
            return Err(AppError::InvalidOperation(
                "You have not hearted this post".into(),
            ));
        }
        self.posts.remove_heart(id, user_id).await?.ok_or_else(|| {
            AppError::InvalidOperation("You have not hearted this post".into())
        })
    }

    /// Files a report. Identity is best-effort: callers without a valid
    /// credential all count as the shared anonymous reporter. At
    /// [`REPORT_TAKEDOWN_THRESHOLD`] reports the post is deleted and every
    /// report against it is marked actioned.
    pub async fn report(
        &self,
        post: &PostRef,
        reporter: ReporterId,
        reason: String,
    ) -> Result<ReportOutcome> {
        let id = real_id(post, "Featured posts cannot be reported")?;
        if self
            .reports
            .find_by_post_and_reporter(id, &reporter)
            .await?
            .is_some()
        {
            return Err(AppError::InvalidOperation(
                "You have already reported this post".into(),
            ));
        }
        let report = Report::new(id, reporter, reason);
        if !self.reports.create(&report).await? {
            // Lost a race against our own duplicate; same answer as above.
            return Err(AppError::InvalidOperation(
                "You have already reported this post".into(),
            ));
        }

        let count = self.reports.count_for_post(id).await?;
        if count >= REPORT_TAKEDOWN_THRESHOLD {
            self.posts.delete(id).await?;
            self.reports
                .mark_all_for_post(id, ReportStatus::Actioned)
                .await?;
            log::info!("post {id} automatically deleted after {count} reports");
            return Ok(ReportOutcome {
                deleted: true,
                message: "Post reported and automatically deleted due to multiple reports",
            });
        }
        Ok(ReportOutcome {
            deleted: false,
            message: "Reported for moderation",
        })
    }

    /// Sets the moderation flag on a post. Admin/moderator only.
    pub async fn set_hidden(
        &self,
        post: &PostRef,
        actor: Option<Uuid>,
        hidden: bool,
    ) -> Result<BleedPost> {
        self.require_moderator(actor).await?;
        let id = match post {
            PostRef::Real(id) => *id,
            PostRef::Featured(raw) => return Err(not_found(raw)),
        };
        self.posts
            .set_hidden(id, hidden)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))
    }

    /// Removes a post. Allowed for its owner and for admin/moderator.
    /// Reports against it are left in place as an audit trail.
    pub async fn delete_post(&self, post: &PostRef, actor: Option<Uuid>) -> Result<()> {
        let id = match post {
            PostRef::Real(id) => *id,
            PostRef::Featured(raw) => return Err(not_found(raw)),
        };
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))?;
        let owns = actor.is_some() && post.created_by == actor;
        if !owns && !self.role_of(actor).await?.is_moderator() {
            return Err(AppError::Forbidden("Not allowed".into()));
        }
        self.posts.delete(id).await?;
        Ok(())
    }

    /// The moderation queue, newest first. Admin/moderator only.
    pub async fn list_reports(
        &self,
        actor: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ReportPage> {
        self.require_moderator(actor).await?;
        let page = page.max(1);
        let limit = limit.max(1);
        let reports = self.reports.list((page - 1) * limit, limit).await?;
        let total = self.reports.count_all().await?;
        Ok(ReportPage {
            reports,
            total,
            page,
            pages: page_count(total, limit),
        })
    }

    /// Moves one report through its review workflow. Admin/moderator only.
    pub async fn review_report(
        &self,
        actor: Option<Uuid>,
        report_id: Uuid,
        status: ReportStatus,
    ) -> Result<Report> {
        self.require_moderator(actor).await?;
        self.reports
            .set_status(report_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("report".into(), report_id.to_string()))
    }

    async fn role_of(&self, actor: Option<Uuid>) -> Result<Role> {
        let Some(user_id) = actor else {
            return Ok(Role::User);
        };
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .map(|u| u.role)
            .unwrap_or_default())
    }

    async fn require_moderator(&self, actor: Option<Uuid>) -> Result<()> {
        if self.role_of(actor).await?.is_moderator() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not allowed".into()))
        }
    }
}

fn real_id(post: &PostRef, featured_msg: &str) -> Result<Uuid> {
    match post {
        PostRef::Real(id) => Ok(*id),
        PostRef::Featured(_) => Err(AppError::Unsupported(featured_msg.into())),
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound("post".into(), id.to_string())
}

fn page_count(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, User};
    use crate::testutil::{MemoryPostRepo, MemoryReportRepo, MemoryUserRepo};
    use chrono::Utc;

    fn wall() -> (BleedWall, Arc<MemoryPostRepo>, Arc<MemoryUserRepo>) {
        let posts = Arc::new(MemoryPostRepo::default());
        let reports = Arc::new(MemoryReportRepo::default());
        let users = Arc::new(MemoryUserRepo::default());
        let wall = BleedWall::new(posts.clone(), reports, users.clone());
        (wall, posts, users)
    }

    fn add_user(users: &MemoryUserRepo, role: Role, banned: bool) -> Uuid {
        let user = User {
            id: Uuid::now_v7(),
            role,
            banned,
            created_at: Utc::now(),
        };
        let id = user.id;
        users.insert(user);
        id
    }

    async fn seed_post(wall: &BleedWall, author: Option<Uuid>) -> BleedPost {
        wall.create_post(author, "it still hurts".into(), vec!["grief".into()], Category::Other)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn heart_toggle_round_trip() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let reader = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        let hearted = wall.heart(&post_ref, reader).await.unwrap();
        assert_eq!(hearted.heart_count, 1);
        assert_eq!(hearted.hearted_by, vec![reader]);

        // second heart from the same user is a state conflict
        let err = wall.heart(&post_ref, reader).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
        let unchanged = wall.get_post(&post_ref).await.unwrap();
        assert_eq!(unchanged.heart_count, 1);

        let unhearted = wall.unheart(&post_ref, reader).await.unwrap();
        assert_eq!(unhearted.heart_count, 0);
        assert!(unhearted.hearted_by.is_empty());
    }

    #[tokio::test]
    async fn heart_count_tracks_membership() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        let readers: Vec<Uuid> = (0..4).map(|_| add_user(&users, Role::User, false)).collect();
        for reader in &readers {
            wall.heart(&post_ref, *reader).await.unwrap();
        }
        wall.unheart(&post_ref, readers[0]).await.unwrap();

        let post = wall.get_post(&post_ref).await.unwrap();
        assert_eq!(post.heart_count as usize, post.hearted_by.len());
        assert_eq!(post.heart_count, 3);
    }

    #[tokio::test]
    async fn own_post_cannot_be_hearted() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;

        let err = wall.heart(&PostRef::Real(post.id), author).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn unheart_requires_existing_heart() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let reader = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;

        let err = wall
            .unheart(&PostRef::Real(post.id), reader)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn featured_ids_are_unsupported() {
        let (wall, _, users) = wall();
        let reader = add_user(&users, Role::User, false);
        let featured = PostRef::parse("featured-midnight").unwrap();

        assert!(matches!(
            wall.heart(&featured, reader).await.unwrap_err(),
            AppError::Unsupported(_)
        ));
        assert!(matches!(
            wall.unheart(&featured, reader).await.unwrap_err(),
            AppError::Unsupported(_)
        ));
        assert!(matches!(
            wall.report(&featured, ReporterId::Anonymous, String::new())
                .await
                .unwrap_err(),
            AppError::Unsupported(_)
        ));
        // elsewhere a featured id simply does not exist
        assert!(matches!(
            wall.get_post(&featured).await.unwrap_err(),
            AppError::NotFound(..)
        ));
    }

    #[tokio::test]
    async fn hearting_missing_post_is_not_found() {
        let (wall, _, users) = wall();
        let reader = add_user(&users, Role::User, false);
        let err = wall
            .heart(&PostRef::Real(Uuid::now_v7()), reader)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn duplicate_reports_are_rejected_per_identity() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let reporter = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        let first = wall
            .report(&post_ref, ReporterId::User(reporter), "spam".into())
            .await
            .unwrap();
        assert!(!first.deleted);

        let err = wall
            .report(&post_ref, ReporterId::User(reporter), "spam again".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn anonymous_reporters_share_one_identity() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        wall.report(&post_ref, ReporterId::Anonymous, String::new())
            .await
            .unwrap();
        // every further anonymous report collapses onto the sentinel, so
        // anonymous spam alone can never reach the takedown threshold
        for _ in 0..5 {
            let err = wall
                .report(&post_ref, ReporterId::Anonymous, String::new())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidOperation(_)));
        }
        assert!(wall.get_post(&post_ref).await.is_ok());
    }

    #[tokio::test]
    async fn fifth_report_takes_the_post_down() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        for n in 0..4 {
            let outcome = wall
                .report(
                    &post_ref,
                    ReporterId::User(add_user(&users, Role::User, false)),
                    format!("report {n}"),
                )
                .await
                .unwrap();
            assert!(!outcome.deleted);
        }
        // four reports leave the post standing
        assert!(wall.get_post(&post_ref).await.is_ok());

        let fifth = wall
            .report(
                &post_ref,
                ReporterId::User(add_user(&users, Role::User, false)),
                "the last straw".into(),
            )
            .await
            .unwrap();
        assert!(fifth.deleted);
        assert!(matches!(
            wall.get_post(&post_ref).await.unwrap_err(),
            AppError::NotFound(..)
        ));

        // the audit trail survives the post, fully actioned
        let moderator = add_user(&users, Role::Moderator, false);
        let queue = wall.list_reports(Some(moderator), 1, 20).await.unwrap();
        assert_eq!(queue.total, 5);
        assert!(queue
            .reports
            .iter()
            .all(|r| r.status == ReportStatus::Actioned));
    }

    #[tokio::test]
    async fn hidden_posts_leave_the_feed_but_stay_fetchable() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let moderator = add_user(&users, Role::Moderator, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        wall.set_hidden(&post_ref, Some(moderator), true)
            .await
            .unwrap();

        let page = wall
            .list(&PostFilter::default(), PostSort::Recent, 1, 20)
            .await
            .unwrap();
        assert!(page.posts.iter().all(|p| p.id != post.id));
        assert_eq!(page.total, 0);
        assert!(wall.get_post(&post_ref).await.unwrap().hidden);

        // reversible
        wall.set_hidden(&post_ref, Some(moderator), false)
            .await
            .unwrap();
        let page = wall
            .list(&PostFilter::default(), PostSort::Recent, 1, 20)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn hide_requires_a_moderator_role() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        let err = wall
            .set_hidden(&post_ref, Some(author), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = wall.set_hidden(&post_ref, None, true).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn top_sort_breaks_ties_by_recency() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let older = seed_post(&wall, Some(author)).await;
        let newer = seed_post(&wall, Some(author)).await;
        let crowd: Vec<Uuid> = (0..2).map(|_| add_user(&users, Role::User, false)).collect();

        // `older` gets two hearts, the tied pair orders newest-first
        for reader in &crowd {
            wall.heart(&PostRef::Real(older.id), *reader).await.unwrap();
        }
        let third = seed_post(&wall, Some(author)).await;

        let top = wall.top(10).await.unwrap();
        let ids: Vec<Uuid> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![older.id, third.id, newer.id]);
    }

    #[tokio::test]
    async fn banned_users_cannot_post() {
        let (wall, _, users) = wall();
        let banned = add_user(&users, Role::User, true);
        let err = wall
            .create_post(Some(banned), "anything".into(), vec![], Category::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let (wall, _, _) = wall();
        let err = wall
            .create_post(None, "   ".into(), vec![], Category::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_is_owner_or_moderator_only() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let stranger = add_user(&users, Role::User, false);
        let moderator = add_user(&users, Role::Moderator, false);

        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);
        assert!(matches!(
            wall.delete_post(&post_ref, Some(stranger)).await.unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            wall.delete_post(&post_ref, None).await.unwrap_err(),
            AppError::Forbidden(_)
        ));
        wall.delete_post(&post_ref, Some(author)).await.unwrap();

        let anon = seed_post(&wall, None).await;
        wall.delete_post(&PostRef::Real(anon.id), Some(moderator))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn liked_listing_follows_the_heart() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let reader = add_user(&users, Role::User, false);
        let post = seed_post(&wall, Some(author)).await;
        let post_ref = PostRef::Real(post.id);

        assert!(wall.liked_by(reader).await.unwrap().is_empty());
        wall.heart(&post_ref, reader).await.unwrap();
        let liked = wall.liked_by(reader).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, post.id);
        wall.unheart(&post_ref, reader).await.unwrap();
        assert!(wall.liked_by(reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_pagination_reports_totals() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        for _ in 0..5 {
            seed_post(&wall, Some(author)).await;
        }

        let page = wall
            .list(&PostFilter::default(), PostSort::Recent, 2, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.posts.len(), 2);
    }

    #[tokio::test]
    async fn review_updates_a_single_report() {
        let (wall, _, users) = wall();
        let author = add_user(&users, Role::User, false);
        let reporter = add_user(&users, Role::User, false);
        let moderator = add_user(&users, Role::Moderator, false);
        let post = seed_post(&wall, Some(author)).await;

        wall.report(&PostRef::Real(post.id), ReporterId::User(reporter), "".into())
            .await
            .unwrap();
        let queue = wall.list_reports(Some(moderator), 1, 20).await.unwrap();
        let report_id = queue.reports[0].id;

        let updated = wall
            .review_report(Some(moderator), report_id, ReportStatus::Dismissed)
            .await
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Dismissed);

        assert!(matches!(
            wall.review_report(Some(author), report_id, ReportStatus::Reviewed)
                .await
                .unwrap_err(),
            AppError::Forbidden(_)
        ));
    }
}
