//! # wl-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! services. Handlers stay thin: parse the request, call the service,
//! serialize the answer. Business rules live in wl-core.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use wl_core::error::AppError;
use wl_core::models::{
    Category, Entry, EntryDraft, PostFilter, PostRef, PostSort, ReportStatus, ReporterId,
};
use wl_core::traits::{CredentialVerifier, EntryRepo};
use wl_core::wall::{BleedWall, FeedPage};

use crate::error::ApiError;
use crate::identity::{Identity, MaybeIdentity};

/// State shared across all workers.
pub struct AppState {
    pub wall: BleedWall,
    pub entries: Arc<dyn EntryRepo>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

type Result<T> = std::result::Result<T, ApiError>;

fn post_ref(raw: &str) -> Result<PostRef> {
    PostRef::parse(raw)
        .ok_or_else(|| ApiError(AppError::NotFound("post".into(), raw.to_string())))
}

// ── Bleed wall ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FeedQuery {
    page: Option<i64>,
    limit: Option<i64>,
    emotion: Option<String>,
    category: Option<String>,
    search: Option<String>,
    sort: Option<String>,
}

pub async fn list_posts(
    data: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(20);

    let category = match query.category.as_deref() {
        Some(raw) => match Category::parse(raw) {
            Some(category) => Some(category),
            // an unknown category can never match anything
            None => {
                return Ok(HttpResponse::Ok().json(FeedPage {
                    posts: vec![],
                    total: 0,
                    page,
                    pages: 0,
                }))
            }
        },
        None => None,
    };
    let filter = PostFilter {
        emotion: query.emotion.clone(),
        category,
        search: query.search.clone(),
    };
    let sort = match query.sort.as_deref() {
        Some("top") => PostSort::Top,
        _ => PostSort::Recent,
    };

    let feed = data.wall.list(&filter, sort, page, limit).await?;
    Ok(HttpResponse::Ok().json(feed))
}

#[derive(Deserialize)]
pub struct TopQuery {
    limit: Option<i64>,
}

pub async fn top_posts(
    data: web::Data<AppState>,
    query: web::Query<TopQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(10);
    let posts = data.wall.top(limit).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn liked_posts(
    data: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse> {
    let posts = data.wall.liked_by(identity.0).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post = data.wall.get_post(&post_ref(&path)?).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostBody {
    content: String,
    #[serde(default)]
    emotion_tags: Vec<String>,
    #[serde(default)]
    category: Category,
}

pub async fn create_post(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    body: web::Json<NewPostBody>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let post = data
        .wall
        .create_post(identity.0, body.content, body.emotion_tags, body.category)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

#[derive(Deserialize)]
pub struct ReportBody {
    reason: Option<String>,
}

pub async fn report_post(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<String>,
    body: Option<web::Json<ReportBody>>,
) -> Result<HttpResponse> {
    let reason = body
        .and_then(|b| b.into_inner().reason)
        .unwrap_or_default();
    let outcome = data
        .wall
        .report(
            &post_ref(&path)?,
            ReporterId::from_identity(identity.0),
            reason,
        )
        .await?;
    let body = if outcome.deleted {
        serde_json::json!({
            "success": true,
            "message": outcome.message,
            "deleted": true,
        })
    } else {
        serde_json::json!({ "success": true, "message": outcome.message })
    };
    Ok(HttpResponse::Ok().json(body))
}

pub async fn heart_post(
    data: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post = data.wall.heart(&post_ref(&path)?, identity.0).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn unheart_post(
    data: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post = data.wall.unheart(&post_ref(&path)?, identity.0).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[derive(Deserialize)]
pub struct HideBody {
    #[serde(default)]
    hidden: bool,
}

pub async fn hide_post(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<String>,
    body: web::Json<HideBody>,
) -> Result<HttpResponse> {
    let post = data
        .wall
        .set_hidden(&post_ref(&path)?, identity.0, body.hidden)
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    data.wall.delete_post(&post_ref(&path)?, identity.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

// ── Report management ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

pub async fn list_reports(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(20);
    let reports = data.wall.list_reports(identity.0, page, limit).await?;
    Ok(HttpResponse::Ok().json(reports))
}

#[derive(Deserialize)]
pub struct ReviewBody {
    status: ReportStatus,
}

pub async fn review_report(
    data: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<String>,
    body: web::Json<ReviewBody>,
) -> Result<HttpResponse> {
    let report_id = Uuid::parse_str(&path)
        .map_err(|_| ApiError(AppError::NotFound("report".into(), path.to_string())))?;
    let report = data
        .wall
        .review_report(identity.0, report_id, body.status)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

// ── Journal ─────────────────────────────────────────────────────────────────

fn entry_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError(AppError::NotFound("entry".into(), raw.to_string())))
}

fn entry_missing(id: Uuid) -> ApiError {
    ApiError(AppError::NotFound("entry".into(), id.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBody {
    title: Option<String>,
    content: String,
    #[serde(default)]
    emotion_tags: Vec<String>,
    #[serde(default)]
    is_encrypted: bool,
    encrypted_data: Option<String>,
}

impl EntryBody {
    fn into_draft(self) -> EntryDraft {
        EntryDraft {
            title: self.title,
            content: self.content,
            emotion_tags: self.emotion_tags,
            is_encrypted: self.is_encrypted,
            encrypted_data: self.encrypted_data,
        }
    }
}

pub async fn list_entries(
    data: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse> {
    let entries = data
        .entries
        .list_for_user(identity.0)
        .await
        .map_err(AppError::from)?;
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn get_entry(
    data: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = entry_id(&path)?;
    let entry = data
        .entries
        .find_for_user(id, identity.0)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| entry_missing(id))?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn create_entry(
    data: web::Data<AppState>,
    identity: Identity,
    body: web::Json<EntryBody>,
) -> Result<HttpResponse> {
    let draft = body.into_inner().into_draft();
    let now = Utc::now();
    let entry = Entry {
        id: Uuid::now_v7(),
        user_id: identity.0,
        title: draft.title,
        content: draft.content,
        emotion_tags: draft.emotion_tags,
        is_encrypted: draft.is_encrypted,
        encrypted_data: draft.encrypted_data,
        created_at: now,
        updated_at: now,
    };
    data.entries.create(&entry).await.map_err(AppError::from)?;
    Ok(HttpResponse::Created().json(entry))
}

pub async fn update_entry(
    data: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<EntryBody>,
) -> Result<HttpResponse> {
    let id = entry_id(&path)?;
    let draft = body.into_inner().into_draft();
    let entry = data
        .entries
        .update_for_user(id, identity.0, &draft, Utc::now())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| entry_missing(id))?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn delete_entry(
    data: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = entry_id(&path)?;
    let removed = data
        .entries
        .delete_for_user(id, identity.0)
        .await
        .map_err(AppError::from)?;
    if !removed {
        return Err(entry_missing(id));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

// ── Analytics ───────────────────────────────────────────────────────────────

pub async fn mood_analytics(
    data: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse> {
    let moods = data
        .entries
        .mood_counts(identity.0)
        .await
        .map_err(AppError::from)?;
    Ok(HttpResponse::Ok().json(moods))
}
