//! Report persistence. The `UNIQUE (post_id, reporter)` key backs the
//! one-report-per-identity rule even under concurrent duplicates; inserts
//! go through `INSERT OR IGNORE` and surface as a boolean.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use wl_core::models::{Report, ReportStatus, ReporterId};
use wl_core::traits::ReportRepo;

use crate::{blob_to_uuid, uuid_to_blob};

pub struct SqliteReportRepo {
    pool: SqlitePool,
}

impl SqliteReportRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_report(row: &SqliteRow) -> Report {
    Report {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
        reporter: ReporterId::try_from(row.get::<String, _>("reporter"))
            .unwrap_or(ReporterId::Anonymous),
        reason: row.get("reason"),
        status: ReportStatus::parse(&row.get::<String, _>("status")).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ReportRepo for SqliteReportRepo {
    async fn create(&self, report: &Report) -> anyhow::Result<bool> {
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO reports (id, post_id, reporter, reason, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(report.id))
        .bind(uuid_to_blob(report.post_id))
        .bind(report.reporter.storage_key())
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(inserted == 1)
    }

    async fn find_by_post_and_reporter(
        &self,
        post_id: Uuid,
        reporter: &ReporterId,
    ) -> anyhow::Result<Option<Report>> {
        let row = sqlx::query("SELECT * FROM reports WHERE post_id = ? AND reporter = ?")
            .bind(uuid_to_blob(post_id))
            .bind(reporter.storage_key())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row_to_report(&row)))
    }

    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM reports WHERE post_id = ?")
            .bind(uuid_to_blob(post_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    async fn mark_all_for_post(
        &self,
        post_id: Uuid,
        status: ReportStatus,
    ) -> anyhow::Result<u64> {
        let moved = sqlx::query("UPDATE reports SET status = ? WHERE post_id = ?")
            .bind(status.as_str())
            .bind(uuid_to_blob(post_id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(moved)
    }

    async fn list(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<Report>> {
        let rows = sqlx::query(
            "SELECT * FROM reports ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_report).collect())
    }

    async fn count_all(&self) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM reports")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> anyhow::Result<Option<Report>> {
        let applied = sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        if applied == 0 {
            return Ok(None);
        }
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row_to_report(&row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store;

    #[tokio::test]
    async fn duplicate_reports_bounce_off_the_unique_key() {
        let store = memory_store().await;
        let repo = store.reports();
        let post_id = Uuid::now_v7();
        let reporter = ReporterId::User(Uuid::now_v7());

        assert!(repo
            .create(&Report::new(post_id, reporter.clone(), "spam".into()))
            .await
            .unwrap());
        // a second row for the same (post, reporter) never lands
        assert!(!repo
            .create(&Report::new(post_id, reporter.clone(), "again".into()))
            .await
            .unwrap());
        assert_eq!(repo.count_for_post(post_id).await.unwrap(), 1);

        let found = repo
            .find_by_post_and_reporter(post_id, &reporter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.reason, "spam");
        assert_eq!(found.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn anonymous_reports_collapse_onto_the_sentinel() {
        let store = memory_store().await;
        let repo = store.reports();
        let post_id = Uuid::now_v7();

        assert!(repo
            .create(&Report::new(post_id, ReporterId::Anonymous, String::new()))
            .await
            .unwrap());
        assert!(!repo
            .create(&Report::new(post_id, ReporterId::Anonymous, String::new()))
            .await
            .unwrap());

        let stored = repo
            .find_by_post_and_reporter(post_id, &ReporterId::Anonymous)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reporter, ReporterId::Anonymous);
    }

    #[tokio::test]
    async fn mark_all_moves_every_report_for_a_post() {
        let store = memory_store().await;
        let repo = store.reports();
        let post_id = Uuid::now_v7();
        for _ in 0..3 {
            repo.create(&Report::new(
                post_id,
                ReporterId::User(Uuid::now_v7()),
                String::new(),
            ))
            .await
            .unwrap();
        }
        let unrelated = Report::new(Uuid::now_v7(), ReporterId::Anonymous, String::new());
        repo.create(&unrelated).await.unwrap();

        assert_eq!(
            repo.mark_all_for_post(post_id, ReportStatus::Actioned)
                .await
                .unwrap(),
            3
        );
        let all = repo.list(0, 10).await.unwrap();
        for report in &all {
            if report.post_id == post_id {
                assert_eq!(report.status, ReportStatus::Actioned);
            } else {
                assert_eq!(report.status, ReportStatus::Pending);
            }
        }
    }

    #[tokio::test]
    async fn single_report_review_round_trip() {
        let store = memory_store().await;
        let repo = store.reports();
        let report = Report::new(Uuid::now_v7(), ReporterId::Anonymous, "reason".into());
        repo.create(&report).await.unwrap();

        let updated = repo
            .set_status(report.id, ReportStatus::Dismissed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Dismissed);
        assert!(repo
            .set_status(Uuid::now_v7(), ReportStatus::Reviewed)
            .await
            .unwrap()
            .is_none());
    }
}
