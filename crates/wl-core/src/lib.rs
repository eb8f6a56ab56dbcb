//! woundlog/crates/wl-core/src/lib.rs
//!
//! The central domain logic and interface definitions for WoundLog.

pub mod error;
pub mod models;
pub mod traits;
pub mod wall;

#[cfg(any(test, feature = "testing"))]
pub mod testutil;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
pub use wall::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_post_defaults() {
        let post = BleedPost::new(None, "first wound".to_string(), vec![], Category::default());
        assert_eq!(post.category, Category::Other);
        assert_eq!(post.heart_count, 0);
        assert!(post.hearted_by.is_empty());
        assert!(!post.hidden);
        assert!(post.created_by.is_none());
    }

    #[test]
    fn test_post_ref_boundary() {
        let id = Uuid::now_v7();
        assert_eq!(
            PostRef::parse(&id.to_string()),
            Some(PostRef::Real(id))
        );
        assert_eq!(
            PostRef::parse("featured-rainfall"),
            Some(PostRef::Featured("featured-rainfall".to_string()))
        );
        assert_eq!(PostRef::parse("not-a-uuid"), None);
    }

    #[test]
    fn test_reporter_sentinel_round_trip() {
        let anon = ReporterId::Anonymous;
        assert_eq!(anon.storage_key(), "anonymous");
        assert_eq!(
            ReporterId::try_from("anonymous".to_string()).unwrap(),
            ReporterId::Anonymous
        );
        let id = Uuid::now_v7();
        let user = ReporterId::User(id);
        assert_eq!(
            ReporterId::try_from(user.storage_key()).unwrap(),
            ReporterId::User(id)
        );
    }
}
