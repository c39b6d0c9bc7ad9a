//! Post like toggle service.

use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::post_like;
use quill_db::repositories::{PostLikeRepository, PostRepository};
use sea_orm::Set;
use serde::Serialize;

/// Outcome of a like toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    /// Whether the viewer likes the post after the toggle.
    pub liked: bool,
    /// Total likes on the post after the toggle.
    pub likes_count: u64,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: PostLikeRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(like_repo: PostLikeRepository, post_repo: PostRepository) -> Self {
        Self {
            like_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a like on a post.
    ///
    /// Removes the like if the pair already exists, creates it otherwise,
    /// then recounts. A concurrent duplicate insert trips the per-pair
    /// unique index and surfaces as [`AppError::Conflict`]; the caller can
    /// simply retry.
    pub async fn toggle(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let liked = if self
            .like_repo
            .find_by_pair(user_id, post_id)
            .await?
            .is_some()
        {
            self.like_repo.delete_by_pair(user_id, post_id).await?;
            false
        } else {
            let model = post_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                post_id: Set(post.id.clone()),
                created_at: Set(Utc::now().into()),
            };
            self.like_repo.create(model).await?;
            true
        };

        let likes_count = self.like_repo.count_by_post(post_id).await?;
        tracing::debug!(user_id = %user_id, post_id = %post_id, liked, "Toggled like");

        Ok(LikeToggle { liked, likes_count })
    }

    /// Whether `user_id` currently likes `post_id`.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.has_liked(user_id, post_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quill_db::entities::post;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn mock_post(id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: "author1".to_string(),
            title: "Title".to_string(),
            slug: "title".to_string(),
            content: "<p>content</p>".to_string(),
            excerpt: "content...".to_string(),
            cover_image: None,
            tags: serde_json::json!([]),
            is_published: true,
            read_time: 1,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn mock_like(id: &str, user_id: &str, post_id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    #[tokio::test]
    async fn test_toggle_on_creates_like_and_counts() {
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_post("post1")]])
            .into_connection();
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            // pair lookup: no existing like
            .append_query_results([Vec::<post_like::Model>::new()])
            // INSERT .. RETURNING
            .append_query_results([vec![mock_like("like1", "user1", "post1")]])
            // recount
            .append_query_results([vec![count_row(1)]])
            .into_connection();

        let service = LikeService::new(
            PostLikeRepository::new(Arc::new(like_db)),
            PostRepository::new(Arc::new(post_db)),
        );

        let result = service.toggle("user1", "post1").await.unwrap();

        assert!(result.liked);
        assert_eq!(result.likes_count, 1);
    }

    #[tokio::test]
    async fn test_toggle_off_removes_like_and_counts() {
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_post("post1")]])
            .into_connection();
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            // pair lookup in the toggle, then again inside the delete
            .append_query_results([vec![mock_like("like1", "user1", "post1")]])
            .append_query_results([vec![mock_like("like1", "user1", "post1")]])
            .append_query_results([vec![count_row(0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = LikeService::new(
            PostLikeRepository::new(Arc::new(like_db)),
            PostRepository::new(Arc::new(post_db)),
        );

        let result = service.toggle("user1", "post1").await.unwrap();

        assert!(!result.liked);
        assert_eq!(result.likes_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_missing_post_returns_not_found() {
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let like_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let service = LikeService::new(
            PostLikeRepository::new(Arc::new(like_db)),
            PostRepository::new(Arc::new(post_db)),
        );

        let result = service.toggle("user1", "missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }
}
