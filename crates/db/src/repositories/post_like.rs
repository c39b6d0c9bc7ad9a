//! Post like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QuerySelect, SqlErr,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and post.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, post_id).await?.is_some())
    }

    /// Create a new like.
    ///
    /// The unique (`user_id`, `post_id`) index rejects a racing duplicate
    /// insert; that surfaces as a retryable conflict, never a corrupted
    /// count.
    pub async fn create(&self, model: post_like::ActiveModel) -> AppResult<post_like::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Already liked this post".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a like by user and post.
    pub async fn delete_by_pair(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let like = self.find_by_pair(user_id, post_id).await?;
        if let Some(l) = like {
            l.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes for a batch of posts in one grouped query.
    ///
    /// Posts with no likes are simply absent from the map.
    pub async fn count_by_posts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .column_as(post_like::Column::Id.count(), "count")
            .filter(post_like::Column::PostId.is_in(post_ids.iter().cloned()))
            .group_by(post_like::Column::PostId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(post_id, count)| (post_id, count as u64))
            .collect())
    }

    /// Get the subset of `post_ids` that `user_id` has liked.
    ///
    /// A null viewer can never match a like edge, so this returns an empty
    /// set without touching the store. Keeping that here gives the feed a
    /// single code path regardless of viewer presence.
    pub async fn find_liked_post_ids(
        &self,
        user_id: Option<&str>,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        let Some(user_id) = user_id else {
            return Ok(HashSet::new());
        };
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let likes = PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(likes.into_iter().map(|l| l.post_id).collect())
    }
}
