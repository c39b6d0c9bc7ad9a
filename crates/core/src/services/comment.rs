//! Comment lifecycle service.

use std::collections::HashMap;

use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::comment;
use quill_db::repositories::{CommentRepository, PostRepository, UserRepository};
use sea_orm::Set;
use serde::Serialize;

use crate::services::post::AuthorSummary;

/// A comment with its author's identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: String,
    pub author: AuthorSummary,
}

impl CommentResponse {
    fn from_parts(model: comment::Model, author: &quill_db::entities::user::Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            content: model.content,
            created_at: model.created_at.to_rfc3339(),
            author: AuthorSummary::from_model(author),
        }
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    pub async fn create(
        &self,
        user_id: &str,
        post_id: &str,
        content: &str,
    ) -> AppResult<CommentResponse> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment must not be empty".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        let author = self.user_repo.get_by_id(user_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author.id.clone()),
            post_id: Set(post.id.clone()),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.comment_repo.create(model).await?;
        tracing::debug!(comment_id = %created.id, post_id = %post_id, "Created comment");

        Ok(CommentResponse::from_parts(created, &author))
    }

    /// List the comments on a post, oldest first, with author identity.
    pub async fn list_by_post(&self, post_id: &str) -> AppResult<Vec<CommentResponse>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;
        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, _> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut responses = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = authors.get(&comment.user_id).ok_or_else(|| {
                AppError::Internal(format!(
                    "Author {} missing for comment {}",
                    comment.user_id, comment.id
                ))
            })?;
            responses.push(CommentResponse::from_parts(comment, author));
        }

        Ok(responses)
    }

    /// Delete a comment.
    pub async fn delete(&self, comment_id: &str) -> AppResult<()> {
        if !self.comment_repo.delete(comment_id).await? {
            return Err(AppError::NotFound(format!("Comment {comment_id}")));
        }
        Ok(())
    }

    /// Get the author ID of a comment, for ownership checks at the call
    /// site.
    pub async fn get_owner(&self, comment_id: &str) -> AppResult<String> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        Ok(comment.user_id)
    }
}
