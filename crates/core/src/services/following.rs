//! Follow toggle and social graph listings.

use std::collections::HashMap;

use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::follow;
use quill_db::repositories::{FollowRepository, UserRepository};
use sea_orm::Set;
use serde::Serialize;

/// Outcome of a follow toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowToggle {
    /// Whether the follower follows the target after the toggle.
    pub following: bool,
    /// Total followers of the target after the toggle.
    pub followers_count: u64,
}

/// User identity fields returned by graph listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
}

impl UserSummary {
    fn from_model(model: &quill_db::entities::user::Model) -> Self {
        Self {
            id: model.id.clone(),
            username: model.username.clone(),
            name: model.name.clone(),
            bio: model.bio.clone(),
            avatar_url: model.avatar_url.clone(),
            website: model.website.clone(),
        }
    }
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a follow edge from `follower_id` to `followee_id`.
    ///
    /// Self-follows are rejected. The target must exist. Like the post
    /// like toggle, a racing duplicate insert trips the per-pair unique
    /// index and surfaces as [`AppError::Conflict`].
    pub async fn toggle(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowToggle> {
        if follower_id == followee_id {
            return Err(AppError::Validation(
                "Cannot follow yourself".to_string(),
            ));
        }

        let followee = self.user_repo.get_by_id(followee_id).await?;

        let following = if self
            .follow_repo
            .find_by_pair(follower_id, followee_id)
            .await?
            .is_some()
        {
            self.follow_repo
                .delete_by_pair(follower_id, followee_id)
                .await?;
            false
        } else {
            let model = follow::ActiveModel {
                id: Set(self.id_gen.generate()),
                follower_id: Set(follower_id.to_string()),
                followee_id: Set(followee.id.clone()),
                created_at: Set(Utc::now().into()),
            };
            self.follow_repo.create(model).await?;
            true
        };

        let followers_count = self.follow_repo.count_followers(followee_id).await?;
        tracing::debug!(
            follower_id = %follower_id,
            followee_id = %followee_id,
            following,
            "Toggled follow"
        );

        Ok(FollowToggle {
            following,
            followers_count,
        })
    }

    /// Whether `follower_id` currently follows `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(follower_id, followee_id).await
    }

    /// List the followers of a user, most recent follow first.
    pub async fn list_followers(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        let edges = self.follow_repo.find_followers(user_id).await?;
        let ids: Vec<String> = edges.into_iter().map(|f| f.follower_id).collect();
        self.summaries_in_order(&ids).await
    }

    /// List the users a user follows, most recent follow first.
    pub async fn list_following(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        let edges = self.follow_repo.find_following(user_id).await?;
        let ids: Vec<String> = edges.into_iter().map(|f| f.followee_id).collect();
        self.summaries_in_order(&ids).await
    }

    /// Search user profiles by username or display name.
    ///
    /// Case-insensitive substring match; most-followed accounts first.
    /// An empty term is valid and lists the most-followed accounts.
    pub async fn search_users(&self, term: &str) -> AppResult<Vec<UserSummary>> {
        let users = self.user_repo.search(term).await?;
        Ok(users.iter().map(UserSummary::from_model).collect())
    }

    /// Batch-load users and emit summaries in the order `ids` dictates.
    async fn summaries_in_order(&self, ids: &[String]) -> AppResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users: HashMap<String, _> = self
            .user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(UserSummary::from_model))
            .collect())
    }
}
