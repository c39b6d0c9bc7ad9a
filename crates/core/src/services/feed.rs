//! Personalized feed queries over published posts.

use std::collections::HashMap;

use quill_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use quill_db::repositories::{
    CommentRepository, FollowRepository, PostLikeRepository, PostQuery, PostRepository,
    UserRepository,
};

use crate::services::post::{AuthorSummary, tags_from_json};

/// Which set of authors a feed draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedScope {
    /// Every author on the instance.
    #[default]
    All,
    /// Only authors the viewer follows.
    Following,
}

/// Filters for a feed listing. All present filters apply conjunctively.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub scope: FeedScope,
    /// The requesting user, if authenticated. Required for the
    /// `Following` scope and for per-post `is_liked` flags.
    pub viewer_id: Option<String>,
    /// Restrict to a single author's posts.
    pub author_id: Option<String>,
    /// Exact tag match (matched against lower-cased stored tags).
    pub tag: Option<String>,
    /// Case-insensitive substring match on title or excerpt.
    pub search: Option<String>,
}

/// One entry in a feed page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub read_time: u32,
    pub created_at: String,
    pub author: AuthorSummary,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Always false for an anonymous viewer, never null.
    pub is_liked: bool,
}

/// A page of feed results plus the total across all pages of the same
/// filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl PostPage {
    const fn empty(page: u64, limit: u64) -> Self {
        Self {
            posts: Vec::new(),
            total: 0,
            page,
            limit,
        }
    }
}

/// Feed service for listing published posts.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    like_repo: PostLikeRepository,
    comment_repo: CommentRepository,
    follow_repo: FollowRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        like_repo: PostLikeRepository,
        comment_repo: CommentRepository,
        follow_repo: FollowRepository,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            like_repo,
            comment_repo,
            follow_repo,
        }
    }

    /// List a page of published posts matching `criteria`.
    ///
    /// `page` is 1-based. The returned `total` is counted over the same
    /// filter condition as the page itself. A `Following` scope with no
    /// viewer, or a viewer who follows nobody, yields an empty page without
    /// querying the post table.
    pub async fn list_posts(
        &self,
        criteria: &FilterCriteria,
        page: u64,
        limit: u64,
    ) -> AppResult<PostPage> {
        if page < 1 {
            return Err(AppError::Validation("Page must be at least 1".to_string()));
        }
        if limit < 1 {
            return Err(AppError::Validation("Limit must be at least 1".to_string()));
        }

        let author_ids = match criteria.scope {
            FeedScope::All => None,
            FeedScope::Following => {
                let Some(viewer_id) = criteria.viewer_id.as_deref() else {
                    return Ok(PostPage::empty(page, limit));
                };
                let followee_ids = self.follow_repo.find_following_ids(viewer_id).await?;
                if followee_ids.is_empty() {
                    return Ok(PostPage::empty(page, limit));
                }
                Some(followee_ids)
            }
        };

        let query = PostQuery {
            author_id: criteria.author_id.clone(),
            author_ids,
            tag: criteria.tag.clone(),
            search: criteria.search.clone(),
        };

        let total = self.post_repo.count_published(&query).await?;
        let offset = (page - 1).saturating_mul(limit);
        let posts = self.post_repo.find_published(&query, limit, offset).await?;

        let summaries = self
            .assemble(posts, criteria.viewer_id.as_deref())
            .await?;

        Ok(PostPage {
            posts: summaries,
            total,
            page,
            limit,
        })
    }

    /// Attach author identity, counters, and viewer-liked flags to a page
    /// of posts, using batched lookups.
    async fn assemble(
        &self,
        posts: Vec<quill_db::entities::post::Model>,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<PostSummary>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let mut author_ids: Vec<String> = posts.iter().map(|p| p.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, _> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let like_counts = self.like_repo.count_by_posts(&post_ids).await?;
        let comment_counts = self.comment_repo.count_by_posts(&post_ids).await?;
        let liked_ids = self
            .like_repo
            .find_liked_post_ids(viewer_id, &post_ids)
            .await?;

        let mut summaries = Vec::with_capacity(posts.len());
        for post in posts {
            let author = authors.get(&post.user_id).ok_or_else(|| {
                AppError::Internal(format!("Author {} missing for post {}", post.user_id, post.id))
            })?;

            summaries.push(PostSummary {
                is_liked: liked_ids.contains(&post.id),
                likes_count: like_counts.get(&post.id).copied().unwrap_or(0),
                comments_count: comment_counts.get(&post.id).copied().unwrap_or(0),
                author: AuthorSummary::from_model(author),
                tags: tags_from_json(&post.tags),
                read_time: post.read_time.max(1) as u32,
                created_at: post.created_at.to_rfc3339(),
                id: post.id,
                title: post.title,
                slug: post.slug,
                excerpt: post.excerpt,
                cover_image: post.cover_image,
            });
        }

        Ok(summaries)
    }
}
