//! Post lifecycle service.

use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::post;
use quill_db::repositories::{
    CommentRepository, PostLikeRepository, PostRepository, UserRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::content::{derive_excerpt, estimate_read_time};
use crate::slug::slugify;

/// Maximum post title length in characters.
const MAX_TITLE_LEN: usize = 256;

/// Input for creating a post.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

const fn default_published() -> bool {
    true
}

/// Input for updating a post. Omitted fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Response for a post, as seen by its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub read_time: u32,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl PostResponse {
    pub(crate) fn from_model(model: post::Model) -> Self {
        Self {
            id: model.id,
            author_id: model.user_id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            cover_image: model.cover_image,
            tags: tags_from_json(&model.tags),
            is_published: model.is_published,
            read_time: model.read_time.max(1) as u32,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Author identity fields embedded in post responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthorSummary {
    pub(crate) fn from_model(model: &quill_db::entities::user::Model) -> Self {
        Self {
            id: model.id.clone(),
            username: model.username.clone(),
            name: model.name.clone(),
            avatar_url: model.avatar_url.clone(),
        }
    }
}

/// A single published post with its author and engagement counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub read_time: u32,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub author: AuthorSummary,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Always false for an anonymous viewer, never null.
    pub is_liked: bool,
}

pub(crate) fn tags_from_json(tags: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(tags.clone()).unwrap_or_default()
}

/// Lower-case, trim, drop empties, de-duplicate preserving first occurrence.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    like_repo: PostLikeRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        like_repo: PostLikeRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            like_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a unique slug for `title`.
    ///
    /// Starts from the normalized form of the title and appends a monotonic
    /// counter (`base-1`, `base-2`, ...) until no other post claims the
    /// candidate. `exclude_id` lets a post keep its own slug across updates.
    pub async fn unique_slug(&self, title: &str, exclude_id: Option<&str>) -> AppResult<String> {
        let base = slugify(title);
        let mut candidate = base.clone();
        let mut counter = 1u32;

        while self.post_repo.slug_exists(&candidate, exclude_id).await? {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }

        Ok(candidate)
    }

    /// Create a post.
    ///
    /// The excerpt is derived from the content when not provided, the read
    /// time is always estimated from the content, and the slug is generated
    /// from the title.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<PostResponse> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if input.content.trim().is_empty() {
            return Err(AppError::Validation(
                "Content must not be empty".to_string(),
            ));
        }

        let slug = self.unique_slug(title, None).await?;
        let read_time = estimate_read_time(&input.content);
        let excerpt = match input.excerpt.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => derive_excerpt(&input.content),
        };
        let tags = normalize_tags(&input.tags);

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author_id.to_string()),
            title: Set(title.to_string()),
            slug: Set(slug),
            content: Set(input.content),
            excerpt: Set(excerpt),
            cover_image: Set(input.cover_image),
            tags: Set(serde_json::json!(tags)),
            is_published: Set(input.is_published),
            read_time: Set(read_time as i32),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.post_repo.create(model).await?;
        tracing::debug!(post_id = %created.id, slug = %created.slug, "Created post");

        Ok(PostResponse::from_model(created))
    }

    /// Apply a partial update to a post.
    ///
    /// A new title regenerates the slug (excluding the post itself, so an
    /// unchanged title keeps the existing slug). New content recomputes the
    /// read time but leaves the stored excerpt alone.
    pub async fn update(&self, post_id: &str, input: UpdatePostInput) -> AppResult<PostResponse> {
        let existing = self.post_repo.get_by_id(post_id).await?;

        let mut model = post::ActiveModel {
            id: Set(existing.id.clone()),
            ..Default::default()
        };

        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("Title must not be empty".to_string()));
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(AppError::Validation(format!(
                    "Title must be at most {MAX_TITLE_LEN} characters"
                )));
            }
            let slug = self.unique_slug(&title, Some(post_id)).await?;
            model.title = Set(title);
            model.slug = Set(slug);
        }

        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(AppError::Validation(
                    "Content must not be empty".to_string(),
                ));
            }
            model.read_time = Set(estimate_read_time(&content) as i32);
            model.content = Set(content);
        }

        if let Some(excerpt) = input.excerpt {
            let excerpt = excerpt.trim().to_string();
            if excerpt.is_empty() {
                return Err(AppError::Validation(
                    "Excerpt must not be empty".to_string(),
                ));
            }
            model.excerpt = Set(excerpt);
        }

        if let Some(cover_image) = input.cover_image {
            model.cover_image = Set(Some(cover_image));
        }

        if let Some(tags) = input.tags {
            model.tags = Set(serde_json::json!(normalize_tags(&tags)));
        }

        if let Some(is_published) = input.is_published {
            model.is_published = Set(is_published);
        }

        model.updated_at = Set(Some(Utc::now().into()));

        let updated = self.post_repo.update(model).await?;
        Ok(PostResponse::from_model(updated))
    }

    /// Delete a post. Comments and likes are removed by cascade.
    pub async fn delete(&self, post_id: &str) -> AppResult<()> {
        if !self.post_repo.delete(post_id).await? {
            return Err(AppError::PostNotFound(post_id.to_string()));
        }
        tracing::debug!(post_id = %post_id, "Deleted post");
        Ok(())
    }

    /// Get the author ID of a post, for ownership checks at the call site.
    pub async fn get_owner(&self, post_id: &str) -> AppResult<String> {
        let post = self.post_repo.get_by_id(post_id).await?;
        Ok(post.user_id)
    }

    /// Look up a published post by slug, with counters scoped to `viewer_id`.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<PostDetail> {
        let post = self
            .post_repo
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;

        let author = self.user_repo.get_by_id(&post.user_id).await?;
        let likes_count = self.like_repo.count_by_post(&post.id).await?;
        let comments_count = self.comment_repo.count_by_post(&post.id).await?;
        let is_liked = match viewer_id {
            Some(viewer) => self.like_repo.has_liked(viewer, &post.id).await?,
            None => false,
        };

        Ok(PostDetail {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            tags: tags_from_json(&post.tags),
            read_time: post.read_time.max(1) as u32,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.map(|t| t.to_rfc3339()),
            author: AuthorSummary::from_model(&author),
            likes_count,
            comments_count,
            is_liked,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quill_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn mock_post(id: &str, title: &str, slug: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            content: "<p>Hello world content</p>".to_string(),
            excerpt: "Hello world content...".to_string(),
            cover_image: None,
            tags: serde_json::json!(["rust"]),
            is_published: true,
            read_time: 1,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn mock_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            name: Some("Test User".to_string()),
            bio: None,
            avatar_url: None,
            website: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    fn empty_service(post_db: sea_orm::DatabaseConnection) -> PostService {
        let mock = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        PostService::new(
            PostRepository::new(Arc::new(post_db)),
            UserRepository::new(mock()),
            PostLikeRepository::new(mock()),
            CommentRepository::new(mock()),
        )
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            "  Rust ".to_string(),
            "WEB".to_string(),
            "rust".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["rust", "web"]);
    }

    #[tokio::test]
    async fn test_unique_slug_appends_counter_until_free() {
        // "hello-world" taken, "hello-world-1" free
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)], [count_row(0)]])
            .into_connection();

        let service = empty_service(db);
        let slug = service.unique_slug("Hello World", None).await.unwrap();

        assert_eq!(slug, "hello-world-1");
    }

    #[tokio::test]
    async fn test_unique_slug_excluding_self_keeps_slug() {
        // The only claim on "hello-world" is the excluded post itself
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .into_connection();

        let service = empty_service(db);
        let slug = service
            .unique_slug("Hello World", Some("post1"))
            .await
            .unwrap();

        assert_eq!(slug, "hello-world");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = empty_service(db);

        let result = service
            .create(
                "user1",
                CreatePostInput {
                    title: "   ".to_string(),
                    content: "body".to_string(),
                    excerpt: None,
                    cover_image: None,
                    tags: vec![],
                    is_published: true,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_content() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = empty_service(db);

        let result = service
            .create(
                "user1",
                CreatePostInput {
                    title: "Title".to_string(),
                    content: "".to_string(),
                    excerpt: None,
                    cover_image: None,
                    tags: vec![],
                    is_published: true,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_derives_slug_excerpt_and_read_time() {
        let stored = mock_post("post1", "Hello World", "hello-world");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // slug_exists, then INSERT .. RETURNING
            .append_query_results([vec![count_row(0)]])
            .append_query_results([vec![stored]])
            .into_connection();

        let service = empty_service(db);
        let response = service
            .create(
                "user1",
                CreatePostInput {
                    title: "Hello World".to_string(),
                    content: "<p>Hello world content</p>".to_string(),
                    excerpt: None,
                    cover_image: None,
                    tags: vec!["Rust".to_string()],
                    is_published: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.slug, "hello-world");
        assert_eq!(response.read_time, 1);
        assert_eq!(response.tags, vec!["rust"]);
        assert!(response.excerpt.ends_with("..."));
    }

    #[tokio::test]
    async fn test_delete_missing_post_returns_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let service = empty_service(db);
        let result = service.delete("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_by_slug_assembles_counters() {
        let post = mock_post("post1", "Hello World", "hello-world");
        let author = mock_user("user1", "alice");

        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post]])
            .into_connection();
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[author]])
            .into_connection();
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(3)]])
            .into_connection();
        let comment_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(2)]])
            .into_connection();

        let service = PostService::new(
            PostRepository::new(Arc::new(post_db)),
            UserRepository::new(Arc::new(user_db)),
            PostLikeRepository::new(Arc::new(like_db)),
            CommentRepository::new(Arc::new(comment_db)),
        );

        let detail = service.get_by_slug("hello-world", None).await.unwrap();

        assert_eq!(detail.author.username, "alice");
        assert_eq!(detail.likes_count, 3);
        assert_eq!(detail.comments_count, 2);
        assert!(!detail.is_liked);
    }
}
