//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
    sea_query::{Expr, Func},
};

/// Filter description for published-post listings.
///
/// The caller resolves feed scope into concrete author sets before building
/// one of these; every field composes as an AND predicate. Kept as a plain
/// value so predicate composition can be tested without a database.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Restrict to a single author (profile listings).
    pub author_id: Option<String>,
    /// Restrict to a set of authors (resolved "following" feed scope).
    pub author_ids: Option<Vec<String>>,
    /// Exact containment match against the lower-cased tag array.
    pub tag: Option<String>,
    /// Case-insensitive substring match against title or excerpt.
    pub search: Option<String>,
}

impl PostQuery {
    /// Compose the filter into a query condition.
    ///
    /// Only published posts ever match. Every predicate is parameterized;
    /// no user input is concatenated into SQL.
    pub(crate) fn condition(&self) -> Condition {
        let mut condition = Condition::all().add(post::Column::IsPublished.eq(true));

        if let Some(author_id) = &self.author_id {
            condition = condition.add(post::Column::UserId.eq(author_id));
        }

        if let Some(author_ids) = &self.author_ids {
            condition = condition.add(post::Column::UserId.is_in(author_ids.iter().cloned()));
        }

        if let Some(tag) = &self.tag {
            // JSONB containment: tags @> '["tag"]'
            let tag_json = serde_json::json!([tag]).to_string();
            condition = condition.add(Expr::cust_with_values(
                r#""post"."tags" @> CAST($1 AS jsonb)"#,
                [tag_json],
            ));
        }

        if let Some(search) = &self.search {
            let pattern = format!(
                "%{}%",
                search
                    .replace('%', "\\%")
                    .replace('_', "\\_")
                    .to_lowercase()
            );
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            post::Entity,
                            post::Column::Title,
                        ))))
                        .like(&pattern),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            post::Entity,
                            post::Column::Excerpt,
                        ))))
                        .like(&pattern),
                    ),
            );
        }

        condition
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Find a published post by slug.
    pub async fn find_published_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::IsPublished.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a slug is taken by any post other than `exclude_id`.
    ///
    /// Backs the unique-slug search: re-saving an unchanged title excludes
    /// the post itself so its own slug never counts as a collision.
    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let mut query = Post::find().filter(post::Column::Slug.eq(slug));

        if let Some(id) = exclude_id {
            query = query.filter(post::Column::Id.ne(id));
        }

        let count = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Create a new post.
    ///
    /// A slug collision that slips past the uniqueness search (concurrent
    /// create with the same title) surfaces as a retryable conflict.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Slug already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Slug already in use".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete a post. Returns whether a row was actually removed.
    ///
    /// Likes and comments on the post are removed by `ON DELETE CASCADE`,
    /// so no orphan edges survive to skew the counters.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// List published posts matching the filter (paginated, newest first).
    ///
    /// Ordering is `created_at DESC, id DESC` so posts sharing a timestamp
    /// paginate deterministically.
    pub async fn find_published(
        &self,
        query: &PostQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(query.condition())
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published posts matching the filter.
    ///
    /// Uses the same condition as [`Self::find_published`], so a page and
    /// its total always describe the same matching set.
    pub async fn count_published(&self, query: &PostQuery) -> AppResult<u64> {
        Post::find()
            .filter(query.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbBackend, MockDatabase, QueryTrait};

    fn build_sql(query: &PostQuery) -> String {
        Post::find()
            .filter(query.condition())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_condition_published_only() {
        let sql = build_sql(&PostQuery::default());
        assert!(sql.contains(r#""post"."is_published" = TRUE"#));
    }

    #[test]
    fn test_condition_author() {
        let sql = build_sql(&PostQuery {
            author_id: Some("u1".to_string()),
            ..Default::default()
        });
        assert!(sql.contains(r#""post"."user_id" = 'u1'"#));
    }

    #[test]
    fn test_condition_author_set() {
        let sql = build_sql(&PostQuery {
            author_ids: Some(vec!["u1".to_string(), "u2".to_string()]),
            ..Default::default()
        });
        assert!(sql.contains(r#""post"."user_id" IN ('u1', 'u2')"#));
    }

    #[test]
    fn test_condition_tag_containment() {
        let sql = build_sql(&PostQuery {
            tag: Some("travel".to_string()),
            ..Default::default()
        });
        assert!(sql.contains(r#""post"."tags" @> CAST("#));
        assert!(sql.contains("travel"));
    }

    #[test]
    fn test_condition_search_title_or_excerpt() {
        let sql = build_sql(&PostQuery {
            search: Some("Rust".to_string()),
            ..Default::default()
        });
        // Case-insensitive: both sides lower-cased
        assert!(sql.contains(r#"LOWER("post"."title")"#));
        assert!(sql.contains(r#"LOWER("post"."excerpt")"#));
        assert!(sql.contains("%rust%"));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn test_condition_search_escapes_wildcards() {
        let sql = build_sql(&PostQuery {
            search: Some("100%_done".to_string()),
            ..Default::default()
        });
        assert!(sql.contains("\\%"));
        assert!(sql.contains("\\_"));
    }

    #[test]
    fn test_condition_filters_are_conjunctive() {
        let sql = build_sql(&PostQuery {
            author_ids: Some(vec!["u1".to_string()]),
            tag: Some("travel".to_string()),
            search: Some("alps".to_string()),
            ..Default::default()
        });
        assert!(sql.contains(r#""post"."is_published" = TRUE"#));
        assert!(sql.contains(r#""post"."user_id" IN ('u1')"#));
        assert!(sql.contains(r#""post"."tags" @> CAST("#));
        assert!(sql.contains("%alps%"));
    }

    #[test]
    fn test_listing_orders_by_created_at_then_id() {
        let sql = Post::find()
            .filter(PostQuery::default().condition())
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"ORDER BY "post"."created_at" DESC, "post"."id" DESC"#));
    }

    fn create_test_post(id: &str, user_id: &str, slug: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Title".to_string(),
            slug: slug.to_string(),
            content: "<p>Body</p>".to_string(),
            excerpt: "Body...".to_string(),
            cover_image: None,
            tags: serde_json::json!([]),
            is_published: true,
            read_time: 1,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post("p1", "u1", "title");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_id("p1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().slug, "title");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_slug_exists_true() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(repo.slug_exists("hello-world", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_slug_exists_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(!repo.slug_exists("hello-world", Some("p1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_published_returns_rows() {
        let p1 = create_test_post("p2", "u1", "newer");
        let p2 = create_test_post("p1", "u1", "older");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .find_published(&PostQuery::default(), 12, 0)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "p2");
    }
}
