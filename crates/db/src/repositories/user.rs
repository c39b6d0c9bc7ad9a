//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use quill_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
    sea_query::{Expr, Func},
};

/// Maximum rows returned by a profile search.
const SEARCH_LIMIT: u64 = 20;

/// Case-insensitive substring predicate over username or display name.
///
/// Parameterized like the post search; `%` and `_` in the term are
/// escaped so they match literally.
fn search_condition(term: &str) -> Condition {
    let pattern = format!(
        "%{}%",
        term.replace('%', "\\%").replace('_', "\\_").to_lowercase()
    );

    Condition::any()
        .add(
            Expr::expr(Func::lower(Expr::col((
                user::Entity,
                user::Column::Username,
            ))))
            .like(&pattern),
        )
        .add(
            Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Name)))).like(&pattern),
        )
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs (for batch assembly of feed/graph responses).
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username (profile resolution).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search user profiles by username or display name.
    ///
    /// Case-insensitive substring match, most-followed accounts first
    /// (follower count is computed from the edge set, not stored), capped
    /// at 20 rows. An empty term matches everyone, so it returns the top
    /// 20 accounts by followers.
    pub async fn search(&self, term: &str) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(search_condition(term))
            .order_by(
                Expr::cust(
                    r#"(SELECT COUNT(*) FROM "follow" WHERE "follow"."followee_id" = "user"."id")"#,
                ),
                Order::Desc,
            )
            .order_by_asc(user::Column::Username)
            .limit(SEARCH_LIMIT)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Username or email already taken".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}
