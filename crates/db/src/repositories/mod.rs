//! Database repositories.

pub mod comment;
pub mod follow;
pub mod post;
pub mod post_like;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use post::{PostQuery, PostRepository};
pub use post_like::PostLikeRepository;
pub use user::UserRepository;
