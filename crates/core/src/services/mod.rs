//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod feed;
pub mod following;
pub mod like;
pub mod post;

pub use comment::{CommentResponse, CommentService};
pub use feed::{FeedScope, FeedService, FilterCriteria, PostPage, PostSummary};
pub use following::{FollowService, FollowToggle, UserSummary};
pub use like::{LikeService, LikeToggle};
pub use post::{AuthorSummary, CreatePostInput, PostDetail, PostResponse, PostService, UpdatePostInput};
