//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the operations for a specific entity.

pub mod comment;
pub mod feature;
pub mod hashtag;
pub mod inspiration;
pub mod project;
pub mod rating;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod fixtures;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use feature::{FeatureRepository, SqlxFeatureRepository};
pub use hashtag::{HashtagRepository, SqlxHashtagRepository};
pub use inspiration::{InspirationRepository, SqlxInspirationRepository};
pub use project::{ProjectRepository, SqlxProjectRepository};
pub use rating::{RatingRepository, SqlxRatingRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
