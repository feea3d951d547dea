//! Services layer - Business logic
//!
//! Services validate input, enforce ownership and coordinate the
//! repositories. Handlers never talk to repositories directly.

pub mod comment;
pub mod feed;
pub mod hashtag;
pub mod inspiration;
pub mod password;
pub mod project;
pub mod rating;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use feed::{FeedParams, FeedService, FeedServiceError};
pub use hashtag::{validate_hashtag_name, HashtagService, HashtagServiceError};
pub use inspiration::{InspirationService, InspirationServiceError};
pub use password::{hash_password, verify_password};
pub use project::{ProjectService, ProjectServiceError};
pub use rating::{RatingService, RatingServiceError};
pub use user::{LoginInput, RegisterInput, UserPage, UserService, UserServiceError};
