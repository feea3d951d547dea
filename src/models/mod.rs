//! Data models
//!
//! Database entities (Project, Hashtag, Rating, Comment, Inspiration, Feature,
//! User, Session), the feed query types, and the reduced views embedded in
//! API responses.

mod comment;
mod feature;
mod feed;
mod hashtag;
mod inspiration;
mod project;
mod rating;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor, ProjectComments, MAX_COMMENT_LENGTH};
pub use feature::{
    Feature, FeatureDetail, FeatureName, MAX_FEATURE_BODY_LENGTH, MAX_FEATURE_TITLE_LENGTH,
};
pub use feed::{
    clamp_take, parse_cursor, parse_take, FeedPage, FeedQuery, FeedSort, SearchQuery, SortBy,
    SortOrder, DEFAULT_SEARCH_OPTIONS_TAKE, DEFAULT_TAKE, MAX_TAKE,
};
pub use hashtag::{normalize_hashtag_names, Hashtag};
pub use inspiration::{
    CreateInspirationInput, ImplementedProject, Inspiration, InspirationDetail,
    InspirationListItem, InspirationShort,
};
pub use project::{
    CreateProjectInput, InspirationRef, Project, ProjectDetail, ProjectSearchOption,
    ProjectSummary, UpdateProjectInput,
};
pub use rating::{average_of, Rating, RatingOutcome, MAX_RATING, MIN_RATING};
pub use session::Session;
pub use user::{User, UserBadge, UserName, UserProfile};
