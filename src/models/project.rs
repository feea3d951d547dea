//! Project model
//!
//! A project is a developer side-project submitted by one user. It carries
//! links, an optional image reference, hashtags and an average rating that
//! stays null until the first rating arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Hashtag, UserName, UserProfile};

/// Project entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Inspiration this project implements, if any
    pub inspiration_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub source_code_url: String,
    pub live_demo_url: Option<String>,
    /// Opaque image reference (upload happens elsewhere)
    pub image: Option<String>,
    /// Mean of all current ratings, `None` until rated
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// True if `user_id` owns this project
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// Input for submitting a project
#[derive(Debug, Clone, Default)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub source_code_url: String,
    pub live_demo_url: Option<String>,
    /// Raw hashtag names; normalized by the service
    pub hashtags: Vec<String>,
    pub image: Option<String>,
    pub inspiration_id: Option<i64>,
}

impl CreateProjectInput {
    pub fn new(name: impl Into<String>, source_code_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_code_url: source_code_url.into(),
            ..Default::default()
        }
    }

    pub fn with_hashtags<I, S>(mut self, hashtags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = hashtags.into_iter().map(Into::into).collect();
        self
    }
}

/// Owner edits: only name and description can change
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Compact project card used by the feed, the popular list and user pages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub hashtags: Vec<Hashtag>,
    pub user: UserName,
}

/// Search suggestion entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSearchOption {
    pub id: i64,
    pub name: String,
    pub live_demo_url: Option<String>,
    pub user: UserName,
    pub hashtags: Vec<Hashtag>,
}

/// Inspiration reference shown on a project page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspirationRef {
    pub id: i64,
    pub name: String,
}

/// Full project page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub user: UserProfile,
    pub inspired: Option<InspirationRef>,
    pub hashtags: Vec<Hashtag>,
    /// The viewer's own rating, if signed in and rated
    pub user_rate: Option<i32>,
    pub total_rating_count: i64,
    pub comment_count: i64,
}
