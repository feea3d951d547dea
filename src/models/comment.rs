//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserBadge;

/// Longest comment body accepted
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment together with its author, as shown under a project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Author id, used to split the viewer's own comments from the rest
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub user: UserBadge,
}

/// Comment listing of one project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComments {
    /// Everyone else's comments, newest first
    pub comments: Vec<CommentWithAuthor>,
    /// The viewer's own comments, present only for signed-in viewers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_comments: Option<Vec<CommentWithAuthor>>,
    pub total_comments_count: i64,
}

impl ProjectComments {
    /// Split a newest-first list by author
    pub fn split(all: Vec<CommentWithAuthor>, viewer_id: Option<i64>) -> Self {
        let total_comments_count = all.len() as i64;
        match viewer_id {
            Some(viewer_id) => {
                let (own, others): (Vec<_>, Vec<_>) =
                    all.into_iter().partition(|c| c.user_id == viewer_id);
                Self {
                    comments: others,
                    users_comments: Some(own),
                    total_comments_count,
                }
            }
            None => Self {
                comments: all,
                users_comments: None,
                total_comments_count,
            },
        }
    }
}
