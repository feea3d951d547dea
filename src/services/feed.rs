//! Feed service
//!
//! Turns raw feed parameters into a `FeedQuery`, runs it, and decides whether
//! the page carries a continuation cursor.
//!
//! A page gets `nextCursor` exactly when it is full. When the number of
//! matching projects is a multiple of `take`, the last full page still
//! carries a cursor and the page after it comes back empty without one.

use crate::db::repositories::ProjectRepository;
use crate::models::{parse_cursor, parse_take, FeedPage, FeedQuery, FeedSort, SortBy, SortOrder};
use anyhow::Context;
use std::sync::Arc;

/// Error types for feed operations
#[derive(Debug, thiserror::Error)]
pub enum FeedServiceError {
    /// Malformed request parameter
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Raw feed parameters as they arrive on the wire
#[derive(Debug, Clone, Default)]
pub struct FeedParams<'a> {
    pub sort_by: Option<&'a str>,
    pub order: Option<&'a str>,
    pub search: Option<&'a str>,
    pub cursor: Option<&'a str>,
    pub take: Option<&'a str>,
}

impl FeedParams<'_> {
    /// Validate and resolve into a query.
    ///
    /// Unknown sort keys, unknown orders, non-integer cursors and non-integer
    /// page sizes are rejected. An integer `take` is clamped. Empty strings
    /// count as absent.
    pub fn into_query(self) -> Result<FeedQuery, FeedServiceError> {
        let by = non_empty(self.sort_by)
            .map(str::parse::<SortBy>)
            .transpose()
            .map_err(FeedServiceError::ValidationError)?;
        let order = non_empty(self.order)
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(FeedServiceError::ValidationError)?;
        let cursor = non_empty(self.cursor)
            .map(parse_cursor)
            .transpose()
            .map_err(FeedServiceError::ValidationError)?;
        let take = non_empty(self.take)
            .map(parse_take)
            .transpose()
            .map_err(FeedServiceError::ValidationError)?;

        Ok(FeedQuery::new(
            FeedSort::resolve(by, order),
            self.search.unwrap_or_default(),
            take,
            cursor,
        ))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Feed service
pub struct FeedService {
    repo: Arc<dyn ProjectRepository>,
}

impl FeedService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self { repo }
    }

    /// Fetch one page of the feed
    pub async fn page(&self, query: &FeedQuery) -> Result<FeedPage, FeedServiceError> {
        let projects = self
            .repo
            .feed(query)
            .await
            .context("Failed to query project feed")?;

        let next_cursor = if projects.len() as i64 == query.take {
            projects.last().map(|p| p.id.to_string())
        } else {
            None
        };

        Ok(FeedPage {
            projects,
            next_cursor,
        })
    }
}
