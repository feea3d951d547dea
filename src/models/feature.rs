//! Suggested feature model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Longest feature title accepted
pub const MAX_FEATURE_TITLE_LENGTH: u64 = 20;
/// Longest feature body accepted
pub const MAX_FEATURE_BODY_LENGTH: u64 = 160;

/// A feature suggested for an inspiration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: i64,
    pub inspiration_id: i64,
    pub user_id: i64,
    pub name: String,
    pub short_description: String,
    pub created_at: DateTime<Utc>,
}

/// Feature list entry
#[derive(Debug, Clone, Serialize)]
pub struct FeatureName {
    pub id: i64,
    pub name: String,
}

/// Feature with its author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetail {
    #[serde(flatten)]
    pub feature: Feature,
    pub user: UserProfile,
}
