//! Inspiration model
//!
//! An inspiration is a project idea. Projects may declare that they implement one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserName, UserProfile};

/// Inspiration entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspiration {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an inspiration
#[derive(Debug, Clone)]
pub struct CreateInspirationInput {
    pub name: String,
    pub description: String,
}

/// Row of the inspiration list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspirationListItem {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user: UserName,
    /// Number of projects implementing it
    pub implemented_count: i64,
}

/// Just enough to label a link
#[derive(Debug, Clone, Serialize)]
pub struct InspirationShort {
    pub id: i64,
    pub name: String,
}

/// Project implementing an inspiration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementedProject {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user: UserName,
}

/// Inspiration page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspirationDetail {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub user: UserProfile,
    pub implemented: Vec<ImplementedProject>,
}
