//! Hashtag model

use serde::{Deserialize, Serialize};

/// Hashtag entity. Names are unique and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashtag {
    pub id: i64,
    pub name: String,
}

impl Hashtag {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Normalize user supplied hashtag names.
///
/// Trims whitespace and leading `#`, drops empty names and duplicates while
/// keeping first-seen order. Case is preserved.
pub fn normalize_hashtag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for raw in names {
        let name = raw.as_ref().trim().trim_start_matches('#').trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}
