//! Feed query model
//!
//! Types describing one request to the project feed: how to sort, what to
//! filter on, and where the previous page ended.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use super::ProjectSummary;

/// Page size used when the caller does not ask for one
pub const DEFAULT_TAKE: i64 = 7;
/// Upper bound for a single page
pub const MAX_TAKE: i64 = 100;
/// Page size for search suggestions
pub const DEFAULT_SEARCH_OPTIONS_TAKE: i64 = 5;

/// Sort key of the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Creation timestamp
    Newest,
    /// Average rating, unrated projects lowest
    Rating,
    /// Number of comments
    Discussed,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Newest => write!(f, "newest"),
            SortBy::Rating => write!(f, "rating"),
            SortBy::Discussed => write!(f, "discussed"),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortBy::Newest),
            "rating" => Ok(SortBy::Rating),
            "discussed" => Ok(SortBy::Discussed),
            _ => Err(format!(
                "Invalid sortBy '{}', expected one of: newest, rating, discussed",
                s
            )),
        }
    }
}

/// Direction of the feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// SQL keyword for ORDER BY
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Comparison operator selecting rows strictly after a cursor
    pub fn after_op(&self) -> &'static str {
        match self {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid order '{}', expected asc or desc", s)),
        }
    }
}

/// A resolved sort: key plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSort {
    pub by: SortBy,
    pub order: SortOrder,
}

impl FeedSort {
    /// Resolve optional request parameters into a sort.
    ///
    /// The order falls back to ascending whenever a key is given without one,
    /// for every key including `newest`. An order with no key is ignored.
    pub fn resolve(by: Option<SortBy>, order: Option<SortOrder>) -> Option<Self> {
        by.map(|by| Self {
            by,
            order: order.unwrap_or_default(),
        })
    }
}

/// Search input split into its hashtag and free-text parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Hashtag names without their leading `#`
    pub hashtags: BTreeSet<String>,
    /// Remaining words joined by single spaces
    pub text: String,
}

impl SearchQuery {
    /// Parse a raw search term.
    ///
    /// `"#rust  cli #web tool"` becomes hashtags `{rust, web}` and text `"cli tool"`.
    /// A bare `#` contributes the empty name, which no stored hashtag carries.
    pub fn parse(term: &str) -> Self {
        let mut hashtags = BTreeSet::new();
        let mut words = Vec::new();

        for token in term.split_whitespace() {
            if token.starts_with('#') {
                hashtags.insert(token.trim_start_matches('#').to_string());
            } else {
                words.push(token);
            }
        }

        Self {
            hashtags,
            text: words.join(" "),
        }
    }

    /// True when the query places no constraint on the feed
    pub fn is_empty(&self) -> bool {
        self.hashtags.is_empty() && self.text.is_empty()
    }
}

/// Clamp a requested page size into `[1, MAX_TAKE]`, defaulting when absent
pub fn clamp_take(take: Option<i64>, default: i64) -> i64 {
    take.unwrap_or(default).clamp(1, MAX_TAKE)
}

/// Parse a requested page size.
///
/// Integers too large for `i64` saturate so they still clamp to the bounds;
/// anything that is not an integer is rejected.
pub fn parse_take(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(take) => Ok(take),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(format!("Invalid take '{}'", raw)),
        },
    }
}

/// Parse a cursor from its wire form (a decimal project id)
pub fn parse_cursor(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| format!("Invalid cursor '{}'", raw))
}

/// One fully resolved feed request
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub sort: Option<FeedSort>,
    pub search: SearchQuery,
    pub take: i64,
    pub cursor: Option<i64>,
}

impl FeedQuery {
    pub fn new(
        sort: Option<FeedSort>,
        search: &str,
        take: Option<i64>,
        cursor: Option<i64>,
    ) -> Self {
        Self {
            sort,
            search: SearchQuery::parse(search),
            take: clamp_take(take, DEFAULT_TAKE),
            cursor,
        }
    }
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::new(None, "", None, None)
    }
}

/// One page of the feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub projects: Vec<ProjectSummary>,
    /// Id of the last project, present only when the page was full
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_hashtags_and_text() {
        let query = SearchQuery::parse("#a foo");
        assert_eq!(query.hashtags, BTreeSet::from(["a".to_string()]));
        assert_eq!(query.text, "foo");
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let query = SearchQuery::parse("  todo   #rust\tapp  #cli ");
        assert_eq!(
            query.hashtags,
            BTreeSet::from(["cli".to_string(), "rust".to_string()])
        );
        assert_eq!(query.text, "todo app");
    }

    #[test]
    fn test_parse_strips_every_leading_hash() {
        let query = SearchQuery::parse("##demo #c#");
        assert!(query.hashtags.contains("demo"));
        assert!(query.hashtags.contains("c#"));
        assert!(query.text.is_empty());
    }

    #[test]
    fn test_parse_keeps_bare_hash_as_empty_name() {
        let query = SearchQuery::parse("# ## game");
        assert_eq!(query.hashtags, BTreeSet::from([String::new()]));
        assert_eq!(query.text, "game");
        assert!(!SearchQuery::parse("#").is_empty());
    }

    #[test]
    fn test_parse_keeps_hashtag_case() {
        let query = SearchQuery::parse("#Rust #rust");
        assert_eq!(query.hashtags.len(), 2);
    }

    #[test]
    fn test_empty_query() {
        assert!(SearchQuery::parse("").is_empty());
        assert!(SearchQuery::parse("   ").is_empty());
        assert!(!SearchQuery::parse("x").is_empty());
    }

    #[test]
    fn test_sort_defaults_to_ascending() {
        for by in [SortBy::Newest, SortBy::Rating, SortBy::Discussed] {
            let sort = FeedSort::resolve(Some(by), None).unwrap();
            assert_eq!(sort.order, SortOrder::Asc);
        }
    }

    #[test]
    fn test_order_without_key_is_ignored() {
        assert_eq!(FeedSort::resolve(None, Some(SortOrder::Desc)), None);
    }

    #[test]
    fn test_sort_enums_parse() {
        assert_eq!("discussed".parse::<SortBy>().unwrap(), SortBy::Discussed);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("popular".parse::<SortBy>().is_err());
        assert!("DESC".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_clamp_take() {
        assert_eq!(clamp_take(None, DEFAULT_TAKE), 7);
        assert_eq!(clamp_take(Some(0), DEFAULT_TAKE), 1);
        assert_eq!(clamp_take(Some(-5), DEFAULT_TAKE), 1);
        assert_eq!(clamp_take(Some(50), DEFAULT_TAKE), 50);
        assert_eq!(clamp_take(Some(1000), DEFAULT_TAKE), 100);
    }

    #[test]
    fn test_parse_take() {
        assert_eq!(parse_take("12").unwrap(), 12);
        assert_eq!(parse_take(" -3 ").unwrap(), -3);
        assert_eq!(parse_take("99999999999999999999").unwrap(), i64::MAX);
        assert_eq!(parse_take("-99999999999999999999").unwrap(), i64::MIN);
        assert!(parse_take("abc").is_err());
        assert!(parse_take("7.5").is_err());
        assert!(parse_take("").is_err());
    }

    #[test]
    fn test_parse_cursor() {
        assert_eq!(parse_cursor("42").unwrap(), 42);
        assert!(parse_cursor("abc").is_err());
        assert!(parse_cursor("").is_err());
    }

    #[test]
    fn test_page_omits_missing_cursor() {
        let page = FeedPage {
            projects: vec![],
            next_cursor: None,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("nextCursor").is_none());

        let page = FeedPage {
            projects: vec![],
            next_cursor: Some("9".to_string()),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["nextCursor"], "9");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn token_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9]{1,8}",
            "#{1,3}[a-zA-Z0-9]{0,8}",
        ]
    }

    fn term_strategy() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(token_strategy(), 0..8),
            prop::collection::vec("[ \t]{1,3}", 8),
        )
            .prop_map(|(tokens, gaps)| {
                tokens
                    .iter()
                    .zip(gaps.iter())
                    .map(|(token, gap)| format!("{}{}", gap, token))
                    .collect::<String>()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Hashtag names never keep a leading `#`, and every `#` token yields one.
        #[test]
        fn prop_hashtags_are_stripped(term in term_strategy()) {
            let query = SearchQuery::parse(&term);
            for name in &query.hashtags {
                prop_assert!(!name.starts_with('#'));
            }
            let tagged = term.split_whitespace().any(|t| t.starts_with('#'));
            prop_assert_eq!(query.hashtags.is_empty(), !tagged);
        }

        /// The text part holds no hashtag tokens and no redundant whitespace.
        #[test]
        fn prop_text_is_normalized(term in term_strategy()) {
            let query = SearchQuery::parse(&term);
            prop_assert_eq!(query.text.trim(), query.text.as_str());
            prop_assert!(!query.text.contains("  "));
            prop_assert!(!query.text.contains('\t'));
            for word in query.text.split(' ').filter(|w| !w.is_empty()) {
                prop_assert!(!word.starts_with('#'));
            }
        }

        /// Every plain word of the input survives, in order.
        #[test]
        fn prop_words_preserved(term in term_strategy()) {
            let expected: Vec<&str> = term
                .split_whitespace()
                .filter(|t| !t.starts_with('#'))
                .collect();
            prop_assert_eq!(SearchQuery::parse(&term).text, expected.join(" "));
        }

        /// Any requested page size ends up inside the allowed range.
        #[test]
        fn prop_take_in_range(take in proptest::option::of(any::<i64>())) {
            let clamped = clamp_take(take, DEFAULT_TAKE);
            prop_assert!((1..=MAX_TAKE).contains(&clamped));
        }
    }
}
