//! Project repository
//!
//! Database operations for projects, including the feed query.
//!
//! The feed is a keyset-paginated listing. Every feed statement orders by a
//! sort key followed by the project id in the same direction, and the cursor
//! row's own key is looked up inside the statement, so a page continues
//! strictly after the `(key, id)` pair of the previous page's last project.
//!
//! Listings are assembled with `sqlx::QueryBuilder`, which keeps placeholders
//! and bound values in step. Text search matches `name_lower`, the project
//! name lowercased in Rust when it is written.

use crate::config::DatabaseDriver;
use crate::db::repositories::hashtag::{
    attach_hashtag_mysql, attach_hashtag_sqlite, get_or_create_hashtag_mysql,
    get_or_create_hashtag_sqlite, hashtags_by_project_mysql, hashtags_by_project_sqlite,
};
use crate::db::DynDatabasePool;
use crate::models::{
    CreateProjectInput, FeedQuery, Project, ProjectSearchOption, ProjectSummary, SearchQuery,
    SortBy, SortOrder, UpdateProjectInput, UserName,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::database::HasArguments;
use sqlx::{Database, Encode, MySql, MySqlPool, QueryBuilder, Row, Sqlite, SqlitePool, Type};
use std::sync::Arc;

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a project owned by `user_id` and link its hashtags, all in one
    /// transaction. Hashtag names must already be validated.
    async fn create(
        &self,
        user_id: i64,
        input: &CreateProjectInput,
        hashtags: &[String],
    ) -> Result<Project>;

    /// Get project by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Project>>;

    /// Apply an owner edit, returning the updated project if it exists
    async fn update(&self, id: i64, input: &UpdateProjectInput) -> Result<Option<Project>>;

    /// Delete a project; returns false if it did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// One feed page of at most `query.take` projects
    async fn feed(&self, query: &FeedQuery) -> Result<Vec<ProjectSummary>>;

    /// Search suggestions matching the same filter as the feed
    async fn search_options(
        &self,
        search: &SearchQuery,
        take: i64,
    ) -> Result<Vec<ProjectSearchOption>>;

    /// Projects of one user, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<ProjectSummary>>;

    /// Rated projects, best average first
    async fn popular(&self, limit: i64) -> Result<Vec<ProjectSummary>>;
}

/// SQLx-based project repository implementation
pub struct SqlxProjectRepository {
    pool: DynDatabasePool,
}

impl SqlxProjectRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create(
        &self,
        user_id: i64,
        input: &CreateProjectInput,
        hashtags: &[String],
    ) -> Result<Project> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_project_sqlite(self.pool.sqlite()?, user_id, input, hashtags).await
            }
            DatabaseDriver::Mysql => {
                create_project_mysql(self.pool.mysql()?, user_id, input, hashtags).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_project_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_project_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateProjectInput) -> Result<Option<Project>> {
        let sql = r#"
            UPDATE projects
            SET name = COALESCE(?, name),
                name_lower = COALESCE(?, name_lower),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
        "#;
        let name_lower = input.name.as_deref().map(str::to_lowercase);
        let now = Utc::now();

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.sqlite()?;
                sqlx::query(sql)
                    .bind(&input.name)
                    .bind(&name_lower)
                    .bind(&input.description)
                    .bind(now)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update project")?;
                get_project_sqlite(pool, id).await
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.mysql()?;
                sqlx::query(sql)
                    .bind(&input.name)
                    .bind(&name_lower)
                    .bind(&input.description)
                    .bind(now)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update project")?;
                get_project_mysql(pool, id).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM projects WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete project")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete project")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn feed(&self, query: &FeedQuery) -> Result<Vec<ProjectSummary>> {
        let listing = Listing::Feed(query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_summaries_sqlite(self.pool.sqlite()?, listing).await,
            DatabaseDriver::Mysql => fetch_summaries_mysql(self.pool.mysql()?, listing).await,
        }
    }

    async fn search_options(
        &self,
        search: &SearchQuery,
        take: i64,
    ) -> Result<Vec<ProjectSearchOption>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_options_sqlite(self.pool.sqlite()?, search, take).await
            }
            DatabaseDriver::Mysql => search_options_mysql(self.pool.mysql()?, search, take).await,
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<ProjectSummary>> {
        let listing = Listing::ByUser(user_id);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_summaries_sqlite(self.pool.sqlite()?, listing).await,
            DatabaseDriver::Mysql => fetch_summaries_mysql(self.pool.mysql()?, listing).await,
        }
    }

    async fn popular(&self, limit: i64) -> Result<Vec<ProjectSummary>> {
        let listing = Listing::Popular(limit);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_summaries_sqlite(self.pool.sqlite()?, listing).await,
            DatabaseDriver::Mysql => fetch_summaries_mysql(self.pool.mysql()?, listing).await,
        }
    }
}

// ============================================================================
// Query construction
// ============================================================================

const PROJECT_COLUMNS: &str = "id, user_id, inspiration_id, name, description, source_code_url, \
     live_demo_url, image, average_rating, created_at, updated_at";

const SUMMARY_SELECT: &str =
    "SELECT p.id, p.name, p.image, u.name AS user_name FROM projects p JOIN users u ON u.id = p.user_id";

const SEARCH_OPTION_SELECT: &str = "SELECT p.id, p.name, p.live_demo_url, u.name AS user_name \
     FROM projects p JOIN users u ON u.id = p.user_id";

/// Escape character used in LIKE patterns
const LIKE_ESCAPE: char = '!';

/// Which project summaries to list
#[derive(Debug, Clone, Copy)]
enum Listing<'a> {
    Feed(&'a FeedQuery),
    ByUser(i64),
    Popular(i64),
}

impl Listing<'_> {
    fn query<'args, DB>(self) -> QueryBuilder<'args, DB>
    where
        DB: Database,
        <DB as HasArguments<'args>>::Arguments: Default,
        i64: Encode<'args, DB> + Type<DB>,
        String: Encode<'args, DB> + Type<DB>,
    {
        match self {
            Listing::Feed(query) => feed_query(query),
            Listing::ByUser(user_id) => {
                let mut builder = QueryBuilder::new(SUMMARY_SELECT);
                builder
                    .push(" WHERE p.user_id = ")
                    .push_bind(user_id)
                    .push(" ORDER BY p.created_at DESC, p.id DESC");
                builder
            }
            Listing::Popular(limit) => {
                let mut builder = QueryBuilder::new(SUMMARY_SELECT);
                builder
                    .push(" WHERE p.average_rating IS NOT NULL")
                    .push(" ORDER BY p.average_rating DESC, p.id DESC LIMIT ")
                    .push_bind(limit);
                builder
            }
        }
    }
}

/// SQL expression of the sort key for the project aliased as `alias`.
///
/// Unrated projects sort below every real rating (ratings are at least 1).
fn sort_key(by: Option<SortBy>, alias: &str) -> String {
    match by {
        Some(SortBy::Newest) => format!("{}.created_at", alias),
        Some(SortBy::Rating) => format!("COALESCE({}.average_rating, -1.0)", alias),
        Some(SortBy::Discussed) => format!(
            "(SELECT COUNT(*) FROM comments cm WHERE cm.project_id = {}.id)",
            alias
        ),
        None => format!("{}.id", alias),
    }
}

/// Escape LIKE metacharacters and wrap in `%...%` for a substring match
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.to_lowercase().chars() {
        if ch == LIKE_ESCAPE || ch == '%' || ch == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Start the next WHERE condition
fn push_condition<DB: Database>(builder: &mut QueryBuilder<'_, DB>, first: &mut bool) {
    builder.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

/// Append the conditions of a parsed search term
fn push_search_filter<'args, DB>(
    builder: &mut QueryBuilder<'args, DB>,
    search: &SearchQuery,
    first: &mut bool,
) where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
{
    if !search.text.is_empty() {
        push_condition(builder, first);
        builder
            .push("p.name_lower LIKE ")
            .push_bind(like_pattern(&search.text))
            .push(format!(" ESCAPE '{}'", LIKE_ESCAPE));
    }

    if !search.hashtags.is_empty() {
        push_condition(builder, first);
        builder.push(
            "EXISTS (SELECT 1 FROM project_hashtags ph JOIN hashtags h ON h.id = ph.hashtag_id \
             WHERE ph.project_id = p.id AND h.name IN (",
        );
        let mut names = builder.separated(", ");
        for name in &search.hashtags {
            names.push_bind(name.clone());
        }
        names.push_unseparated("))");
    }
}

/// Build the feed statement.
///
/// Binds in order: search filter, cursor (three times), limit.
pub(crate) fn feed_query<'args, DB>(query: &FeedQuery) -> QueryBuilder<'args, DB>
where
    DB: Database,
    <DB as HasArguments<'args>>::Arguments: Default,
    i64: Encode<'args, DB> + Type<DB>,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(SUMMARY_SELECT);
    let mut first = true;
    push_search_filter(&mut builder, &query.search, &mut first);

    let by = query.sort.map(|sort| sort.by);
    let order = query.sort.map(|sort| sort.order).unwrap_or(SortOrder::Asc);
    let key = sort_key(by, "p");

    if let Some(cursor) = query.cursor {
        let cursor_key = format!("(SELECT {} FROM projects c WHERE c.id = ", sort_key(by, "c"));
        let op = order.after_op();
        push_condition(&mut builder, &mut first);
        builder
            .push(format!("({} {} {}", key, op, cursor_key))
            .push_bind(cursor)
            .push(format!(") OR ({} = {}", key, cursor_key))
            .push_bind(cursor)
            .push(format!(") AND p.id {} ", op))
            .push_bind(cursor)
            .push("))");
    }

    match by {
        Some(_) => builder.push(format!(
            " ORDER BY {key} {dir}, p.id {dir}",
            key = key,
            dir = order.as_sql()
        )),
        None => builder.push(" ORDER BY p.id ASC"),
    };
    builder.push(" LIMIT ").push_bind(query.take);
    builder
}

fn search_options_query<'args, DB>(search: &SearchQuery, take: i64) -> QueryBuilder<'args, DB>
where
    DB: Database,
    <DB as HasArguments<'args>>::Arguments: Default,
    i64: Encode<'args, DB> + Type<DB>,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut builder = QueryBuilder::new(SEARCH_OPTION_SELECT);
    let mut first = true;
    push_search_filter(&mut builder, search, &mut first);
    builder.push(" ORDER BY p.id ASC LIMIT ").push_bind(take);
    builder
}

// ============================================================================
// SQLite implementations
// ============================================================================

const INSERT_PROJECT: &str = r#"
    INSERT INTO projects (user_id, inspiration_id, name, name_lower, description,
                          source_code_url, live_demo_url, image, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

async fn create_project_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &CreateProjectInput,
    hashtags: &[String],
) -> Result<Project> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_PROJECT)
        .bind(user_id)
        .bind(input.inspiration_id)
        .bind(&input.name)
        .bind(input.name.to_lowercase())
        .bind(&input.description)
        .bind(&input.source_code_url)
        .bind(&input.live_demo_url)
        .bind(&input.image)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create project")?;
    let id = result.last_insert_rowid();

    for name in hashtags {
        let hashtag = get_or_create_hashtag_sqlite(&mut *tx, name).await?;
        attach_hashtag_sqlite(&mut *tx, id, hashtag.id).await?;
    }

    tx.commit().await.context("Failed to commit project")?;
    Ok(new_project(id, user_id, input, now))
}

async fn get_project_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by ID")?;

    Ok(row.map(|row| Project {
        id: row.get("id"),
        user_id: row.get("user_id"),
        inspiration_id: row.get("inspiration_id"),
        name: row.get("name"),
        description: row.get("description"),
        source_code_url: row.get("source_code_url"),
        live_demo_url: row.get("live_demo_url"),
        image: row.get("image"),
        average_rating: row.get("average_rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn fetch_summaries_sqlite(
    pool: &SqlitePool,
    listing: Listing<'_>,
) -> Result<Vec<ProjectSummary>> {
    let mut builder = listing.query::<Sqlite>();
    tracing::debug!(sql = builder.sql(), "Listing projects");
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list projects")?;

    let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
    let mut hashtags = hashtags_by_project_sqlite(pool, &ids).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            ProjectSummary {
                id,
                name: row.get("name"),
                image: row.get("image"),
                hashtags: hashtags.remove(&id).unwrap_or_default(),
                user: UserName::new(row.get::<String, _>("user_name")),
            }
        })
        .collect())
}

async fn search_options_sqlite(
    pool: &SqlitePool,
    search: &SearchQuery,
    take: i64,
) -> Result<Vec<ProjectSearchOption>> {
    let mut builder = search_options_query::<Sqlite>(search, take);
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to search projects")?;

    let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
    let mut hashtags = hashtags_by_project_sqlite(pool, &ids).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            ProjectSearchOption {
                id,
                name: row.get("name"),
                live_demo_url: row.get("live_demo_url"),
                user: UserName::new(row.get::<String, _>("user_name")),
                hashtags: hashtags.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_project_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &CreateProjectInput,
    hashtags: &[String],
) -> Result<Project> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(INSERT_PROJECT)
        .bind(user_id)
        .bind(input.inspiration_id)
        .bind(&input.name)
        .bind(input.name.to_lowercase())
        .bind(&input.description)
        .bind(&input.source_code_url)
        .bind(&input.live_demo_url)
        .bind(&input.image)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create project")?;
    let id = result.last_insert_id() as i64;

    for name in hashtags {
        let hashtag = get_or_create_hashtag_mysql(&mut *tx, name).await?;
        attach_hashtag_mysql(&mut *tx, id, hashtag.id).await?;
    }

    tx.commit().await.context("Failed to commit project")?;
    Ok(new_project(id, user_id, input, now))
}

async fn get_project_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by ID")?;

    Ok(row.map(|row| Project {
        id: row.get("id"),
        user_id: row.get("user_id"),
        inspiration_id: row.get("inspiration_id"),
        name: row.get("name"),
        description: row.get("description"),
        source_code_url: row.get("source_code_url"),
        live_demo_url: row.get("live_demo_url"),
        image: row.get("image"),
        average_rating: row.get("average_rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

async fn fetch_summaries_mysql(
    pool: &MySqlPool,
    listing: Listing<'_>,
) -> Result<Vec<ProjectSummary>> {
    let mut builder = listing.query::<MySql>();
    tracing::debug!(sql = builder.sql(), "Listing projects");
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to list projects")?;

    let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
    let mut hashtags = hashtags_by_project_mysql(pool, &ids).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            ProjectSummary {
                id,
                name: row.get("name"),
                image: row.get("image"),
                hashtags: hashtags.remove(&id).unwrap_or_default(),
                user: UserName::new(row.get::<String, _>("user_name")),
            }
        })
        .collect())
}

async fn search_options_mysql(
    pool: &MySqlPool,
    search: &SearchQuery,
    take: i64,
) -> Result<Vec<ProjectSearchOption>> {
    let mut builder = search_options_query::<MySql>(search, take);
    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .context("Failed to search projects")?;

    let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
    let mut hashtags = hashtags_by_project_mysql(pool, &ids).await?;

    Ok(rows
        .iter()
        .map(|row| {
            let id: i64 = row.get("id");
            ProjectSearchOption {
                id,
                name: row.get("name"),
                live_demo_url: row.get("live_demo_url"),
                user: UserName::new(row.get::<String, _>("user_name")),
                hashtags: hashtags.remove(&id).unwrap_or_default(),
            }
        })
        .collect())
}

fn new_project(
    id: i64,
    user_id: i64,
    input: &CreateProjectInput,
    now: chrono::DateTime<Utc>,
) -> Project {
    Project {
        id,
        user_id,
        inspiration_id: input.inspiration_id,
        name: input.name.clone(),
        description: input.description.clone(),
        source_code_url: input.source_code_url.clone(),
        live_demo_url: input.live_demo_url.clone(),
        image: input.image.clone(),
        average_rating: None,
        created_at: now,
        updated_at: now,
    }
}
