//! Test fixtures: a migrated in-memory database and raw inserts that let
//! tests control timestamps and aggregates directly.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{create_test_pool, migrations, DynDatabasePool};

pub async fn migrated_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn sqlite(pool: &DynDatabasePool) -> &SqlitePool {
    pool.sqlite().expect("Test pool is SQLite")
}

pub async fn user(pool: &DynDatabasePool, name: &str) -> i64 {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, created_at, updated_at) VALUES (?, ?, 'x', ?, ?)",
    )
    .bind(name)
    .bind(format!("{}@example.com", name))
    .bind(now)
    .bind(now)
    .execute(sqlite(pool))
    .await
    .expect("Failed to insert user")
    .last_insert_rowid()
}

pub async fn project(pool: &DynDatabasePool, user_id: i64, name: &str) -> i64 {
    project_at(pool, user_id, name, Utc::now()).await
}

pub async fn project_at(
    pool: &DynDatabasePool,
    user_id: i64,
    name: &str,
    created_at: DateTime<Utc>,
) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO projects (user_id, name, name_lower, source_code_url, created_at, updated_at)
        VALUES (?, ?, ?, 'https://git.example.com/repo', ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(name.to_lowercase())
    .bind(created_at)
    .bind(created_at)
    .execute(sqlite(pool))
    .await
    .expect("Failed to insert project")
    .last_insert_rowid()
}

/// Link `project_id` to the hashtag `name`, creating the hashtag if needed
pub async fn tag(pool: &DynDatabasePool, project_id: i64, name: &str) {
    let db = sqlite(pool);
    sqlx::query("INSERT OR IGNORE INTO hashtags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now())
        .execute(db)
        .await
        .expect("Failed to insert hashtag");
    sqlx::query(
        "INSERT INTO project_hashtags (project_id, hashtag_id) SELECT ?, id FROM hashtags WHERE name = ?",
    )
    .bind(project_id)
    .bind(name)
    .execute(db)
    .await
    .expect("Failed to link hashtag");
}

pub async fn comment(pool: &DynDatabasePool, project_id: i64, user_id: i64, body: &str) -> i64 {
    sqlx::query("INSERT INTO comments (project_id, user_id, body, created_at) VALUES (?, ?, ?, ?)")
        .bind(project_id)
        .bind(user_id)
        .bind(body)
        .bind(Utc::now())
        .execute(sqlite(pool))
        .await
        .expect("Failed to insert comment")
        .last_insert_rowid()
}

pub async fn set_average(pool: &DynDatabasePool, project_id: i64, average: f64) {
    sqlx::query("UPDATE projects SET average_rating = ? WHERE id = ?")
        .bind(average)
        .bind(project_id)
        .execute(sqlite(pool))
        .await
        .expect("Failed to set average rating");
}

pub async fn inspiration(pool: &DynDatabasePool, user_id: i64, name: &str) -> i64 {
    sqlx::query(
        "INSERT INTO inspirations (user_id, name, description, created_at) VALUES (?, ?, '', ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(Utc::now())
    .execute(sqlite(pool))
    .await
    .expect("Failed to insert inspiration")
    .last_insert_rowid()
}
