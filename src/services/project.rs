//! Project service
//!
//! Submission, project pages, owner edits and the smaller project listings
//! (per user, popular, search suggestions).

use crate::db::repositories::{
    CommentRepository, InspirationRepository, ProjectRepository, RatingRepository, UserRepository,
};
use crate::models::{
    clamp_take, normalize_hashtag_names, parse_take, CreateProjectInput, InspirationRef, Project,
    ProjectDetail, ProjectSearchOption, ProjectSummary, SearchQuery, UpdateProjectInput,
    DEFAULT_SEARCH_OPTIONS_TAKE,
};
use crate::services::hashtag::{validate_hashtag_name, HashtagService, HashtagServiceError};
use anyhow::{anyhow, Context};
use std::sync::Arc;
use validator::ValidateUrl;

/// Longest accepted project name, in characters
pub const MAX_PROJECT_NAME_LENGTH: usize = 255;

/// Number of projects in the popular list
pub const POPULAR_LIMIT: i64 = 5;

/// Error types for project service operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    /// Project (or a referenced entity) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The caller does not own the project
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<HashtagServiceError> for ProjectServiceError {
    fn from(err: HashtagServiceError) -> Self {
        match err {
            HashtagServiceError::ValidationError(msg) => Self::ValidationError(msg),
            HashtagServiceError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// Project service
pub struct ProjectService {
    project_repo: Arc<dyn ProjectRepository>,
    user_repo: Arc<dyn UserRepository>,
    inspiration_repo: Arc<dyn InspirationRepository>,
    rating_repo: Arc<dyn RatingRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    hashtags: Arc<HashtagService>,
}

impl ProjectService {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        user_repo: Arc<dyn UserRepository>,
        inspiration_repo: Arc<dyn InspirationRepository>,
        rating_repo: Arc<dyn RatingRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        hashtags: Arc<HashtagService>,
    ) -> Self {
        Self {
            project_repo,
            user_repo,
            inspiration_repo,
            rating_repo,
            comment_repo,
            hashtags,
        }
    }

    /// Submit a project owned by `user_id` and return its page.
    ///
    /// Every hashtag name is validated before anything is written.
    pub async fn create(
        &self,
        user_id: i64,
        mut input: CreateProjectInput,
    ) -> Result<ProjectDetail, ProjectServiceError> {
        input.name = validate_project_name(&input.name)?.to_string();
        input.source_code_url = input.source_code_url.trim().to_string();
        if !input.source_code_url.validate_url() {
            return Err(ProjectServiceError::ValidationError(
                "sourceCodeUrl must be a valid URL".to_string(),
            ));
        }
        input.live_demo_url = input
            .live_demo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &input.live_demo_url {
            if !url.validate_url() {
                return Err(ProjectServiceError::ValidationError(
                    "liveDemoUrl must be a valid URL".to_string(),
                ));
            }
        }

        let names = normalize_hashtag_names(input.hashtags.as_slice());
        for name in &names {
            validate_hashtag_name(name)?;
        }

        if let Some(inspiration_id) = input.inspiration_id {
            self.inspiration_repo
                .get_by_id(inspiration_id)
                .await
                .context("Failed to get inspiration")?
                .ok_or_else(|| {
                    ProjectServiceError::NotFound(format!("Inspiration {}", inspiration_id))
                })?;
        }

        let project = self
            .project_repo
            .create(user_id, &input, &names)
            .await
            .context("Failed to create project")?;

        tracing::info!(project_id = project.id, user_id, "Project submitted");
        self.detail(project.id, Some(user_id)).await
    }

    /// Project page as seen by `viewer`
    pub async fn detail(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<ProjectDetail, ProjectServiceError> {
        let project = self.get(id).await?;

        let owner = self
            .user_repo
            .get_by_id(project.user_id)
            .await
            .context("Failed to get project owner")?
            .ok_or_else(|| anyhow!("Owner {} of project {} is missing", project.user_id, id))?;

        let inspired = match project.inspiration_id {
            Some(inspiration_id) => self
                .inspiration_repo
                .get_by_id(inspiration_id)
                .await
                .context("Failed to get inspiration")?
                .map(|i| InspirationRef {
                    id: i.id,
                    name: i.name,
                }),
            None => None,
        };

        let user_rate = match viewer {
            Some(viewer) => self
                .rating_repo
                .get_for_user(id, viewer)
                .await
                .context("Failed to get viewer rating")?
                .map(|r| r.value),
            None => None,
        };

        let hashtags = self.hashtags.list_for_project(id).await?;
        let total_rating_count = self
            .rating_repo
            .count_for_project(id)
            .await
            .context("Failed to count ratings")?;
        let comment_count = self
            .comment_repo
            .count_for_project(id)
            .await
            .context("Failed to count comments")?;

        Ok(ProjectDetail {
            project,
            user: owner.profile(),
            inspired,
            hashtags,
            user_rate,
            total_rating_count,
            comment_count,
        })
    }

    /// Get a project or fail with `NotFound`
    pub async fn get(&self, id: i64) -> Result<Project, ProjectServiceError> {
        self.project_repo
            .get_by_id(id)
            .await
            .context("Failed to get project")?
            .ok_or_else(|| ProjectServiceError::NotFound(format!("Project {}", id)))
    }

    /// Owner edit of name and description
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        mut input: UpdateProjectInput,
    ) -> Result<Project, ProjectServiceError> {
        let project = self.get(id).await?;
        ensure_owner(&project, user_id)?;

        if let Some(name) = &input.name {
            input.name = Some(validate_project_name(name)?.to_string());
        }

        self.project_repo
            .update(id, &input)
            .await
            .context("Failed to update project")?
            .ok_or_else(|| ProjectServiceError::NotFound(format!("Project {}", id)))
    }

    /// Owner-only delete; ratings, comments and hashtag links go with it
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), ProjectServiceError> {
        let project = self.get(id).await?;
        ensure_owner(&project, user_id)?;

        if !self
            .project_repo
            .delete(id)
            .await
            .context("Failed to delete project")?
        {
            return Err(ProjectServiceError::NotFound(format!("Project {}", id)));
        }

        tracing::info!(project_id = id, user_id, "Project deleted");
        Ok(())
    }

    pub async fn list_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ProjectSummary>, ProjectServiceError> {
        self.project_repo
            .list_by_user(user_id)
            .await
            .context("Failed to list user projects")
            .map_err(Into::into)
    }

    /// Best-rated projects
    pub async fn popular(&self) -> Result<Vec<ProjectSummary>, ProjectServiceError> {
        self.project_repo
            .popular(POPULAR_LIMIT)
            .await
            .context("Failed to list popular projects")
            .map_err(Into::into)
    }

    /// Suggestions for a search box, using the feed's filter.
    ///
    /// `take` follows the feed's page size rules.
    pub async fn search_options(
        &self,
        term: &str,
        take: Option<&str>,
    ) -> Result<Vec<ProjectSearchOption>, ProjectServiceError> {
        let take = take
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_take)
            .transpose()
            .map_err(ProjectServiceError::ValidationError)?;
        let take = clamp_take(take, DEFAULT_SEARCH_OPTIONS_TAKE);
        self.project_repo
            .search_options(&SearchQuery::parse(term), take)
            .await
            .context("Failed to search projects")
            .map_err(Into::into)
    }
}

fn validate_project_name(raw: &str) -> Result<&str, ProjectServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ProjectServiceError::ValidationError(
            "Project name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(ProjectServiceError::ValidationError(format!(
            "Project name cannot exceed {} characters",
            MAX_PROJECT_NAME_LENGTH
        )));
    }
    Ok(name)
}

fn ensure_owner(project: &Project, user_id: i64) -> Result<(), ProjectServiceError> {
    if project.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(ProjectServiceError::Forbidden(
            "Only the owner can change this project".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::repositories::{
        fixtures, SqlxCommentRepository, SqlxHashtagRepository, SqlxInspirationRepository,
        SqlxProjectRepository, SqlxRatingRepository, SqlxUserRepository,
    };
    use crate::db::DynDatabasePool;

    pub(crate) fn project_service(pool: &DynDatabasePool) -> ProjectService {
        ProjectService::new(
            SqlxProjectRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxInspirationRepository::boxed(pool.clone()),
            SqlxRatingRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            Arc::new(HashtagService::new(SqlxHashtagRepository::boxed(pool.clone()))),
        )
    }

    async fn hashtag_rows(pool: &DynDatabasePool, name: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM hashtags WHERE name = ?")
            .bind(name)
            .fetch_one(pool.sqlite().unwrap())
            .await
            .unwrap()
    }

    fn input(name: &str) -> CreateProjectInput {
        CreateProjectInput::new(name, "https://github.com/dev/project")
    }

    #[tokio::test]
    async fn test_create_returns_detail() {
        let pool = fixtures::migrated_pool().await;
        let user_id = fixtures::user(&pool, "dev").await;
        let service = project_service(&pool);

        let mut request = input("  Pixel editor ").with_hashtags(["#art", " rust", "art", ""]);
        request.live_demo_url = Some(String::new());
        let detail = service.create(user_id, request).await.expect("Failed to create");

        assert_eq!(detail.project.name, "Pixel editor");
        assert_eq!(detail.project.live_demo_url, None);
        assert_eq!(detail.user.name, "dev");
        let names: Vec<&str> = detail.hashtags.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["art", "rust"]);
        assert_eq!(detail.user_rate, None);
        assert_eq!(detail.total_rating_count, 0);
        assert_eq!(detail.comment_count, 0);
    }

    #[tokio::test]
    async fn test_hashtag_get_or_create_across_submissions() {
        let pool = fixtures::migrated_pool().await;
        let user_id = fixtures::user(&pool, "dev").await;
        let service = project_service(&pool);

        let first = service
            .create(user_id, input("one").with_hashtags(["x"]))
            .await
            .unwrap();
        assert_eq!(hashtag_rows(&pool, "x").await, 1);

        let second = service
            .create(user_id, input("two").with_hashtags(["x"]))
            .await
            .unwrap();
        assert_eq!(hashtag_rows(&pool, "x").await, 1);
        assert_eq!(first.hashtags, second.hashtags);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = fixtures::migrated_pool().await;
        let user_id = fixtures::user(&pool, "dev").await;
        let service = project_service(&pool);

        let cases = vec![
            input("   "),
            input(&"n".repeat(256)),
            CreateProjectInput::new("ok", "not a url"),
            {
                let mut i = input("ok");
                i.live_demo_url = Some("nope".to_string());
                i
            },
            input("ok").with_hashtags(["y".repeat(101)]),
            input("ok").with_hashtags(["game dev"]),
        ];
        for case in cases {
            assert!(matches!(
                service.create(user_id, case).await,
                Err(ProjectServiceError::ValidationError(_))
            ));
        }

        let mut missing_inspiration = input("ok");
        missing_inspiration.inspiration_id = Some(77);
        assert!(matches!(
            service.create(user_id, missing_inspiration).await,
            Err(ProjectServiceError::NotFound(_))
        ));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(pool.sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_detail_includes_inspiration_and_viewer_rating() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let viewer = fixtures::user(&pool, "viewer").await;
        let inspiration_id = fixtures::inspiration(&pool, owner, "Idea").await;
        let service = project_service(&pool);

        let mut request = input("Impl");
        request.inspiration_id = Some(inspiration_id);
        let created = service.create(owner, request).await.unwrap();
        assert_eq!(
            created.inspired,
            Some(InspirationRef {
                id: inspiration_id,
                name: "Idea".to_string()
            })
        );

        SqlxRatingRepository::new(pool.clone())
            .rate(created.project.id, viewer, 4)
            .await
            .unwrap();
        fixtures::comment(&pool, created.project.id, viewer, "cool").await;

        let as_viewer = service.detail(created.project.id, Some(viewer)).await.unwrap();
        assert_eq!(as_viewer.user_rate, Some(4));
        assert_eq!(as_viewer.total_rating_count, 1);
        assert_eq!(as_viewer.comment_count, 1);
        assert_eq!(as_viewer.project.average_rating, Some(4.0));

        let anonymous = service.detail(created.project.id, None).await.unwrap();
        assert_eq!(anonymous.user_rate, None);

        assert!(matches!(
            service.detail(created.project.id + 1, None).await,
            Err(ProjectServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_can_update_or_delete() {
        let pool = fixtures::migrated_pool().await;
        let owner = fixtures::user(&pool, "owner").await;
        let stranger = fixtures::user(&pool, "stranger").await;
        let service = project_service(&pool);
        let id = service.create(owner, input("Mine")).await.unwrap().project.id;

        let edit = UpdateProjectInput {
            name: Some("Theirs".to_string()),
            description: None,
        };
        assert!(matches!(
            service.update(stranger, id, edit.clone()).await,
            Err(ProjectServiceError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(stranger, id).await,
            Err(ProjectServiceError::Forbidden(_))
        ));

        let updated = service.update(owner, id, edit).await.unwrap();
        assert_eq!(updated.name, "Theirs");

        service.delete(owner, id).await.unwrap();
        assert!(matches!(
            service.delete(owner, id).await,
            Err(ProjectServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_options_clamps_take() {
        let pool = fixtures::migrated_pool().await;
        let user_id = fixtures::user(&pool, "dev").await;
        for i in 0..7 {
            fixtures::project(&pool, user_id, &format!("game {}", i)).await;
        }
        let service = project_service(&pool);

        assert_eq!(service.search_options("game", None).await.unwrap().len(), 5);
        assert_eq!(service.search_options("game", Some("0")).await.unwrap().len(), 1);
        assert_eq!(service.search_options("GAME", Some("50")).await.unwrap().len(), 7);
        assert_eq!(
            service
                .search_options("game", Some("99999999999999999999"))
                .await
                .unwrap()
                .len(),
            7
        );
        assert!(service.search_options("chess", None).await.unwrap().is_empty());
        assert!(matches!(
            service.search_options("game", Some("five")).await,
            Err(ProjectServiceError::ValidationError(_))
        ));
    }
}
