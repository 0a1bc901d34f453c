use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{require_field, AppError};
use crate::extract::{Json, Query};
use crate::models::parse_object_id;
use crate::models::portfolio::{PortfolioProject, ProjectView};
use crate::pagination::{Page, PageParams};
use crate::portfolio::analysis::{analyze_project, find_similar};
use crate::portfolio::store::{self, ProjectFilters};
use crate::similarity::round_score;
use crate::state::AppState;

/// Shortest accepted project description, in characters after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 50;
const DEFAULT_SIMILAR_TOP_K: usize = 3;
const MAX_SIMILAR_TOP_K: usize = 20;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub app_store_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Project description must be at least {MIN_DESCRIPTION_CHARS} characters long"
        )));
    }
    Ok(())
}

/// POST /proposals/api/portfolio/create
pub async fn handle_create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let name = require_field(req.name, "name")?;
    let description = require_field(req.description, "description")?;
    let user_id = require_field(req.user_id, "user_id")?;
    validate_description(&description)?;

    let analysis = analyze_project(state.llm.as_ref(), &name, &description).await?;

    let now = Utc::now();
    let mut project = PortfolioProject {
        id: None,
        name,
        description,
        user_id,
        tags: Vec::new(),
        technologies: Vec::new(),
        project_type: Default::default(),
        complexity_level: Default::default(),
        ai_summary: String::new(),
        embedding_vector: Vec::new(),
        github_url: req.github_url,
        live_url: req.live_url,
        app_store_url: req.app_store_url,
        images: req.images,
        is_featured: req.is_featured,
        created_at: now,
        updated_at: now,
    };
    analysis.apply_to(&mut project);

    let id = store::create(&state.db, &project).await?;
    project.id = Some(id);

    Ok((StatusCode::CREATED, Json(ProjectView::from(project))))
}

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub project_type: Option<String>,
    pub is_featured: Option<String>,
}

/// GET /proposals/api/portfolio/user/:user_id
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<Page<ProjectView>>, AppError> {
    let (page, page_size) = PageParams {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve()?;

    let filters = ProjectFilters {
        project_type: query.project_type.filter(|t| !t.is_empty()),
        is_featured: query
            .is_featured
            .map(|v| v.eq_ignore_ascii_case("true")),
    };

    let (projects, pagination) =
        store::list_for_user(&state.db, &user_id, &filters, page, page_size).await?;
    Ok(Json(
        Page::new(projects, pagination).map(ProjectView::for_list),
    ))
}

async fn load_project(state: &AppState, project_id: &str) -> Result<PortfolioProject, AppError> {
    let id = parse_object_id(project_id, "Project")?;
    store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

/// GET /proposals/api/portfolio/detail/:project_id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectView>, AppError> {
    let project = load_project(&state, &project_id).await?;
    Ok(Json(ProjectView::from(project)))
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub app_store_url: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

impl UpdateProjectRequest {
    /// Applies the changes and reports whether the description changed.
    fn apply_to(self, project: &mut PortfolioProject) -> bool {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(url) = self.github_url {
            project.github_url = Some(url);
        }
        if let Some(url) = self.live_url {
            project.live_url = Some(url);
        }
        if let Some(url) = self.app_store_url {
            project.app_store_url = Some(url);
        }
        if let Some(images) = self.images {
            project.images = images;
        }
        if let Some(is_featured) = self.is_featured {
            project.is_featured = is_featured;
        }
        match self.description {
            Some(description) if description != project.description => {
                project.description = description;
                true
            }
            _ => false,
        }
    }
}

/// PUT /proposals/api/portfolio/detail/:project_id
/// Re-runs AI analysis when the description changes.
pub async fn handle_update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectView>, AppError> {
    let mut project = load_project(&state, &project_id).await?;
    let id = project
        .id
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if req.apply_to(&mut project) {
        validate_description(&project.description)?;
        info!("Description changed, re-analyzing project {}", id);
        let analysis =
            analyze_project(state.llm.as_ref(), &project.name, &project.description).await?;
        analysis.apply_to(&mut project);
    }

    project.updated_at = Utc::now();
    if !store::update(&state.db, id, &project).await? {
        return Err(AppError::NotFound("Project not found".to_string()));
    }
    Ok(Json(ProjectView::from(project)))
}

/// DELETE /proposals/api/portfolio/detail/:project_id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_object_id(&project_id, "Project")?;
    if !store::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Project not found".to_string()));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Project deleted successfully"
    })))
}

#[derive(Debug, Deserialize)]
pub struct SimilarProjectsRequest {
    pub job_description: Option<String>,
    pub user_id: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SimilarProject {
    #[serde(flatten)]
    pub project: ProjectView,
    pub similarity_score: f64,
}

#[derive(Debug, Serialize)]
pub struct SimilarProjectsResponse {
    pub similar_projects: Vec<SimilarProject>,
    pub total_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// POST /proposals/api/portfolio/similar
pub async fn handle_similar_projects(
    State(state): State<AppState>,
    Json(req): Json<SimilarProjectsRequest>,
) -> Result<Json<SimilarProjectsResponse>, AppError> {
    let job_description = require_field(req.job_description, "job_description")?;
    let user_id = require_field(req.user_id, "user_id")?;
    let top_k = req.top_k.unwrap_or(DEFAULT_SIMILAR_TOP_K);
    if top_k == 0 || top_k > MAX_SIMILAR_TOP_K {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_SIMILAR_TOP_K}"
        )));
    }

    let projects = store::with_embeddings(&state.db, &user_id).await?;
    if projects.is_empty() {
        return Ok(Json(SimilarProjectsResponse {
            similar_projects: Vec::new(),
            total_found: 0,
            message: Some("No portfolio projects found with embeddings"),
        }));
    }

    let ranked = find_similar(state.llm.as_ref(), &job_description, projects, top_k).await?;
    let similar_projects: Vec<SimilarProject> = ranked
        .into_iter()
        .map(|s| SimilarProject {
            similarity_score: round_score(s.score, 4),
            project: ProjectView::from(s.item),
        })
        .collect();

    Ok(Json(SimilarProjectsResponse {
        total_found: similar_projects.len(),
        similar_projects,
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::portfolio::{ComplexityLevel, ProjectType};

    fn stored_project() -> PortfolioProject {
        let now = Utc::now();
        PortfolioProject {
            id: None,
            name: "Burger Lab".to_string(),
            description: "Food ordering app".to_string(),
            user_id: "u1".to_string(),
            tags: vec!["food".to_string()],
            technologies: vec![],
            project_type: ProjectType::MobileApp,
            complexity_level: ComplexityLevel::Advanced,
            ai_summary: "summary".to_string(),
            embedding_vector: vec![1.0],
            github_url: None,
            live_url: None,
            app_store_url: None,
            images: vec![],
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_short_description_is_rejected() {
        assert!(validate_description("too short").is_err());
        assert!(validate_description(&"x".repeat(MIN_DESCRIPTION_CHARS)).is_ok());
        let padded = format!("   {}   ", "x".repeat(MIN_DESCRIPTION_CHARS - 1));
        assert!(validate_description(&padded).is_err());
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let mut project = stored_project();
        let changed = UpdateProjectRequest {
            is_featured: Some(true),
            live_url: Some("https://burgerlab.example".to_string()),
            ..Default::default()
        }
        .apply_to(&mut project);

        assert!(!changed);
        assert!(project.is_featured);
        assert_eq!(project.live_url.as_deref(), Some("https://burgerlab.example"));
        assert_eq!(project.name, "Burger Lab");
        assert_eq!(project.tags, vec!["food"]);
    }

    #[test]
    fn test_update_reports_description_change() {
        let mut project = stored_project();
        let same = UpdateProjectRequest {
            description: Some("Food ordering app".to_string()),
            ..Default::default()
        }
        .apply_to(&mut project);
        assert!(!same);

        let changed = UpdateProjectRequest {
            description: Some("A rewritten description".to_string()),
            ..Default::default()
        }
        .apply_to(&mut project);
        assert!(changed);
        assert_eq!(project.description, "A rewritten description");
    }
}
