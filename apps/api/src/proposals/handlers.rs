use axum::extract::{Path, State};
use mongodb::bson::{doc, Document as BsonDocument};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{require_field, AppError};
use crate::extract::{Json, Query};
use crate::models::parse_object_id;
use crate::models::portfolio::PortfolioProject;
use crate::models::proposal::{JobProposal, ProposalStats, ProposalView};
use crate::pagination::{Page, PageParams};
use crate::portfolio::analysis::find_similar;
use crate::portfolio::store as portfolio_store;
use crate::proposals::generator::{
    extract_job_metadata, generate_custom, generate_with_portfolio, CustomProposal,
    ExternalLinks, ProjectRef,
};
use crate::proposals::store;
use crate::similarity::{round_score, Scored};
use crate::state::AppState;

/// Shortest accepted job description, in characters after trimming.
pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
/// Portfolio projects considered per generated proposal.
const PORTFOLIO_TOP_K: usize = 2;
/// Minimum similarity for a project to be cited.
const PORTFOLIO_MIN_SCORE: f32 = 0.6;

fn validate_job_description(job_description: Option<String>) -> Result<String, AppError> {
    let job_description = require_field(job_description, "job_description")?;
    if job_description.trim().chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters long"
        )));
    }
    Ok(job_description)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub job_description: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IncludedProject {
    pub name: String,
    pub similarity_score: f64,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub app_store_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub proposal_id: String,
    pub generated_proposal: String,
    pub relevant_projects_found: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_projects: Vec<IncludedProject>,
}

/// POST /proposals/api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let job_description = validate_job_description(req.job_description)?;
    let user_id = require_field(req.user_id, "user_id")?;

    // Portfolio lookup is best-effort: a failure only drops the citations
    let relevant = match relevant_projects(&state, &user_id, &job_description).await {
        Ok(projects) => projects,
        Err(e) => {
            warn!("Portfolio search failed for user {}: {}", user_id, e);
            Vec::new()
        }
    };
    info!(
        "Found {} relevant projects for user {}",
        relevant.len(),
        user_id
    );

    let refs: Vec<ProjectRef> = relevant.iter().map(|s| ProjectRef::from(&s.item)).collect();
    let generated_proposal = generate_with_portfolio(
        state.llm.as_ref(),
        &state.config.profile,
        &job_description,
        &refs,
    )
    .await?;

    let proposal_id = save_proposal(&state, user_id, job_description, &generated_proposal).await?;

    Ok(Json(GenerateResponse {
        proposal_id,
        generated_proposal,
        relevant_projects_found: relevant.len(),
        included_projects: relevant
            .into_iter()
            .map(|s| IncludedProject {
                similarity_score: round_score(s.score, 3),
                name: s.item.name,
                github_url: s.item.github_url,
                live_url: s.item.live_url,
                app_store_url: s.item.app_store_url,
            })
            .collect(),
    }))
}

async fn relevant_projects(
    state: &AppState,
    user_id: &str,
    job_description: &str,
) -> Result<Vec<Scored<PortfolioProject>>, AppError> {
    let projects = portfolio_store::with_embeddings(&state.db, user_id).await?;
    let ranked = find_similar(
        state.llm.as_ref(),
        job_description,
        projects,
        PORTFOLIO_TOP_K,
    )
    .await?;
    Ok(ranked
        .into_iter()
        .filter(|s| s.score > PORTFOLIO_MIN_SCORE)
        .collect())
}

async fn save_proposal(
    state: &AppState,
    user_id: String,
    job_description: String,
    generated_proposal: &str,
) -> Result<String, AppError> {
    let metadata = extract_job_metadata(&job_description);
    let proposal = JobProposal::new(
        user_id,
        job_description,
        generated_proposal.to_string(),
        metadata,
    );
    let id = store::create(&state.db, &proposal).await?;
    Ok(id.to_hex())
}

#[derive(Debug, Deserialize)]
pub struct GenerateCustomRequest {
    pub job_description: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub selected_projects: Vec<ProjectRef>,
    #[serde(default)]
    pub external_links: ExternalLinks,
}

#[derive(Debug, Serialize)]
pub struct GenerateCustomResponse {
    pub proposal_id: String,
    pub generated_proposal: String,
    pub selected_projects_count: usize,
    pub client_name: Option<String>,
    pub external_links: ExternalLinks,
}

/// POST /proposals/api/generate/custom
pub async fn handle_generate_custom(
    State(state): State<AppState>,
    Json(req): Json<GenerateCustomRequest>,
) -> Result<Json<GenerateCustomResponse>, AppError> {
    let job_description = validate_job_description(req.job_description)?;
    let user_id = require_field(req.user_id, "user_id")?;

    let custom = CustomProposal {
        client_name: req.client_name,
        selected_projects: req.selected_projects,
        external_links: req.external_links,
    };
    let generated_proposal = generate_custom(
        state.llm.as_ref(),
        &state.config.profile,
        &job_description,
        &custom,
    )
    .await?;

    let proposal_id = save_proposal(&state, user_id, job_description, &generated_proposal).await?;
    info!("Generated custom proposal {}", proposal_id);

    Ok(Json(GenerateCustomResponse {
        proposal_id,
        generated_proposal,
        selected_projects_count: custom.selected_projects.len(),
        client_name: custom.client_name,
        external_links: custom.external_links,
    }))
}

/// GET /proposals/api/user/:user_id
pub async fn handle_list_proposals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ProposalView>>, AppError> {
    let (page, page_size) = params.resolve()?;
    let (proposals, pagination) = store::list_for_user(&state.db, &user_id, page, page_size).await?;
    Ok(Json(
        Page::new(proposals, pagination).map(ProposalView::for_list),
    ))
}

/// GET /proposals/api/detail/:proposal_id
pub async fn handle_get_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<ProposalView>, AppError> {
    let id = parse_object_id(&proposal_id, "Proposal")?;
    let proposal = store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proposal not found".to_string()))?;
    Ok(Json(ProposalView::from(proposal)))
}

/// Editable proposal fields. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProposalRequest {
    pub job_title: Option<String>,
    pub budget_range: Option<String>,
    pub project_duration: Option<String>,
    pub generated_proposal: Option<String>,
}

impl UpdateProposalRequest {
    fn into_fields(self) -> BsonDocument {
        let mut fields = doc! {};
        for (key, value) in [
            ("job_title", self.job_title),
            ("budget_range", self.budget_range),
            ("project_duration", self.project_duration),
            ("generated_proposal", self.generated_proposal),
        ] {
            if let Some(value) = value {
                fields.insert(key, value);
            }
        }
        fields
    }
}

/// PATCH /proposals/api/detail/:proposal_id
pub async fn handle_update_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(req): Json<UpdateProposalRequest>,
) -> Result<Json<ProposalView>, AppError> {
    let id = parse_object_id(&proposal_id, "Proposal")?;
    let fields = req.into_fields();
    if fields.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    if !store::update(&state.db, id, fields).await? {
        return Err(AppError::NotFound("Proposal not found".to_string()));
    }
    let proposal = store::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proposal not found".to_string()))?;
    Ok(Json(ProposalView::from(proposal)))
}

#[derive(Debug, Deserialize)]
pub struct SearchProposalsRequest {
    pub user_id: Option<String>,
    pub search_query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchProposalsResponse {
    pub results: Vec<ProposalView>,
    pub count: usize,
    pub search_query: String,
}

/// POST /proposals/api/search
pub async fn handle_search_proposals(
    State(state): State<AppState>,
    Json(req): Json<SearchProposalsRequest>,
) -> Result<Json<SearchProposalsResponse>, AppError> {
    let (Some(user_id), Some(search_query)) = (
        req.user_id.filter(|u| !u.trim().is_empty()),
        req.search_query.filter(|q| !q.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(
            "user_id and search_query are required".to_string(),
        ));
    };

    let results: Vec<ProposalView> = store::search(&state.db, &user_id, &search_query)
        .await?
        .into_iter()
        .map(ProposalView::from)
        .collect();
    info!(
        "Found {} proposals matching search query for user {}",
        results.len(),
        user_id
    );

    Ok(Json(SearchProposalsResponse {
        count: results.len(),
        results,
        search_query,
    }))
}

/// GET /proposals/api/stats/:user_id
pub async fn handle_proposal_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProposalStats>, AppError> {
    Ok(Json(store::stats(&state.db, &user_id).await?))
}

/// DELETE /proposals/api/delete/:proposal_id
pub async fn handle_delete_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_object_id(&proposal_id, "Proposal")?;
    if !store::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Proposal not found".to_string()));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Proposal deleted successfully"
    })))
}
