//! AI analysis of portfolio projects.
//!
//! Three independent LLM calls per project: structured metadata, a description
//! embedding, and a short summary. Embedding and summary failures degrade to
//! fallbacks; an unparseable metadata reply degrades to defaults.

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::json_only;
use crate::llm_client::{complete_json, ChatRequest, LanguageModel, LlmError};
use crate::models::portfolio::{ComplexityLevel, PortfolioProject, ProjectType};
use crate::portfolio::prompts::{
    METADATA_INSTRUCTIONS, METADATA_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM,
};
use crate::similarity::{rank_top_k, Scored};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub complexity_level: ComplexityLevel,
}

#[derive(Debug, Clone)]
pub struct ProjectAnalysis {
    pub metadata: ProjectMetadata,
    pub ai_summary: String,
    pub embedding_vector: Vec<f32>,
}

impl ProjectAnalysis {
    pub fn apply_to(self, project: &mut PortfolioProject) {
        project.tags = self.metadata.tags;
        project.technologies = self.metadata.technologies;
        project.project_type = self.metadata.project_type;
        project.complexity_level = self.metadata.complexity_level;
        project.ai_summary = self.ai_summary;
        project.embedding_vector = self.embedding_vector;
    }
}

pub async fn analyze_project(
    llm: &dyn LanguageModel,
    name: &str,
    description: &str,
) -> Result<ProjectAnalysis, AppError> {
    info!("Starting AI analysis for project: {}", name);

    let (metadata, embedding_vector, ai_summary) = tokio::join!(
        extract_metadata(llm, name, description),
        generate_embedding(llm, description),
        generate_summary(llm, name, description),
    );

    Ok(ProjectAnalysis {
        metadata: metadata?,
        ai_summary,
        embedding_vector,
    })
}

async fn extract_metadata(
    llm: &dyn LanguageModel,
    name: &str,
    description: &str,
) -> Result<ProjectMetadata, LlmError> {
    let request = ChatRequest::new(
        json_only(METADATA_INSTRUCTIONS),
        fill_template(METADATA_PROMPT_TEMPLATE, name, description),
    )
    .max_tokens(300)
    .temperature(0.3);

    match complete_json::<ProjectMetadata>(llm, &request).await {
        Ok(metadata) => Ok(metadata),
        Err(LlmError::Parse(e)) => {
            warn!("Unparseable metadata for project {}: {}", name, e);
            Ok(ProjectMetadata::default())
        }
        Err(e) => Err(e),
    }
}

async fn generate_embedding(llm: &dyn LanguageModel, description: &str) -> Vec<f32> {
    match llm.embed(description).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!("Error generating project embedding: {}", e);
            Vec::new()
        }
    }
}

async fn generate_summary(llm: &dyn LanguageModel, name: &str, description: &str) -> String {
    let request = ChatRequest::new(
        SUMMARY_SYSTEM,
        fill_template(SUMMARY_PROMPT_TEMPLATE, name, description),
    )
    .max_tokens(150)
    .temperature(0.5);

    match llm.complete(&request).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Error generating summary for project {}: {}", name, e);
            fallback_summary(name)
        }
    }
}

fn fallback_summary(name: &str) -> String {
    format!("A {name} project with comprehensive functionality.")
}

fn fill_template(template: &str, name: &str, description: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{description}", description)
}

/// Ranks `projects` against the embedding of `job_description`.
pub async fn find_similar(
    llm: &dyn LanguageModel,
    job_description: &str,
    projects: Vec<PortfolioProject>,
    top_k: usize,
) -> Result<Vec<Scored<PortfolioProject>>, AppError> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }
    let job_embedding = llm.embed(job_description).await?;
    Ok(rank_top_k(
        &job_embedding,
        projects,
        |p| p.embedding_vector.as_slice(),
        top_k,
    ))
}
