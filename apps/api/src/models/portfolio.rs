use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::truncate_chars;

/// Longest description shown in portfolio list views.
pub const LIST_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    WebApp,
    MobileApp,
    Api,
    DesktopApp,
    Game,
    AiMl,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Beginner,
    Advanced,
    Expert,
    // Catch-all for unknown levels, must stay last
    #[default]
    #[serde(other)]
    Intermediate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioProject {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    pub user_id: String,

    // AI-derived, recomputed when the description changes
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub complexity_level: ComplexityLevel,
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub embedding_vector: Vec<f32>,

    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub app_store_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// JSON shape of a portfolio project. The embedding is never returned.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub user_id: String,
    pub tags: Vec<String>,
    pub technologies: Vec<String>,
    pub project_type: ProjectType,
    pub complexity_level: ComplexityLevel,
    pub ai_summary: String,
    pub has_embedding: bool,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub app_store_url: Option<String>,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PortfolioProject> for ProjectView {
    fn from(p: PortfolioProject) -> Self {
        Self {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            has_embedding: !p.embedding_vector.is_empty(),
            name: p.name,
            description: p.description,
            user_id: p.user_id,
            tags: p.tags,
            technologies: p.technologies,
            project_type: p.project_type,
            complexity_level: p.complexity_level,
            ai_summary: p.ai_summary,
            github_url: p.github_url,
            live_url: p.live_url,
            app_store_url: p.app_store_url,
            images: p.images,
            is_featured: p.is_featured,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl ProjectView {
    pub fn for_list(project: PortfolioProject) -> Self {
        let mut view = Self::from(project);
        view.description = truncate_chars(&view.description, LIST_DESCRIPTION_CHARS);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_project_type_falls_back_to_other() {
        let t: ProjectType = serde_json::from_str("\"blockchain\"").unwrap();
        assert_eq!(t, ProjectType::Other);
        let t: ProjectType = serde_json::from_str("\"ai_ml\"").unwrap();
        assert_eq!(t, ProjectType::AiMl);
    }

    #[test]
    fn test_unknown_complexity_falls_back_to_intermediate() {
        let c: ComplexityLevel = serde_json::from_str("\"galaxy-brain\"").unwrap();
        assert_eq!(c, ComplexityLevel::Intermediate);
        let c: ComplexityLevel = serde_json::from_str("\"expert\"").unwrap();
        assert_eq!(c, ComplexityLevel::Expert);
        let c: ComplexityLevel = serde_json::from_str("\"intermediate\"").unwrap();
        assert_eq!(c, ComplexityLevel::Intermediate);
        assert_eq!(
            serde_json::to_string(&ComplexityLevel::Intermediate).unwrap(),
            "\"intermediate\""
        );
    }
}
