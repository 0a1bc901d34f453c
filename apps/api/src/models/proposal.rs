use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::truncate_chars;

/// Longest job description shown in proposal list views.
pub const LIST_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProposal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub job_description: String,
    pub generated_proposal: String,
    pub user_id: String,
    pub job_title: Option<String>,
    pub budget_range: Option<String>,
    pub project_duration: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Title, budget and duration lines pulled out of a job description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobMetadata {
    pub job_title: Option<String>,
    pub budget_range: Option<String>,
    pub project_duration: Option<String>,
}

impl JobProposal {
    pub fn new(
        user_id: String,
        job_description: String,
        generated_proposal: String,
        metadata: JobMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            job_description,
            generated_proposal,
            user_id,
            job_title: metadata.job_title,
            budget_range: metadata.budget_range,
            project_duration: metadata.project_duration,
            created_at: now,
            updated_at: now,
        }
    }
}

/// JSON shape of a proposal.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub id: String,
    pub job_title: Option<String>,
    pub job_description: String,
    pub generated_proposal: String,
    pub budget_range: Option<String>,
    pub project_duration: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobProposal> for ProposalView {
    fn from(p: JobProposal) -> Self {
        Self {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            job_title: p.job_title,
            job_description: p.job_description,
            generated_proposal: p.generated_proposal,
            budget_range: p.budget_range,
            project_duration: p.project_duration,
            user_id: p.user_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl ProposalView {
    /// List views carry a shortened job description.
    pub fn for_list(proposal: JobProposal) -> Self {
        let mut view = Self::from(proposal);
        view.job_description = truncate_chars(&view.job_description, LIST_DESCRIPTION_CHARS);
        view
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalStats {
    pub total_proposals: u64,
    pub recent_proposals_30_days: u64,
    pub latest_proposal_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_view_truncates_long_descriptions() {
        let mut proposal = JobProposal::new(
            "u1".to_string(),
            "x".repeat(250),
            "proposal".to_string(),
            JobMetadata::default(),
        );
        proposal.id = Some(ObjectId::new());

        let view = ProposalView::for_list(proposal);
        assert_eq!(view.job_description.chars().count(), 203);
        assert!(view.job_description.ends_with("..."));
        assert_eq!(view.id.len(), 24);
    }
}
