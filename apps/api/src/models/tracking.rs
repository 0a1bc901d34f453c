use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Outcome tracking for a submitted proposal. `proposal_id` is not checked
/// against `job_proposals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalTracking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub proposal_id: String,
    pub user_id: String,
    pub proposal_link: Option<String>,
    pub connected: Option<String>,
    pub posted_ago: Option<String>,
    #[serde(default)]
    pub is_viewed: bool,
    #[serde(default)]
    pub is_hired: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub id: String,
    pub proposal_id: String,
    pub user_id: String,
    pub proposal_link: Option<String>,
    pub connected: Option<String>,
    pub posted_ago: Option<String>,
    pub is_viewed: bool,
    pub is_hired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProposalTracking> for TrackingView {
    fn from(t: ProposalTracking) -> Self {
        Self {
            id: t.id.map(|id| id.to_hex()).unwrap_or_default(),
            proposal_id: t.proposal_id,
            user_id: t.user_id,
            proposal_link: t.proposal_link,
            connected: t.connected,
            posted_ago: t.posted_ago,
            is_viewed: t.is_viewed,
            is_hired: t.is_hired,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingStats {
    pub total_tracked: u64,
    pub viewed_count: u64,
    pub hired_count: u64,
    /// Percent of tracked proposals viewed, one decimal.
    pub view_rate: f64,
    pub hire_rate: f64,
}

impl TrackingStats {
    pub fn new(total_tracked: u64, viewed_count: u64, hired_count: u64) -> Self {
        Self {
            total_tracked,
            viewed_count,
            hired_count,
            view_rate: percent(viewed_count, total_tracked),
            hire_rate: percent(hired_count, total_tracked),
        }
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}
