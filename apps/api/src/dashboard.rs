use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::proposal::ProposalStats;
use crate::models::tracking::TrackingStats;
use crate::portfolio::store as portfolio_store;
use crate::proposals::store as proposal_store;
use crate::state::AppState;
use crate::tracking::store as tracking_store;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub user_id: String,
    pub proposals: ProposalStats,
    pub tracking: TrackingStats,
    pub portfolio_projects: u64,
}

/// GET /proposals/api/dashboard/stats/:user_id
pub async fn handle_dashboard_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardStats>, AppError> {
    let (proposals, tracking, portfolio_projects) = tokio::try_join!(
        proposal_store::stats(&state.db, &user_id),
        tracking_store::stats(&state.db, &user_id),
        portfolio_store::count_for_user(&state.db, &user_id),
    )?;

    Ok(Json(DashboardStats {
        user_id,
        proposals,
        tracking,
        portfolio_projects,
    }))
}
