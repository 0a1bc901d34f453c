use chrono::Utc;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::options::FindOneOptions;

use crate::db::{self, Db};
use crate::errors::AppError;
use crate::models::tracking::{ProposalTracking, TrackingStats};
use crate::pagination::Pagination;

pub async fn save(db: &Db, tracking: &ProposalTracking) -> Result<ObjectId, AppError> {
    let result = db.proposal_tracking().insert_one(tracking, None).await?;
    let id = result.inserted_id.as_object_id().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("tracking insert returned a non-ObjectId _id"))
    })?;
    tracing::info!(%id, proposal_id = %tracking.proposal_id, "Saved proposal tracking");
    Ok(id)
}

pub async fn list_for_user(
    db: &Db,
    user_id: &str,
    page: u64,
    page_size: u64,
) -> Result<(Vec<ProposalTracking>, Pagination), AppError> {
    db::find_page(
        &db.proposal_tracking(),
        doc! { "user_id": user_id },
        page,
        page_size,
    )
    .await
}

pub async fn get(db: &Db, id: ObjectId) -> Result<Option<ProposalTracking>, AppError> {
    Ok(db.proposal_tracking().find_one(doc! { "_id": id }, None).await?)
}

/// Most recent tracking record for a proposal.
pub async fn get_by_proposal(
    db: &Db,
    proposal_id: &str,
) -> Result<Option<ProposalTracking>, AppError> {
    Ok(db
        .proposal_tracking()
        .find_one(
            doc! { "proposal_id": proposal_id },
            FindOneOptions::builder()
                .sort(doc! { "created_at": -1 })
                .build(),
        )
        .await?)
}

/// Sets whichever flags are given. Returns false when no record has this id.
pub async fn update_status(
    db: &Db,
    id: ObjectId,
    is_viewed: Option<bool>,
    is_hired: Option<bool>,
) -> Result<bool, AppError> {
    let mut fields = doc! { "updated_at": bson::DateTime::from_chrono(Utc::now()) };
    if let Some(is_viewed) = is_viewed {
        fields.insert("is_viewed", is_viewed);
    }
    if let Some(is_hired) = is_hired {
        fields.insert("is_hired", is_hired);
    }
    let result = db
        .proposal_tracking()
        .update_one(doc! { "_id": id }, doc! { "$set": fields }, None)
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete(db: &Db, id: ObjectId) -> Result<bool, AppError> {
    let result = db
        .proposal_tracking()
        .delete_one(doc! { "_id": id }, None)
        .await?;
    Ok(result.deleted_count > 0)
}

pub async fn stats(db: &Db, user_id: &str) -> Result<TrackingStats, AppError> {
    let tracking = db.proposal_tracking();
    let total = tracking
        .count_documents(doc! { "user_id": user_id }, None)
        .await?;
    let viewed = tracking
        .count_documents(doc! { "user_id": user_id, "is_viewed": true }, None)
        .await?;
    let hired = tracking
        .count_documents(doc! { "user_id": user_id, "is_hired": true }, None)
        .await?;

    let stats = TrackingStats::new(total, viewed, hired);
    tracing::debug!(user_id, ?stats, "Computed tracking stats");
    Ok(stats)
}
