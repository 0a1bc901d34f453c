use chrono::{Duration, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document as BsonDocument};
use mongodb::options::FindOneOptions;

use crate::db::{self, Db};
use crate::errors::AppError;
use crate::models::proposal::{JobProposal, ProposalStats};
use crate::pagination::Pagination;

/// Window counted as "recent" in proposal statistics.
const RECENT_DAYS: i64 = 30;

pub async fn create(db: &Db, proposal: &JobProposal) -> Result<ObjectId, AppError> {
    let result = db.job_proposals().insert_one(proposal, None).await?;
    let id = result.inserted_id.as_object_id().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("proposal insert returned a non-ObjectId _id"))
    })?;
    tracing::info!(%id, user_id = %proposal.user_id, "Saved proposal");
    Ok(id)
}

pub async fn list_for_user(
    db: &Db,
    user_id: &str,
    page: u64,
    page_size: u64,
) -> Result<(Vec<JobProposal>, Pagination), AppError> {
    db::find_page(&db.job_proposals(), doc! { "user_id": user_id }, page, page_size).await
}

pub async fn get(db: &Db, id: ObjectId) -> Result<Option<JobProposal>, AppError> {
    Ok(db.job_proposals().find_one(doc! { "_id": id }, None).await?)
}

/// `$set`-merges `fields` and refreshes `updated_at`. Returns false when no
/// proposal has this id.
pub async fn update(db: &Db, id: ObjectId, mut fields: BsonDocument) -> Result<bool, AppError> {
    fields.insert("updated_at", bson::DateTime::from_chrono(Utc::now()));
    let result = db
        .job_proposals()
        .update_one(doc! { "_id": id }, doc! { "$set": fields }, None)
        .await?;
    Ok(result.matched_count > 0)
}

pub async fn delete(db: &Db, id: ObjectId) -> Result<bool, AppError> {
    let result = db
        .job_proposals()
        .delete_one(doc! { "_id": id }, None)
        .await?;
    Ok(result.deleted_count > 0)
}

/// Case-insensitive substring search over title, description and proposal text.
pub async fn search(db: &Db, user_id: &str, query: &str) -> Result<Vec<JobProposal>, AppError> {
    db::find_all(&db.job_proposals(), search_filter(user_id, query)).await
}

fn search_filter(user_id: &str, query: &str) -> BsonDocument {
    let pattern = regex::escape(query);
    doc! {
        "user_id": user_id,
        "$or": [
            { "job_title": { "$regex": pattern.as_str(), "$options": "i" } },
            { "job_description": { "$regex": pattern.as_str(), "$options": "i" } },
            { "generated_proposal": { "$regex": pattern.as_str(), "$options": "i" } },
        ]
    }
}

pub async fn stats(db: &Db, user_id: &str) -> Result<ProposalStats, AppError> {
    let proposals = db.job_proposals();

    let total_proposals = proposals
        .count_documents(doc! { "user_id": user_id }, None)
        .await?;

    let cutoff = Utc::now() - Duration::days(RECENT_DAYS);
    let recent_proposals_30_days = proposals
        .count_documents(
            doc! {
                "user_id": user_id,
                "created_at": { "$gte": bson::DateTime::from_chrono(cutoff) }
            },
            None,
        )
        .await?;

    let latest = proposals
        .find_one(
            doc! { "user_id": user_id },
            FindOneOptions::builder()
                .sort(doc! { "created_at": -1 })
                .build(),
        )
        .await?;

    Ok(ProposalStats {
        total_proposals,
        recent_proposals_30_days,
        latest_proposal_date: latest.map(|p| p.created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filter_escapes_regex_metacharacters() {
        let filter = search_filter("u1", "c++ (senior)");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);

        let title = clauses[0].as_document().unwrap().get_document("job_title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"c\+\+ \(senior\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
        assert_eq!(filter.get_str("user_id").unwrap(), "u1");
    }
}
