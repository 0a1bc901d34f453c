use mongodb::bson::{self, doc, oid::ObjectId, Document as BsonDocument};

use crate::db::{self, Db};
use crate::errors::AppError;
use crate::models::portfolio::PortfolioProject;
use crate::pagination::Pagination;

/// Optional list filters from `?project_type=&is_featured=`.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilters {
    pub project_type: Option<String>,
    pub is_featured: Option<bool>,
}

impl ProjectFilters {
    fn to_filter(&self, user_id: &str) -> BsonDocument {
        let mut filter = doc! { "user_id": user_id };
        if let Some(project_type) = &self.project_type {
            filter.insert("project_type", project_type.as_str());
        }
        if let Some(is_featured) = self.is_featured {
            filter.insert("is_featured", is_featured);
        }
        filter
    }
}

pub async fn create(db: &Db, project: &PortfolioProject) -> Result<ObjectId, AppError> {
    let result = db.portfolio_projects().insert_one(project, None).await?;
    let id = result.inserted_id.as_object_id().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("portfolio insert returned a non-ObjectId _id"))
    })?;
    tracing::info!(%id, user_id = %project.user_id, "Created portfolio project");
    Ok(id)
}

pub async fn list_for_user(
    db: &Db,
    user_id: &str,
    filters: &ProjectFilters,
    page: u64,
    page_size: u64,
) -> Result<(Vec<PortfolioProject>, Pagination), AppError> {
    db::find_page(
        &db.portfolio_projects(),
        filters.to_filter(user_id),
        page,
        page_size,
    )
    .await
}

pub async fn get(db: &Db, id: ObjectId) -> Result<Option<PortfolioProject>, AppError> {
    Ok(db
        .portfolio_projects()
        .find_one(doc! { "_id": id }, None)
        .await?)
}

/// Merges every field of `project` into the stored record, including the
/// caller-set `updated_at`. Returns false when no record has this id.
pub async fn update(db: &Db, id: ObjectId, project: &PortfolioProject) -> Result<bool, AppError> {
    let fields = update_fields(project)?;
    let result = db
        .portfolio_projects()
        .update_one(doc! { "_id": id }, doc! { "$set": fields }, None)
        .await?;
    Ok(result.matched_count > 0)
}

fn update_fields(project: &PortfolioProject) -> Result<BsonDocument, AppError> {
    let mut fields = bson::to_document(project)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode project: {e}")))?;
    fields.remove("_id");
    fields.remove("created_at");
    Ok(fields)
}

pub async fn delete(db: &Db, id: ObjectId) -> Result<bool, AppError> {
    let result = db
        .portfolio_projects()
        .delete_one(doc! { "_id": id }, None)
        .await?;
    Ok(result.deleted_count > 0)
}

/// Every project of the user that has a non-empty embedding.
pub async fn with_embeddings(db: &Db, user_id: &str) -> Result<Vec<PortfolioProject>, AppError> {
    db::find_all(
        &db.portfolio_projects(),
        doc! { "user_id": user_id, "embedding_vector.0": { "$exists": true } },
    )
    .await
}

pub async fn count_for_user(db: &Db, user_id: &str) -> Result<u64, AppError> {
    Ok(db
        .portfolio_projects()
        .count_documents(doc! { "user_id": user_id }, None)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filters_only_add_present_fields() {
        let none = ProjectFilters::default().to_filter("u1");
        assert_eq!(none, doc! { "user_id": "u1" });

        let both = ProjectFilters {
            project_type: Some("mobile_app".to_string()),
            is_featured: Some(true),
        }
        .to_filter("u1");
        assert_eq!(
            both,
            doc! { "user_id": "u1", "project_type": "mobile_app", "is_featured": true }
        );
    }

    #[test]
    fn test_update_fields_keep_the_record_timestamp() {
        let created = Utc::now() - chrono::Duration::days(3);
        let updated = Utc::now();
        let project = PortfolioProject {
            id: Some(ObjectId::new()),
            name: "Burger Lab".to_string(),
            description: "Food ordering app".to_string(),
            user_id: "u1".to_string(),
            tags: vec![],
            technologies: vec![],
            project_type: Default::default(),
            complexity_level: Default::default(),
            ai_summary: String::new(),
            embedding_vector: vec![],
            github_url: None,
            live_url: None,
            app_store_url: None,
            images: vec![],
            is_featured: true,
            created_at: created,
            updated_at: updated,
        };

        let fields = update_fields(&project).unwrap();

        assert!(!fields.contains_key("_id"));
        assert!(!fields.contains_key("created_at"));
        assert_eq!(
            fields.get_datetime("updated_at").unwrap(),
            &bson::DateTime::from_chrono(updated)
        );
        assert!(fields.get_bool("is_featured").unwrap());
    }
}
