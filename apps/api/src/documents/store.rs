use mongodb::bson::doc;

use crate::db::{self, Db};
use crate::errors::AppError;
use crate::models::document::Document;
use crate::pagination::Pagination;

pub async fn insert(db: &Db, document: &Document) -> Result<(), AppError> {
    db.documents().insert_one(document, None).await?;
    tracing::info!(id = %document.id, user_id = %document.user_id, "Stored document");
    Ok(())
}

pub async fn list_for_user(
    db: &Db,
    user_id: &str,
    page: u64,
    page_size: u64,
) -> Result<(Vec<Document>, Pagination), AppError> {
    db::find_page(&db.documents(), doc! { "user_id": user_id }, page, page_size).await
}

pub async fn all_for_user(db: &Db, user_id: &str) -> Result<Vec<Document>, AppError> {
    db::find_all(&db.documents(), doc! { "user_id": user_id }).await
}

pub async fn set_embedding(db: &Db, id: &str, embedding: &[f32]) -> Result<(), AppError> {
    db.documents()
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "embedding": embedding.to_vec() } },
            None,
        )
        .await?;
    Ok(())
}
