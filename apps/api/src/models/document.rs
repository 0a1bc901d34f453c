use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A searchable document. `_id` is the caller's file id, or a generated UUID
/// for uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub content: String,
    /// Empty until computed; search back-fills it.
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub user_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: String,
        name: String,
        mime_type: String,
        content: String,
        user_id: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id,
            name,
            mime_type,
            content,
            embedding,
            user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl From<Document> for DocumentSummary {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            mime_type: doc.mime_type,
        }
    }
}
