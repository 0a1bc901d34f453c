use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::search::{semantic_search, SearchAnswer};
use crate::documents::store;
use crate::errors::{require_field, AppError};
use crate::extract::{Json, Query};
use crate::llm_client::ChatMessage;
use crate::models::document::{Document, DocumentSummary};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

const REQUIRED_FIELDS: [&str; 5] = ["id", "name", "mimeType", "text", "user_id"];
/// Largest accepted upload body, multipart framing included.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Deserialize)]
struct NewDocument {
    id: String,
    name: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
    text: String,
    user_id: String,
}

#[derive(Debug, Serialize)]
pub struct BulkItemResult {
    pub id: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongodb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemResult {
    fn success(id: String) -> Self {
        Self {
            mongodb_id: Some(id.clone()),
            id: Some(id),
            status: "success",
            error: None,
        }
    }

    fn failure(id: Option<String>, error: String) -> Self {
        Self {
            id,
            status: "error",
            mongodb_id: None,
            error: Some(error),
        }
    }
}

#[derive(Serialize)]
pub struct BulkCreateResponse {
    pub message: &'static str,
    pub results: Vec<BulkItemResult>,
}

/// POST /documents/api/documents/create
/// Body is a JSON array; each element succeeds or fails on its own.
pub async fn handle_bulk_create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    let Value::Array(items) = body else {
        return Err(AppError::Validation(
            "Request body must be an array of documents".to_string(),
        ));
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(create_one(&state, item).await);
    }

    let created = results.iter().filter(|r| r.status == "success").count();
    info!("Bulk document creation: {}/{} created", created, results.len());

    Ok(Json(BulkCreateResponse {
        message: "Bulk document creation completed",
        results,
    }))
}

async fn create_one(state: &AppState, item: Value) -> BulkItemResult {
    let id = item.get("id").and_then(Value::as_str).map(str::to_string);

    let missing = missing_fields(&item);
    if !missing.is_empty() {
        return BulkItemResult::failure(
            id,
            format!("Missing required fields: {}", missing.join(", ")),
        );
    }

    let new_doc: NewDocument = match serde_json::from_value(item) {
        Ok(d) => d,
        Err(e) => return BulkItemResult::failure(id, format!("Invalid document: {e}")),
    };

    let embedding = match state.llm.embed(&new_doc.text).await {
        Ok(e) => e,
        Err(e) => return BulkItemResult::failure(id, e.to_string()),
    };

    let document = Document::new(
        new_doc.id,
        new_doc.name,
        new_doc.mime_type,
        new_doc.text,
        new_doc.user_id,
        embedding,
    );
    match store::insert(&state.db, &document).await {
        Ok(()) => BulkItemResult::success(document.id),
        Err(e) => {
            warn!("Failed to store document {}: {}", document.id, e);
            BulkItemResult::failure(id, e.to_string())
        }
    }
}

fn missing_fields(item: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| item.get(field).map_or(true, Value::is_null))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub user_id: String,
    pub characters: usize,
}

struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// POST /documents/api/documents/upload
/// Multipart fields: `file` (text or PDF), `user_id`, optional `name`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut user_id: Option<String> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "user_id" | "name" => {
                let value = field.text().await?;
                if field_name == "user_id" {
                    user_id = Some(value);
                } else {
                    name = Some(value);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let user_id = require_field(user_id, "user_id")?;

    let (mime_type, text) = extract_text(file.file_name.as_deref(), file.content_type, file.data).await?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the file".to_string(),
        ));
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .or(file.file_name)
        .unwrap_or_else(|| "Untitled document".to_string());

    let embedding = state.llm.embed(&text).await?;
    let document = Document::new(
        Uuid::new_v4().to_string(),
        name,
        mime_type,
        text,
        user_id,
        embedding,
    );
    store::insert(&state.db, &document).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            characters: document.content.chars().count(),
            id: document.id,
            name: document.name,
            mime_type: document.mime_type,
            user_id: document.user_id,
        }),
    ))
}

fn is_pdf(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
}

/// Returns the stored mime type and the extracted text.
async fn extract_text(
    file_name: Option<&str>,
    content_type: Option<String>,
    data: Vec<u8>,
) -> Result<(String, String), AppError> {
    if is_pdf(file_name, content_type.as_deref()) {
        // PDF parsing is CPU-bound
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}")))?
            .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;
        return Ok(("application/pdf".to_string(), text));
    }

    let text = String::from_utf8(data).map_err(|_| {
        AppError::Validation("Unsupported file type: upload plain text or PDF".to_string())
    })?;
    let mime_type = content_type
        .filter(|ct| ct != "application/octet-stream")
        .unwrap_or_else(|| "text/plain".to_string());
    Ok((mime_type, text))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

/// POST /documents/api/documents/search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchAnswer>, AppError> {
    let (Some(query), Some(user_id)) = (
        req.query.filter(|q| !q.trim().is_empty()),
        req.user_id.filter(|u| !u.trim().is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Both query and user_id are required".to_string(),
        ));
    };

    let answer = semantic_search(
        &state.db,
        state.llm.as_ref(),
        &query,
        &user_id,
        req.conversation_history,
    )
    .await?;
    Ok(Json(answer))
}

/// GET /documents/api/documents/user/:user_id
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<DocumentSummary>>, AppError> {
    let (page, page_size) = params.resolve()?;
    let (documents, pagination) = store::list_for_user(&state.db, &user_id, page, page_size).await?;
    Ok(Json(Page::new(documents, pagination).map(DocumentSummary::from)))
}
