//! Retrieval-augmented answers over a user's documents.
//!
//! Flow: embed query → load user documents → back-fill missing embeddings →
//!       rank top 5 by cosine similarity → build context → chat completion.
//!
//! Ranking is a linear scan over every document the user owns.

use serde::Serialize;
use tracing::{info, warn};

use crate::db::Db;
use crate::documents::prompts::{SEARCH_QUESTION_TEMPLATE, SEARCH_SYSTEM};
use crate::documents::store;
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, ChatRequest, LanguageModel};
use crate::models::document::Document;
use crate::similarity::{rank_top_k, round_score, Scored};

/// Documents placed in the answer context.
pub const CONTEXT_DOCUMENTS: usize = 5;
const ANSWER_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct RelevantDocument {
    pub id: String,
    pub name: String,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchAnswer {
    pub ai_response: String,
    pub relevant_documents: Vec<RelevantDocument>,
    /// The incoming history plus this question and its answer.
    pub conversation_history: Vec<ChatMessage>,
}

pub async fn semantic_search(
    db: &Db,
    llm: &dyn LanguageModel,
    query: &str,
    user_id: &str,
    history: Vec<ChatMessage>,
) -> Result<SearchAnswer, AppError> {
    let query_embedding = llm.embed(query).await?;

    let mut documents = store::all_for_user(db, user_id).await?;
    backfill_embeddings(db, llm, &mut documents).await;

    let ranked = rank_top_k(
        &query_embedding,
        documents,
        |d| d.embedding.as_slice(),
        CONTEXT_DOCUMENTS,
    );
    info!(
        "Semantic search for user {} matched {} documents",
        user_id,
        ranked.len()
    );

    answer(llm, query, history, &ranked).await
}

/// Computes and persists embeddings for documents stored without one.
/// A document that cannot be embedded stays unranked for this search.
async fn backfill_embeddings(db: &Db, llm: &dyn LanguageModel, documents: &mut [Document]) {
    for document in documents.iter_mut().filter(|d| d.embedding.is_empty()) {
        if document.content.trim().is_empty() {
            continue;
        }
        let embedding = match llm.embed(&document.content).await {
            Ok(e) => e,
            Err(e) => {
                warn!("Could not embed document {}: {}", document.id, e);
                continue;
            }
        };
        if let Err(e) = store::set_embedding(db, &document.id, &embedding).await {
            warn!("Could not persist embedding for document {}: {}", document.id, e);
        }
        document.embedding = embedding;
    }
}

async fn answer(
    llm: &dyn LanguageModel,
    query: &str,
    mut history: Vec<ChatMessage>,
    ranked: &[Scored<Document>],
) -> Result<SearchAnswer, AppError> {
    let context = build_context(ranked);
    let question = SEARCH_QUESTION_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", query);

    let request = ChatRequest::new(SEARCH_SYSTEM, question)
        .with_history(&history)
        .max_tokens(ANSWER_MAX_TOKENS)
        .temperature(0.7);
    let ai_response = llm.complete(&request).await?;

    history.push(ChatMessage::user(query));
    history.push(ChatMessage::assistant(ai_response.clone()));

    Ok(SearchAnswer {
        ai_response,
        relevant_documents: ranked
            .iter()
            .map(|s| RelevantDocument {
                id: s.item.id.clone(),
                name: s.item.name.clone(),
                similarity_score: round_score(s.score, 4),
            })
            .collect(),
        conversation_history: history,
    })
}

fn build_context(ranked: &[Scored<Document>]) -> String {
    let mut parts = vec!["Available documents:".to_string()];
    for (i, scored) in ranked.iter().enumerate() {
        parts.push(format!("\nDocument {}:", i + 1));
        parts.push(format!("Type: {}", scored.item.mime_type));
        parts.push(format!("Content: {}", scored.item.content));
        parts.push(format!("Similarity Score: {:.4}", scored.score));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::Role;

    fn scored(id: &str, content: &str, score: f32) -> Scored<Document> {
        Scored {
            item: Document::new(
                id.to_string(),
                format!("{id}.txt"),
                "text/plain".to_string(),
                content.to_string(),
                "u1".to_string(),
                vec![1.0, 0.0],
            ),
            score,
        }
    }

    #[test]
    fn test_build_context_lists_documents_in_rank_order() {
        let ranked = vec![
            scored("a", "Invoice total is $300", 0.91234),
            scored("b", "Meeting notes", 0.5),
        ];
        let context = build_context(&ranked);

        assert!(context.starts_with("Available documents:"));
        assert!(context.contains("Document 1:\nType: text/plain\nContent: Invoice total is $300"));
        assert!(context.contains("Similarity Score: 0.9123"));
        let first = context.find("Invoice").unwrap();
        let second = context.find("Meeting notes").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_build_context_without_documents() {
        assert_eq!(build_context(&[]), "Available documents:");
    }

    #[tokio::test]
    async fn test_answer_extends_history_and_sends_context() {
        let model = ScriptedModel::new().reply("The invoice totals $300 (Document 1).");
        let history = vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello! Ask me about your documents."),
        ];
        let ranked = vec![scored("inv-1", "Invoice total is $300", 0.9)];

        let result = answer(&model, "What is the invoice total?", history, &ranked)
            .await
            .unwrap();

        assert_eq!(result.ai_response, "The invoice totals $300 (Document 1).");
        assert_eq!(result.relevant_documents.len(), 1);
        assert_eq!(result.relevant_documents[0].id, "inv-1");
        assert_eq!(result.relevant_documents[0].similarity_score, 0.9);
        assert_eq!(result.conversation_history.len(), 4);
        assert_eq!(result.conversation_history[2].role, Role::User);
        assert_eq!(result.conversation_history[3].role, Role::Assistant);

        let sent = model.last_request().unwrap();
        assert_eq!(sent.system, SEARCH_SYSTEM);
        assert_eq!(sent.messages.len(), 3);
        let last = &sent.messages[2].content;
        assert!(last.starts_with("Context: Available documents:"));
        assert!(last.ends_with("Question: What is the invoice total?"));
    }
}
