// Document semantic search: storage, embedding, retrieval-augmented answers.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod search;
pub mod store;
