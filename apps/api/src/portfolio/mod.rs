// Portfolio projects: storage, AI analysis, similarity search against job descriptions.

pub mod analysis;
pub mod handlers;
pub mod prompts;
pub mod store;
