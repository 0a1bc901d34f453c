// Proposal generation, storage and search.
// Prompts live in prompts.rs and are assembled by generator.rs.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod store;
