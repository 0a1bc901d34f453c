// Outcome tracking for submitted proposals.

pub mod handlers;
pub mod store;
