//! Conversational assistant that answers weather questions from a live API
//! and everything else from ingested documents, logging a compact note of
//! each answer to a vector store.

pub mod config;
pub mod error;
pub mod history;
pub mod indexer;
pub mod interactions;
pub mod llm;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod rag;
pub mod router;
pub mod weather;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Settings;
pub use error::{AssistantError, Result};
pub use pipeline::{Assistant, Turn};
pub use router::Route;
