//! External collaborators
//!
//! Best-effort web search and the market-trend / buying-guide advisor built
//! on top of it. Search failures are swallowed: the advisor always answers,
//! with or without fresh snippets.

pub mod advisor;
pub mod websearch;

pub use advisor::MarketAdvisor;
pub use websearch::{HttpSearch, NoSearch, SearchSnippet, WebSearch};

use thiserror::Error;

/// Tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Search error: {0}")]
    Search(String),

    #[error(transparent)]
    Llm(#[from] realty_llm::LlmError),
}
