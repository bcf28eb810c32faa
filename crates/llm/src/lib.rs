//! LLM integration
//!
//! One seam (`LlmBackend`) with an OpenAI-compatible implementation, plus the
//! fail-closed JSON decode step every structured model call goes through.
//! Responses are not retried: a malformed or failed completion surfaces to
//! the conversation layer, which degrades to a fixed clarification reply.

pub mod backend;
pub mod json;
pub mod prompt;

pub use backend::{LlmBackend, OpenAiBackend};
pub use json::decode_json;
pub use prompt::{Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unparseable structured output: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}
