//! Market-trend and buying-guide advisor
//!
//! Tries the web search for fresh context, swallows its failure, and asks
//! the model to answer either way. Only an LLM failure propagates.

use std::sync::Arc;

use realty_llm::{LlmBackend, Message};

use crate::websearch::{SearchSnippet, WebSearch};
use crate::ToolError;

const MARKET_PERSONA: &str = "You are a Dubai real-estate market analyst. Answer the user's \
question about market trends concisely and concretely, in the user's own language, formatted \
as HTML. If search snippets are provided, ground your answer in them; otherwise answer from \
your own knowledge and say the figures are indicative.";

const GUIDE_PERSONA: &str = "You are a Dubai property-buying advisor. Explain the buying \
process, fees, and legal steps relevant to the user's question, in the user's own language, \
formatted as HTML. Be practical and specific to Dubai.";

pub struct MarketAdvisor {
    llm: Arc<dyn LlmBackend>,
    search: Arc<dyn WebSearch>,
}

impl MarketAdvisor {
    pub fn new(llm: Arc<dyn LlmBackend>, search: Arc<dyn WebSearch>) -> Self {
        Self { llm, search }
    }

    pub async fn market_trends(&self, message: &str) -> Result<String, ToolError> {
        self.answer(MARKET_PERSONA, message).await
    }

    pub async fn buying_guide(&self, message: &str) -> Result<String, ToolError> {
        self.answer(GUIDE_PERSONA, message).await
    }

    async fn answer(&self, persona: &str, message: &str) -> Result<String, ToolError> {
        let snippets = match self.search.search(message).await {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::warn!(error = %e, "Web search failed, answering without it");
                Vec::new()
            }
        };

        let mut system = persona.to_string();
        if !snippets.is_empty() {
            system.push_str("\n\nSearch snippets:\n");
            system.push_str(&format_snippets(&snippets));
        }

        let messages = [Message::system(system), Message::user(message)];
        Ok(self.llm.complete(&messages).await?)
    }
}

fn format_snippets(snippets: &[SearchSnippet]) -> String {
    snippets
        .iter()
        .take(5)
        .map(|s| format!("- {} — {} ({})", s.title, s.snippet, s.url))
        .collect::<Vec<_>>()
        .join("\n")
}
