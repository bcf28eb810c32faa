//! LLM-backed intent classification

use std::sync::Arc;

use realty_core::Classification;
use realty_llm::{decode_json, LlmBackend, LlmError, Message};

use crate::memory::SessionMemory;
use crate::prompts;

pub struct IntentClassifier {
    llm: Arc<dyn LlmBackend>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    /// One model call, one typed decode. No retry: a failure here turns the
    /// whole turn into a clarification reply.
    ///
    /// The session's previous intent and any open follow-up questions are
    /// appended to the prompt so a terse answer ("2", "no preference") is
    /// labeled as the flow that asked for it rather than a fresh request.
    pub async fn classify(
        &self,
        message: &str,
        memory: &SessionMemory,
    ) -> Result<Classification, LlmError> {
        let system = match context_note(memory) {
            Some(note) => format!("{}\n\n{note}", prompts::CLASSIFY),
            None => prompts::CLASSIFY.to_string(),
        };
        let messages = [Message::system(system), Message::user(message)];
        let raw = self.llm.complete(&messages).await?;
        let classification: Classification = decode_json(&raw)?;
        tracing::debug!(intent = %classification.intent, "Classified message");
        Ok(classification)
    }
}

fn context_note(memory: &SessionMemory) -> Option<String> {
    if memory.previous_intent.is_none() && memory.pending_questions.is_empty() {
        return None;
    }

    let mut note = String::from("Conversation context:");
    if let Some(intent) = memory.previous_intent {
        note.push_str(&format!(" the previous intent was \"{intent}\"."));
    }
    if !memory.filters.is_empty() {
        note.push_str(" The user already has active search filters.");
    }
    if !memory.pending_questions.is_empty() {
        let asked: Vec<&str> = memory
            .pending_questions
            .iter()
            .map(|q| q.question())
            .collect();
        note.push_str(&format!(
            " The assistant just asked: {}. A bare number or a \"no preference\" \
             answer is a reply to those questions and keeps the previous intent.",
            asked.join(" / ")
        ));
    }
    Some(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use realty_core::IntentTag;
    use std::sync::Mutex;

    use crate::extractor::FollowUp;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmBackend for CannedLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct RecordingLlm {
        system: Mutex<String>,
    }

    #[async_trait]
    impl LlmBackend for RecordingLlm {
        async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
            *self.system.lock().unwrap() = messages[0].content.clone();
            Ok(r#"{"intent": "search"}"#.to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn decodes_a_fenced_classification() {
        let classifier = IntentClassifier::new(Arc::new(CannedLlm(
            "```json\n{\"intent\": \"search\", \"reset_requested\": false}\n```",
        )));
        let c = classifier
            .classify("دنبال آپارتمان هستم", &SessionMemory::new())
            .await
            .unwrap();
        assert_eq!(c.intent, IntentTag::Search);
        assert!(!c.reset_requested);
    }

    #[tokio::test]
    async fn unknown_tag_survives_decoding() {
        let classifier =
            IntentClassifier::new(Arc::new(CannedLlm(r#"{"intent": "sell_my_house"}"#)));
        let c = classifier.classify("x", &SessionMemory::new()).await.unwrap();
        assert_eq!(c.intent, IntentTag::Unknown);
    }

    #[tokio::test]
    async fn prose_is_a_parse_error() {
        let classifier = IntentClassifier::new(Arc::new(CannedLlm("I think they want to search")));
        assert!(matches!(
            classifier.classify("x", &SessionMemory::new()).await,
            Err(LlmError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn session_context_reaches_the_prompt() {
        let llm = Arc::new(RecordingLlm {
            system: Mutex::new(String::new()),
        });
        let classifier = IntentClassifier::new(llm.clone());

        let mut memory = SessionMemory::new();
        memory.previous_intent = Some(IntentTag::Search);
        memory.pending_questions = vec![FollowUp::Bedrooms];
        classifier.classify("۲", &memory).await.unwrap();

        let system = llm.system.lock().unwrap();
        assert!(system.contains("previous intent was \"search\""));
        assert!(system.contains(FollowUp::Bedrooms.question()));
    }

    #[tokio::test]
    async fn fresh_session_gets_the_bare_prompt() {
        let llm = Arc::new(RecordingLlm {
            system: Mutex::new(String::new()),
        });
        let classifier = IntentClassifier::new(llm.clone());
        classifier.classify("سلام", &SessionMemory::new()).await.unwrap();
        assert!(!llm.system.lock().unwrap().contains("Conversation context"));
    }
}
