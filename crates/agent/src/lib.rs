//! Conversational agent
//!
//! The core of the system: per-session memory, LLM-backed intent
//! classification and filter extraction, the continue-vs-reset confirmation
//! protocol, and the dispatch from intent to reply.
//!
//! The engine never fails a turn: every remote or parse failure degrades to a
//! fixed reply and the session survives.

pub mod classifier;
pub mod composer;
pub mod engine;
pub mod extractor;
pub mod memory;
pub mod prompts;
pub mod reference;
pub mod replies;

pub use classifier::IntentClassifier;
pub use composer::ResponseComposer;
pub use engine::ChatEngine;
pub use extractor::{merge_payload, Extraction, ExtractionPayload, FilterExtractor, FollowUp};
pub use memory::{PendingTurn, SessionManager, SessionMemory};
