//! Responder Contracts
//!
//! The capabilities the conductor depends on. Retrieval and classification are
//! single calls; search, writer and critic responders all share the bounded
//! multi-turn [`Responder`] contract.
//!
//! The [`llm`] submodule provides implementations of the contracts on top of any
//! [`LLMProvider`](crate::llm::LLMProvider).

pub mod history;
pub mod llm;

use crate::conductor::types::Transcript;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use history::ResponderHistory;
pub use llm::{LlmIntentClassifier, LlmResponder, ResponderRole};

/// Context pulled from the local document store
///
/// Sources are cited inline within `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub content: String,
}

impl RetrievedContext {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// True when nothing but whitespace was retrieved
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Free-text reply of the intent classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierReply {
    pub content: String,
}

impl ClassifierReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Result of a bounded exchange with a responder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    /// Messages of this exchange only, seed message first
    pub transcript: Transcript,
}

/// Retrieves grounded context for a question
///
/// Returning empty content is not an error.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<RetrievedContext>;
}

/// Answers the search-verdict prompt
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<ClassifierReply>;
}

/// Runs a bounded multi-turn exchange seeded by a message
#[async_trait]
pub trait Responder: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Run at most `max_turns` turns starting from `seed`.
    ///
    /// With `clear_history` the responder forgets earlier exchanges first.
    async fn run(&self, seed: &str, max_turns: u32, clear_history: bool) -> Result<Exchange>;
}
