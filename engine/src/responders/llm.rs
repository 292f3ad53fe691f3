//! LLM-backed Responders
//!
//! Implements the responder contracts on top of an [`LLMProvider`]. Each
//! responder plays one [`ResponderRole`], which fixes its system prompt.

use super::{ClassifierReply, Exchange, IntentClassifier, Responder, ResponderHistory};
use crate::conductor::types::Transcript;
use crate::llm::{LLMProvider, Message};
use anyhow::Result;
use async_trait::async_trait;
use sdk::errors::EngineError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Token a responder emits to end a multi-turn exchange early
pub const TERMINATION_TOKEN: &str = "TERMINATE";

/// Message sent on every turn after the first
pub const DEFAULT_FOLLOW_UP: &str =
    "Continue. If your previous answer is complete, reply TERMINATE.";

/// The part a responder plays in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponderRole {
    /// External search
    Search,
    /// Answer synthesis
    Writer,
    /// Answer critique
    Critic,
    /// Search-verdict classification
    Classifier,
}

impl ResponderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Writer => "writer",
            Self::Critic => "critic",
            Self::Classifier => "classifier",
        }
    }

    /// System prompt for this role
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Search => {
                "You are a Web Search Agent. Find relevant, up-to-date information \
                 about the user's message on the web. Summarize your findings and \
                 list the source URLs."
            }
            Self::Writer => {
                "You are a Writer Agent. Write precise answers grounded only in the \
                 material you are given. Never invent sources."
            }
            Self::Critic => {
                "You are a Critic Agent. Critically evaluate a researcher's response \
                 against the user's request. Provide constructive, specific feedback."
            }
            Self::Classifier => {
                "You are an intent classifier. Answer only with 'yes' or 'no'."
            }
        }
    }
}

/// Split a trailing termination token off a reply.
///
/// Returns the remaining content and whether the token was present.
fn split_termination(content: &str) -> (String, bool) {
    let trimmed = content.trim_end();
    match trimmed.strip_suffix(TERMINATION_TOKEN) {
        Some(rest) => (rest.trim_end().to_string(), true),
        None => (content.to_string(), false),
    }
}

/// Responder backed by a language model
pub struct LlmResponder {
    provider: Arc<dyn LLMProvider>,
    role: ResponderRole,
    history: Mutex<ResponderHistory>,
    follow_up: String,
}

impl LlmResponder {
    pub fn new(provider: Arc<dyn LLMProvider>, role: ResponderRole) -> Self {
        Self {
            provider,
            role,
            history: Mutex::new(ResponderHistory::new(role.system_prompt())),
            follow_up: DEFAULT_FOLLOW_UP.to_string(),
        }
    }

    /// Set the message sent on turns after the first
    pub fn with_follow_up(mut self, follow_up: impl Into<String>) -> Self {
        self.follow_up = follow_up.into();
        self
    }

    /// Bound the history kept between exchanges
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = Mutex::new(ResponderHistory::with_limit(
            self.role.system_prompt(),
            limit,
        ));
        self
    }

    /// Number of messages currently remembered
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }
}

#[async_trait]
impl Responder for LlmResponder {
    fn name(&self) -> &str {
        self.role.as_str()
    }

    async fn run(&self, seed: &str, max_turns: u32, clear_history: bool) -> Result<Exchange> {
        if max_turns == 0 {
            return Err(EngineError::InvalidStep(format!(
                "{} exchange needs at least one turn",
                self.role.as_str()
            ))
            .into());
        }

        let mut history = self.history.lock().await;
        if clear_history {
            history.clear();
        }

        let mut transcript = Transcript::new();
        let mut outgoing = seed.to_string();

        for turn in 1..=max_turns {
            let message = Message::user(outgoing);
            history.push(message.clone());
            transcript.push(message);

            debug!(
                "{} turn {}/{} via {}",
                self.role.as_str(),
                turn,
                max_turns,
                self.provider.name()
            );

            let answer = self
                .provider
                .generate(&history.prompt())
                .await
                .map_err(|e| {
                    EngineError::LLMProvider(format!("{}: {}", self.provider.name(), e))
                })?;

            let (content, finished) = split_termination(&answer.content);
            if finished && content.is_empty() && turn > 1 {
                // Bare termination: the previous reply stands, drop the follow-up
                transcript.pop();
                history.pop();
                break;
            }

            let reply = Message::assistant(content);
            history.push(reply.clone());
            transcript.push(reply);

            if finished {
                debug!("{} ended the exchange after {} turn(s)", self.role.as_str(), turn);
                break;
            }
            outgoing = self.follow_up.clone();
        }

        Ok(Exchange { transcript })
    }
}

/// Intent classifier backed by a language model
pub struct LlmIntentClassifier {
    provider: Arc<dyn LLMProvider>,
}

impl LlmIntentClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, prompt: &str) -> Result<ClassifierReply> {
        let messages = [
            Message::system(ResponderRole::Classifier.system_prompt()),
            Message::user(prompt),
        ];

        let answer = self.provider.generate(&messages).await.map_err(|e| {
            EngineError::Classification(format!("{}: {}", self.provider.name(), e))
        })?;

        Ok(ClassifierReply::new(answer.content))
    }
}
