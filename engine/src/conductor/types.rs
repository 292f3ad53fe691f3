//! Conductor Types
//!
//! The data model shared by the planner, the executor and the reflection hooks:
//! responder identities, conversation steps, step queues and transcripts.

use crate::llm::{Message, MessageRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of the responder a step is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    /// External search responder
    Search,
    /// Answer synthesis responder
    Writer,
    /// Answer critique responder
    Critic,
}

impl Recipient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Writer => "writer",
            Self::Critic => "critic",
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of interpreting the intent classifier's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchVerdict {
    /// Local context is missing or insufficient, run the search step
    NeedsSearch,
    /// Local context can answer the question
    Sufficient,
}

impl SearchVerdict {
    /// Parse a free-text classifier reply.
    ///
    /// Only the literal, case-sensitive substring `"yes"` yields `NeedsSearch`.
    /// Anything else, including empty or malformed replies, is `Sufficient`.
    pub fn from_reply(reply: &str) -> Self {
        if reply.contains("yes") {
            Self::NeedsSearch
        } else {
            Self::Sufficient
        }
    }

    pub fn needs_search(&self) -> bool {
        matches!(self, Self::NeedsSearch)
    }
}

/// Ordered messages exchanged during a single step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.0.pop()
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn first(&self) -> Option<&Message> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of replies produced by the responder
    pub fn replies(&self) -> usize {
        self.0
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count()
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

/// Inputs available to a derived step message
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// The user's original question
    pub question: &'a str,
    /// Transcript of the previous step, or of the triggering step for nested steps
    pub transcript: &'a Transcript,
}

/// Function computing a step's seed message at execution time
pub type MessageBuilder = Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>;

/// Seed message of a conversation step
#[derive(Clone)]
pub enum StepMessage {
    /// Message fixed when the step was built
    Fixed(String),
    /// Message computed right before the step runs
    Derived(MessageBuilder),
}

impl StepMessage {
    pub fn derived<F>(builder: F) -> Self
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(builder))
    }

    pub fn render(&self, ctx: &MessageContext<'_>) -> String {
        match self {
            Self::Fixed(text) => text.clone(),
            Self::Derived(builder) => builder(ctx),
        }
    }

    pub fn as_fixed(&self) -> Option<&str> {
        match self {
            Self::Fixed(text) => Some(text),
            Self::Derived(_) => None,
        }
    }
}

impl fmt::Debug for StepMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            Self::Derived(_) => f.write_str("Derived(<fn>)"),
        }
    }
}

impl From<String> for StepMessage {
    fn from(text: String) -> Self {
        Self::Fixed(text)
    }
}

impl From<&str> for StepMessage {
    fn from(text: &str) -> Self {
        Self::Fixed(text.to_string())
    }
}

/// How a finished step is condensed into its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    /// Content of the final transcript entry
    #[default]
    LastMessage,
}

impl SummaryMethod {
    pub fn summarize(&self, transcript: &Transcript) -> String {
        match self {
            Self::LastMessage => transcript
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
        }
    }
}

/// One bounded exchange with a single responder
#[derive(Debug, Clone)]
pub struct ConversationStep {
    pub recipient: Recipient,
    pub message: StepMessage,
    pub clear_history: bool,
    pub summary_method: SummaryMethod,
    pub max_turns: u32,
    pub carry_over: Option<String>,
}

impl ConversationStep {
    /// Create a single-turn step with cleared history
    pub fn new(recipient: Recipient, message: impl Into<StepMessage>) -> Self {
        Self {
            recipient,
            message: message.into(),
            clear_history: true,
            summary_method: SummaryMethod::LastMessage,
            max_turns: 1,
            carry_over: None,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_clear_history(mut self, clear_history: bool) -> Self {
        self.clear_history = clear_history;
        self
    }

    pub fn with_summary_method(mut self, summary_method: SummaryMethod) -> Self {
        self.summary_method = summary_method;
        self
    }

    pub fn with_carry_over(mut self, carry_over: impl Into<String>) -> Self {
        self.carry_over = Some(carry_over.into());
        self
    }

    /// Render the message actually sent to the responder.
    ///
    /// Carry-over text is appended after a `Context:` header.
    pub fn seed_message(&self, ctx: &MessageContext<'_>) -> String {
        let message = self.message.render(ctx);
        match &self.carry_over {
            Some(carry_over) => format!("{}\nContext: \n{}", message, carry_over),
            None => message,
        }
    }
}

/// Ordered, immutable list of steps for one request
#[derive(Debug, Clone, Default)]
pub struct StepQueue {
    steps: Vec<ConversationStep>,
}

impl StepQueue {
    pub fn new(steps: Vec<ConversationStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ConversationStep] {
        &self.steps
    }

    /// Recipients in execution order
    pub fn shape(&self) -> Vec<Recipient> {
        self.steps.iter().map(|s| s.recipient).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl IntoIterator for StepQueue {
    type Item = ConversationStep;
    type IntoIter = std::vec::IntoIter<ConversationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// Record of an executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub recipient: Recipient,
    pub transcript: Transcript,
    pub summary: String,
    /// Number of responder replies in the transcript
    pub turns: usize,
}
