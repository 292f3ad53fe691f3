//! Responder History
//!
//! Conversation history a responder keeps between steps. The system prompt is
//! pinned outside the trimmed window; the window drops its oldest messages when
//! the estimated token count exceeds the configured limit.

use crate::llm::Message;
use std::collections::VecDeque;

/// Default history limit in tokens (conservative estimate for most models)
pub const DEFAULT_HISTORY_LIMIT: usize = 8000;

/// Average characters per token (rough estimate: 1 token ≈ 4 characters)
const CHARS_PER_TOKEN: usize = 4;

/// Per-message overhead for role and structure
const MESSAGE_OVERHEAD: usize = 10;

/// Messages kept regardless of the limit (the latest exchange)
const MIN_RETAINED: usize = 2;

#[derive(Debug, Clone)]
pub struct ResponderHistory {
    system_prompt: Message,
    window: VecDeque<Message>,
    limit: usize,
    token_count: usize,
}

impl ResponderHistory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self::with_limit(system_prompt, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(system_prompt: impl Into<String>, limit: usize) -> Self {
        Self {
            system_prompt: Message::system(system_prompt),
            window: VecDeque::new(),
            limit,
            token_count: 0,
        }
    }

    /// Append a message, trimming the oldest ones if the limit is exceeded
    pub fn push(&mut self, message: Message) {
        self.token_count += estimate_tokens(&message);
        self.window.push_back(message);

        while self.token_count > self.limit && self.window.len() > MIN_RETAINED {
            if let Some(removed) = self.window.pop_front() {
                self.token_count = self.token_count.saturating_sub(estimate_tokens(&removed));
            }
        }
    }

    /// Messages to send to the provider: system prompt followed by the window
    pub fn prompt(&self) -> Vec<Message> {
        std::iter::once(self.system_prompt.clone())
            .chain(self.window.iter().cloned())
            .collect()
    }

    /// Remove the newest message
    pub fn pop(&mut self) -> Option<Message> {
        let removed = self.window.pop_back()?;
        self.token_count = self.token_count.saturating_sub(estimate_tokens(&removed));
        Some(removed)
    }

    /// Forget everything except the system prompt
    pub fn clear(&mut self) {
        self.window.clear();
        self.token_count = 0;
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

}

fn estimate_tokens(message: &Message) -> usize {
    message.content.len().div_ceil(CHARS_PER_TOKEN) + MESSAGE_OVERHEAD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_prompt_starts_with_system() {
        let mut history = ResponderHistory::new("You are the writer");
        assert!(history.is_empty());

        history.push(Message::user("Hello"));
        let prompt = history.prompt();
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, MessageRole::System);
        assert_eq!(prompt[0].content, "You are the writer");
        assert_eq!(prompt[1].content, "Hello");
    }

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut history = ResponderHistory::new("system");
        history.push(Message::user("a"));
        history.push(Message::assistant("b"));
        assert_eq!(history.len(), 2);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.token_count, 0);
        assert_eq!(history.prompt().len(), 1);
    }

    #[test]
    fn test_trims_oldest_messages() {
        let mut history = ResponderHistory::with_limit("system", 100);
        for i in 0..20 {
            history.push(Message::user(format!("Question {}", i)));
            history.push(Message::assistant(format!("Answer {}", i)));
        }

        assert!(history.token_count <= 100);
        assert!(history.len() < 40);
        let prompt = history.prompt();
        assert_eq!(prompt[0].role, MessageRole::System);
        assert_eq!(prompt.last().unwrap().content, "Answer 19");
        assert!(!prompt.iter().any(|m| m.content == "Question 0"));
    }

    #[test]
    fn test_pop_removes_newest_message() {
        let mut history = ResponderHistory::new("system");
        history.push(Message::user("seed"));
        let before = history.token_count;
        history.push(Message::user("Continue."));

        let popped = history.pop().unwrap();
        assert_eq!(popped.content, "Continue.");
        assert_eq!(history.token_count, before);
        assert_eq!(history.prompt().last().unwrap().content, "seed");

        history.pop();
        assert!(history.pop().is_none());
        assert_eq!(history.token_count, 0);
    }

    #[test]
    fn test_keeps_latest_exchange_over_limit() {
        let mut history = ResponderHistory::with_limit("system", 10);
        history.push(Message::user("x".repeat(400)));
        history.push(Message::assistant("y".repeat(400)));

        // Over the limit, but the latest exchange is never dropped
        assert_eq!(history.len(), 2);
    }
}
