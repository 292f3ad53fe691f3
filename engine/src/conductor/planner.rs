//! Conductor Planner
//!
//! Builds the `StepQueue` for a request from the retrieved context and the
//! search verdict. Planning is pure: every branching decision is made here,
//! before any step executes.

use crate::conductor::types::{ConversationStep, Recipient, SearchVerdict, StepQueue};
use crate::config::ConversationConfig;
use crate::prompts::compose_answer_prompt;
use crate::responders::RetrievedContext;

pub struct Planner {
    search_max_turns: u32,
    writer_max_turns: u32,
}

impl Planner {
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            search_max_turns: config.search_max_turns,
            writer_max_turns: config.writer_max_turns,
        }
    }

    /// Build the queue: an optional search step followed by exactly one writer step.
    ///
    /// The writer prompt is rendered from the retrieved context only; search
    /// results are not merged into it.
    pub fn plan(
        &self,
        question: &str,
        context: &RetrievedContext,
        verdict: SearchVerdict,
    ) -> StepQueue {
        let mut steps = Vec::with_capacity(2);

        if verdict.needs_search() {
            steps.push(
                ConversationStep::new(Recipient::Search, question)
                    .with_max_turns(self.search_max_turns)
                    .with_clear_history(true),
            );
        }

        steps.push(
            ConversationStep::new(
                Recipient::Writer,
                compose_answer_prompt(&context.content, question),
            )
            .with_max_turns(self.writer_max_turns)
            .with_clear_history(true),
        );

        StepQueue::new(steps)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(&ConversationConfig::default())
    }
}
