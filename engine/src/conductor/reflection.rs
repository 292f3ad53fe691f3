//! Conductor Reflection
//!
//! Post-step hooks. A `ReflectionAttachment` binds a nested single-step
//! conversation to a trigger recipient; the executor takes it out of the
//! `HookTable` right after the trigger's step completes, so it fires at most
//! once per registration.

use crate::conductor::types::{ConversationStep, Recipient, StepMessage};
use crate::prompts::build_reflection_message_for;
use std::collections::HashMap;

/// Nested step fired when `trigger` finishes a step
///
/// The nested step's message is derived from the trigger's transcript.
#[derive(Debug, Clone)]
pub struct ReflectionAttachment {
    pub trigger: Recipient,
    pub nested_step: ConversationStep,
}

impl ReflectionAttachment {
    pub fn new(trigger: Recipient, nested_step: ConversationStep) -> Self {
        Self {
            trigger,
            nested_step,
        }
    }

    /// Critic exchange attached to the writer step
    pub fn critic(max_turns: u32) -> Self {
        let message = StepMessage::derived(|ctx| {
            build_reflection_message_for(Some(ctx.question), ctx.transcript)
        });

        Self::new(
            Recipient::Writer,
            ConversationStep::new(Recipient::Critic, message)
                .with_clear_history(true)
                .with_max_turns(max_turns),
        )
    }
}

/// Post-step hooks keyed by the recipient that triggers them
#[derive(Debug, Default)]
pub struct HookTable {
    hooks: HashMap<Recipient, ReflectionAttachment>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attachment, replacing any hook on the same trigger
    pub fn register(&mut self, attachment: ReflectionAttachment) {
        if self.hooks.contains_key(&attachment.trigger) {
            tracing::debug!("Replacing reflection hook on {}", attachment.trigger);
        }
        self.hooks.insert(attachment.trigger, attachment);
    }

    /// Remove and return the hook for `recipient`, if any
    pub fn take(&mut self, recipient: Recipient) -> Option<ReflectionAttachment> {
        self.hooks.remove(&recipient)
    }
}
