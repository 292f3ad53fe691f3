//! Conductor Executor
//!
//! Runs a `StepQueue` strictly in order against the registered responders.
//! After each queue step completes, the executor consults its `HookTable` and
//! runs the attached reflection step, if one is registered for that recipient.

use crate::conductor::reflection::{HookTable, ReflectionAttachment};
use crate::conductor::types::{
    ConversationStep, MessageContext, Recipient, StepOutcome, StepQueue, Transcript,
};
use crate::responders::Responder;
use anyhow::{Context, Result};
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Outcomes of an executed queue
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Queue steps, in execution order
    pub steps: Vec<StepOutcome>,
    /// Nested steps fired by hooks, in firing order
    pub reflections: Vec<StepOutcome>,
}

impl ExecutionReport {
    /// Summary of the last executed queue step
    pub fn final_summary(&self) -> Option<&str> {
        self.steps.last().map(|s| s.summary.as_str())
    }
}

/// Executes conversation steps against the responders
pub struct Executor {
    responders: HashMap<Recipient, Arc<dyn Responder>>,
    hooks: HookTable,
    step_timeout: Duration,
}

impl Executor {
    pub fn new(step_timeout: Duration) -> Self {
        Self {
            responders: HashMap::new(),
            hooks: HookTable::new(),
            step_timeout,
        }
    }

    /// Route steps addressed to `recipient` to `responder`
    pub fn with_responder(mut self, recipient: Recipient, responder: Arc<dyn Responder>) -> Self {
        self.responders.insert(recipient, responder);
        self
    }

    /// Attach a nested step to run after the trigger's step completes
    pub fn register_reflection(&mut self, attachment: ReflectionAttachment) {
        debug!(
            "Reflection registered: {} -> {}",
            attachment.trigger, attachment.nested_step.recipient
        );
        self.hooks.register(attachment);
    }

    /// Execute the queue left to right.
    ///
    /// A derived message sees the previous queue step's transcript. Any step
    /// failure aborts the remaining queue.
    pub async fn run(&mut self, question: &str, queue: StepQueue) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        let empty = Transcript::new();
        let total = queue.len();

        for (index, step) in queue.into_iter().enumerate() {
            let previous = report
                .steps
                .last()
                .map(|s| &s.transcript)
                .unwrap_or(&empty);
            let seed = step.seed_message(&MessageContext {
                question,
                transcript: previous,
            });

            info!(
                "Step {}/{}: {} (max {} turn(s))",
                index + 1,
                total,
                step.recipient,
                step.max_turns
            );
            let outcome = self
                .run_step(&step, &seed)
                .await
                .with_context(|| format!("{} step aborted the conversation", step.recipient))?;

            if let Some(hook) = self.hooks.take(step.recipient) {
                info!(
                    "{} completed, running {} reflection",
                    step.recipient, hook.nested_step.recipient
                );
                let nested_seed = hook.nested_step.seed_message(&MessageContext {
                    question,
                    transcript: &outcome.transcript,
                });
                let reflection = self
                    .run_step(&hook.nested_step, &nested_seed)
                    .await
                    .with_context(|| {
                        format!(
                            "{} reflection on {} failed",
                            hook.nested_step.recipient, step.recipient
                        )
                    })?;
                report.reflections.push(reflection);
            }

            report.steps.push(outcome);
        }

        Ok(report)
    }

    /// Run one step with its turn limit, history policy and timeout
    async fn run_step(&self, step: &ConversationStep, seed: &str) -> Result<StepOutcome> {
        if step.max_turns == 0 {
            return Err(EngineError::InvalidStep(format!(
                "{} step must allow at least one turn",
                step.recipient
            ))
            .into());
        }

        let responder = self.responders.get(&step.recipient).ok_or_else(|| {
            EngineError::InvalidStep(format!("no responder registered for {}", step.recipient))
        })?;

        let start = Instant::now();
        let exchange = match timeout(
            self.step_timeout,
            responder.run(seed, step.max_turns, step.clear_history),
        )
        .await
        {
            Ok(Ok(exchange)) => exchange,
            Ok(Err(e)) => {
                warn!("{} ({}) failed: {:#}", step.recipient, responder.name(), e);
                return Err(EngineError::Responder {
                    recipient: step.recipient.to_string(),
                    message: format!("{:#}", e),
                }
                .into());
            }
            Err(_) => {
                warn!(
                    "{} ({}) timed out after {}s",
                    step.recipient,
                    responder.name(),
                    self.step_timeout.as_secs()
                );
                return Err(EngineError::StepTimeout {
                    recipient: step.recipient.to_string(),
                    secs: self.step_timeout.as_secs(),
                }
                .into());
            }
        };

        let summary = step.summary_method.summarize(&exchange.transcript);
        let turns = exchange.transcript.replies();
        info!(
            "{} completed in {:.1}s with {} turn(s)",
            step.recipient,
            start.elapsed().as_secs_f64(),
            turns
        );

        Ok(StepOutcome {
            recipient: step.recipient,
            transcript: exchange.transcript,
            summary,
            turns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductor::types::StepMessage;
    use crate::llm::Message;
    use crate::responders::Exchange;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Replies "<name>: <seed>" and records every call
    struct EchoResponder {
        name: &'static str,
        calls: Mutex<Vec<(String, u32, bool)>>,
    }

    impl EchoResponder {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, u32, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Responder for EchoResponder {
        fn name(&self) -> &str {
            self.name
        }

        async fn run(&self, seed: &str, max_turns: u32, clear_history: bool) -> Result<Exchange> {
            self.calls
                .lock()
                .unwrap()
                .push((seed.to_string(), max_turns, clear_history));
            Ok(Exchange {
                transcript: Transcript::from(vec![
                    Message::user(seed),
                    Message::assistant(format!("{}: {}", self.name, seed)),
                ]),
            })
        }
    }

    struct FailingResponder;

    #[async_trait]
    impl Responder for FailingResponder {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _seed: &str, _max_turns: u32, _clear: bool) -> Result<Exchange> {
            Err(anyhow::anyhow!("provider down"))
        }
    }

    struct SlowResponder;

    #[async_trait]
    impl Responder for SlowResponder {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self, _seed: &str, _max_turns: u32, _clear: bool) -> Result<Exchange> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Exchange::default())
        }
    }

    fn executor(
        search: Arc<dyn Responder>,
        writer: Arc<dyn Responder>,
        critic: Arc<dyn Responder>,
    ) -> Executor {
        Executor::new(Duration::from_secs(5))
            .with_responder(Recipient::Search, search)
            .with_responder(Recipient::Writer, writer)
            .with_responder(Recipient::Critic, critic)
    }

    #[tokio::test]
    async fn test_runs_steps_in_order() {
        let search = EchoResponder::new("search");
        let writer = EchoResponder::new("writer");
        let critic = EchoResponder::new("critic");
        let mut exec = executor(search.clone(), writer.clone(), critic.clone());

        let queue = StepQueue::new(vec![
            ConversationStep::new(Recipient::Search, "q").with_max_turns(2),
            ConversationStep::new(Recipient::Writer, "prompt").with_max_turns(2),
        ]);
        let report = exec.run("q", queue).await.unwrap();

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].recipient, Recipient::Search);
        assert_eq!(report.final_summary(), Some("writer: prompt"));
        assert!(report.reflections.is_empty());
        assert_eq!(search.calls(), vec![("q".to_string(), 2, true)]);
        assert!(critic.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reflection_fires_once_after_trigger() {
        let search = EchoResponder::new("search");
        let writer = EchoResponder::new("writer");
        let critic = EchoResponder::new("critic");
        let mut exec = executor(search, writer, critic.clone());
        exec.register_reflection(ReflectionAttachment::critic(1));

        let queue = StepQueue::new(vec![
            ConversationStep::new(Recipient::Writer, "first"),
            ConversationStep::new(Recipient::Writer, "second"),
        ]);
        let report = exec.run("What was Q1 revenue?", queue).await.unwrap();

        assert_eq!(report.reflections.len(), 1);
        let calls = critic.calls();
        assert_eq!(calls.len(), 1);
        let (seed, max_turns, clear) = &calls[0];
        assert!(seed.contains("writer: first"));
        assert!(seed.contains("What was Q1 revenue?"));
        assert_eq!(*max_turns, 1);
        assert!(*clear);
        assert!(exec.hooks.take(Recipient::Writer).is_none());
    }

    #[tokio::test]
    async fn test_derived_message_sees_previous_step() {
        let search = EchoResponder::new("search");
        let writer = EchoResponder::new("writer");
        let mut exec = executor(search, writer.clone(), EchoResponder::new("critic"));

        let queue = StepQueue::new(vec![
            ConversationStep::new(Recipient::Search, "find it"),
            ConversationStep::new(
                Recipient::Writer,
                StepMessage::derived(|ctx| {
                    format!(
                        "use {}",
                        ctx.transcript.last().map(|m| m.content.as_str()).unwrap_or("")
                    )
                }),
            )
            .with_carry_over("extra"),
        ]);
        exec.run("q", queue).await.unwrap();

        assert_eq!(writer.calls()[0].0, "use search: find it\nContext: \nextra");
    }

    #[tokio::test]
    async fn test_failure_aborts_queue() {
        let writer = EchoResponder::new("writer");
        let mut exec = executor(
            Arc::new(FailingResponder),
            writer.clone(),
            EchoResponder::new("critic"),
        );

        let queue = StepQueue::new(vec![
            ConversationStep::new(Recipient::Search, "q"),
            ConversationStep::new(Recipient::Writer, "prompt"),
        ]);
        let err = exec.run("q", queue).await.unwrap_err();

        assert!(matches!(
            err.root_cause().downcast_ref::<EngineError>(),
            Some(EngineError::Responder { recipient, .. }) if recipient == "search"
        ));
        assert!(writer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let mut exec = Executor::new(Duration::from_millis(50))
            .with_responder(Recipient::Writer, Arc::new(SlowResponder));

        let queue = StepQueue::new(vec![ConversationStep::new(Recipient::Writer, "prompt")]);
        let err = exec.run("q", queue).await.unwrap_err();

        assert!(matches!(
            err.root_cause().downcast_ref::<EngineError>(),
            Some(EngineError::StepTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_responder_and_zero_turns() {
        let mut exec = Executor::new(Duration::from_secs(1));
        let queue = StepQueue::new(vec![ConversationStep::new(Recipient::Writer, "prompt")]);
        let err = exec.run("q", queue).await.unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<EngineError>(),
            Some(EngineError::InvalidStep(_))
        ));

        let mut exec = Executor::new(Duration::from_secs(1))
            .with_responder(Recipient::Writer, EchoResponder::new("writer"));
        let queue = StepQueue::new(vec![
            ConversationStep::new(Recipient::Writer, "prompt").with_max_turns(0)
        ]);
        let err = exec.run("q", queue).await.unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<EngineError>(),
            Some(EngineError::InvalidStep(_))
        ));
    }
}
