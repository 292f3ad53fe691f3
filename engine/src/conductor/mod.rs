//! Conductor System
//!
//! Orchestrates retrieval, the search verdict, step planning and execution of
//! the responder conversation for a single question.

pub mod executor;
pub mod planner;
pub mod reflection;
pub mod types;

pub use executor::{ExecutionReport, Executor};
pub use planner::Planner;
pub use reflection::{HookTable, ReflectionAttachment};
pub use types::{
    ConversationStep, MessageContext, Recipient, SearchVerdict, StepMessage, StepOutcome,
    StepQueue, SummaryMethod, Transcript,
};

use crate::config::{Config, ConversationConfig};
use crate::llm::LLMProvider;
use crate::prompts::compose_search_verdict_prompt;
use crate::responders::{
    ContextRetriever, IntentClassifier, LlmIntentClassifier, LlmResponder, Responder,
    ResponderRole, RetrievedContext,
};
use anyhow::{Context, Result};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Collaborators of a conductor
#[derive(Clone)]
pub struct ResponderSet {
    pub retriever: Arc<dyn ContextRetriever>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub search: Arc<dyn Responder>,
    pub writer: Arc<dyn Responder>,
    pub critic: Arc<dyn Responder>,
}

impl ResponderSet {
    /// Back the classifier and all three responders by one provider
    pub fn with_llm(
        retriever: Arc<dyn ContextRetriever>,
        provider: Arc<dyn LLMProvider>,
        config: &Config,
    ) -> Self {
        let responder = |role: ResponderRole| -> Arc<dyn Responder> {
            Arc::new(
                LlmResponder::new(Arc::clone(&provider), role)
                    .with_follow_up(config.conversation.follow_up_prompt.clone())
                    .with_history_limit(config.memory.max_history_tokens),
            )
        };

        Self {
            retriever,
            classifier: Arc::new(LlmIntentClassifier::new(Arc::clone(&provider))),
            search: responder(ResponderRole::Search),
            writer: responder(ResponderRole::Writer),
            critic: responder(ResponderRole::Critic),
        }
    }
}

/// Record of one `search` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub run_id: Uuid,
    pub question: String,
    pub verdict: SearchVerdict,
    /// Summary of the last queue step
    pub answer: String,
    pub steps: Vec<StepOutcome>,
    pub reflection: Option<StepOutcome>,
}

impl SearchOutcome {
    /// Recipients of the executed queue steps, in order
    pub fn shape(&self) -> Vec<Recipient> {
        self.steps.iter().map(|s| s.recipient).collect()
    }

    /// Critic feedback, if the reflection ran
    pub fn critique(&self) -> Option<&str> {
        self.reflection.as_ref().map(|r| r.summary.as_str())
    }
}

/// Answers questions by driving the responder conversation
pub struct Conductor {
    responders: ResponderSet,
    planner: Planner,
    config: ConversationConfig,
}

impl Conductor {
    pub fn new(responders: ResponderSet, config: ConversationConfig) -> Self {
        Self {
            planner: Planner::new(&config),
            responders,
            config,
        }
    }

    /// Answer `question`.
    ///
    /// Retrieval and classification each run once, then the planned queue
    /// executes in order. Any responder failure aborts the run without an answer.
    pub async fn search(&self, question: &str) -> Result<SearchOutcome> {
        let run_id = Uuid::new_v4();
        info!("Search {} started", run_id);

        let context = self
            .responders
            .retriever
            .retrieve(question)
            .await
            .map_err(|e| EngineError::Retrieval(format!("{:#}", e)))
            .context("Failed to retrieve local context")?;
        if context.is_empty() {
            info!("No local context retrieved for search {}", run_id);
        }

        let verdict = self.verdict(question, &context).await?;
        let queue = self.planner.plan(question, &context, verdict);
        info!("Search {} planned: {:?}", run_id, queue.shape());

        let mut executor = self.executor();
        if self.config.reflection {
            let critic = ReflectionAttachment::critic(self.config.critic_max_turns);
            executor.register_reflection(critic);
        }

        let report = executor
            .run(question, queue)
            .await
            .with_context(|| format!("Search {} did not produce an answer", run_id))?;

        let answer = report.final_summary().unwrap_or_default().to_string();
        info!("Search {} answered after {} step(s)", run_id, report.steps.len());

        Ok(SearchOutcome {
            run_id,
            question: question.to_string(),
            verdict,
            answer,
            steps: report.steps,
            reflection: report.reflections.into_iter().next(),
        })
    }

    /// Ask the classifier whether local context needs external search
    async fn verdict(&self, question: &str, context: &RetrievedContext) -> Result<SearchVerdict> {
        let prompt = compose_search_verdict_prompt(&context.content, question);
        let reply = self
            .responders
            .classifier
            .classify(&prompt)
            .await
            .map_err(|e| EngineError::Classification(format!("{:#}", e)))
            .context("Failed to classify search intent")?;

        let verdict = SearchVerdict::from_reply(&reply.content);
        if !verdict.needs_search() && !reply.content.trim().eq_ignore_ascii_case("no") {
            debug!("Classifier reply {:?} treated as no search", reply.content);
        }
        Ok(verdict)
    }

    fn executor(&self) -> Executor {
        Executor::new(self.config.step_timeout())
            .with_responder(Recipient::Search, Arc::clone(&self.responders.search))
            .with_responder(Recipient::Writer, Arc::clone(&self.responders.writer))
            .with_responder(Recipient::Critic, Arc::clone(&self.responders.critic))
    }
}
