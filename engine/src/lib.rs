//! Docent Engine Library
//!
//! Answers questions grounded in a local document store by orchestrating a
//! short conversation between specialized responders: retrieval, a search
//! verdict, optional external search, answer synthesis and a critic reflection.

/// Configuration management module
pub mod config;

/// Prompt composition and reflection messages
pub mod prompts;

/// LLM provider abstraction layer
pub mod llm;

/// Responder contracts and LLM-backed responders
pub mod responders;

/// Conductor orchestration module
pub mod conductor;

/// Telemetry and Observability
pub mod telemetry;

pub use conductor::{Conductor, ResponderSet, SearchOutcome};
pub use config::Config;
