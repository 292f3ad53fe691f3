//! Error types and handling
//!
//! This module provides the error types used throughout the Docent engine.
//! All errors implement the `DocentErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry provider credentials or raw prompts. Responder
//! failures only name the responder and the reported cause.

use thiserror::Error;

/// Trait for Docent error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait DocentErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller (for example a timed out
    /// responder). Non-recoverable errors need a configuration change.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Collaborators**: Retrieval, classification and responder failures
/// - **Conversation**: Malformed conversation steps and step timeouts
/// - **LLM Provider**: Failures reported by a language-model backend
///
/// # Examples
///
/// ```
/// use sdk::errors::{DocentErrorExt, EngineError};
///
/// let error = EngineError::StepTimeout { recipient: "writer".to_string(), secs: 30 };
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("bad log level".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Collaborator errors
    #[error("Context retrieval failed: {0}")]
    Retrieval(String),

    #[error("Intent classification failed: {0}")]
    Classification(String),

    #[error("Responder '{recipient}' failed: {message}")]
    Responder { recipient: String, message: String },

    // Conversation errors
    #[error("Responder '{recipient}' timed out after {secs}s")]
    StepTimeout { recipient: String, secs: u64 },

    #[error("Invalid conversation step: {0}")]
    InvalidStep(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocentErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::Retrieval(_) => "The document store could not be searched. Check its availability",
            Self::Classification(_) => "The search classifier did not answer. Try again",
            Self::Responder { .. } => "A responder failed to answer. Check the provider logs",

            Self::StepTimeout { .. } => "A responder took too long to answer. Try again",
            Self::InvalidStep(_) => "The conversation was configured incorrectly",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::InvalidStep(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
