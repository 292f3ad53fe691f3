//! Docent SDK
//!
//! Shared library providing the error types used by the Docent engine and by
//! crates that implement responders for it.

/// Error types and handling
pub mod errors;

// Re-export commonly used types
pub use errors::{DocentErrorExt, EngineError};
