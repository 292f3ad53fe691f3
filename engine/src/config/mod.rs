//! Configuration management
//!
//! This module handles loading, validation, and management of the Docent configuration.
//! Configuration is stored in TOML format at ~/.docent/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **conversation**: Turn limits, step timeout, reflection toggle, follow-up prompt
//! - **memory**: Per-responder history budget
//!
//! Every section and field is optional; missing values take their defaults.
//! Parsing and validation never touch the filesystem.
//!
//! # Examples
//!
//! ```no_run
//! use docent_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Writer turns: {}", config.conversation.writer_max_turns);
//! println!("Reflection: {}", config.conversation.reflection);
//! # Ok(())
//! # }
//! ```

use crate::responders::llm::DEFAULT_FOLLOW_UP;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Conversation orchestration settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Responder memory settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Conversation orchestration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Turn limit of the external search step
    #[serde(default = "default_search_max_turns")]
    pub search_max_turns: u32,

    /// Turn limit of the answer synthesis step
    #[serde(default = "default_writer_max_turns")]
    pub writer_max_turns: u32,

    /// Turn limit of the critic reflection
    #[serde(default = "default_critic_max_turns")]
    pub critic_max_turns: u32,

    /// Upper bound on a single step, in seconds
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Attach the critic reflection to the writer step
    #[serde(default = "default_true")]
    pub reflection: bool,

    /// Message sent to a responder on every turn after the first
    #[serde(default = "default_follow_up_prompt")]
    pub follow_up_prompt: String,
}

impl ConversationConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            search_max_turns: default_search_max_turns(),
            writer_max_turns: default_writer_max_turns(),
            critic_max_turns: default_critic_max_turns(),
            step_timeout_secs: default_step_timeout_secs(),
            reflection: true,
            follow_up_prompt: default_follow_up_prompt(),
        }
    }
}

/// Responder memory configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Token budget of each responder's remembered history
    #[serde(default = "default_max_history_tokens")]
    pub max_history_tokens: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_history_tokens: default_max_history_tokens(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_search_max_turns() -> u32 {
    2
}

fn default_writer_max_turns() -> u32 {
    2
}

fn default_critic_max_turns() -> u32 {
    1
}

fn default_step_timeout_secs() -> u64 {
    300
}

fn default_follow_up_prompt() -> String {
    DEFAULT_FOLLOW_UP.to_string()
}

fn default_max_history_tokens() -> usize {
    8000
}

impl Config {
    /// Load configuration from the default location (~/.docent/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    pub fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(&Self::default_config())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let config = Self::default_config();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.docent/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".docent").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate value ranges
    fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let conversation = &self.conversation;
        for (name, turns) in [
            ("search_max_turns", conversation.search_max_turns),
            ("writer_max_turns", conversation.writer_max_turns),
            ("critic_max_turns", conversation.critic_max_turns),
        ] {
            if turns == 0 {
                return Err(EngineError::Config(format!("{} must be at least 1", name)));
            }
        }

        if conversation.step_timeout_secs == 0 {
            return Err(EngineError::Config(
                "step_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.memory.max_history_tokens == 0 {
            return Err(EngineError::Config(
                "max_history_tokens must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
