//! CMOP observer agent
//!
//! Tool registry, CMOP query and analysis tools, and the reasoning session
//! that drives a language model over them.

use cmop_provider::ProviderError;
use thiserror::Error;

pub mod analysis;
pub mod context;
pub mod loop_agent;
pub mod tools;

pub use context::{ContextBuilder, PromptMode};
pub use loop_agent::{AgentSession, INCOMPLETE_ANALYSIS};
pub use tools::{register_cmop_tools, TerminationSignal, ToolRegistry, ToolTrait};

/// Errors fatal to the calling context
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("unknown tool '{name}'. Available: {available}")]
    UnknownTool { name: String, available: String },

    #[error("language model call failed: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
