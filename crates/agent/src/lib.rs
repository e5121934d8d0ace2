//! Tool-augmented conversation core
//!
//! Translates a remote tool catalog into function declarations and runs the
//! bounded generate/dispatch loop that answers a single query.

use thiserror::Error;

pub mod catalog;
pub mod conversation;
pub mod loop_agent;
pub mod schema;

pub use catalog::{build_catalog, ToolCatalog, ToolDescriptor};
pub use conversation::{Conversation, Turn};
pub use loop_agent::{
    AgentLoop, LoopState, QueryOutcome, StopReason, EMPTY_RESPONSE_MESSAGE,
    ITERATION_LIMIT_MESSAGE, MAX_ITERATIONS, NO_RESPONSE_MESSAGE,
};
pub use schema::{normalize, NormalizedProperty, NormalizedSchema, ParamKind};

/// Agent errors. Only session startup can fail; queries always resolve to text.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("failed to load tool catalog: {0}")]
    Catalog(#[from] toolbridge_mcp::McpError),

    #[error("catalog serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
