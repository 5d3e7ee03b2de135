//! Core engine for a tool-augmented conversational agent.
//!
//! A [`ConversationSession`] drives multi-turn exchanges with a tool-calling
//! [`Backend`]: the model requests tool invocations, each one passes through
//! the [`PermissionGate`] (with interactive confirmation for write
//! operations), and results flow back until the model produces final text.
//! Context-overflow failures from the backend are classified, the offending
//! output is re-truncated, and a corrective turn steers the model toward a
//! narrower retry — bounded by a configurable attempt budget.
//!
//! The embedding surface supplies the three external collaborators: a
//! [`Backend`] implementation, [`Tool`] executors, and a [`Prompter`] for
//! interactive confirmation.

pub mod backend;
pub mod classify;
pub mod config;
pub mod decision_log;
pub mod error;
pub mod hooks;
pub mod permission;
pub mod prompt;
pub mod recovery;
pub mod session;
pub mod spool;
pub mod tool;
pub mod truncate;

pub use backend::Backend;
pub use backend::types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, Role, StopReason, ToolCall,
    ToolDefinition, ToolResult,
};
pub use classify::ErrorKind;
pub use config::{LiaisonConfig, RetryConfig, SpoolConfig};
pub use decision_log::{DecisionLog, DecisionRecord, InMemoryDecisionLog};
pub use error::Error;
pub use hooks::{HookAction, HookSet};
pub use permission::{
    PermissionDecision, PermissionGate, PermissionOutcome, Resolution,
};
pub use prompt::Prompter;
pub use session::{ConversationSession, SessionBuilder, SessionChunk};
pub use tool::{Tool, ToolOutput, ToolRegistry};
