//! Core generation logic for postcrew.
//!
//! Builds the role-bound task pipeline, runs it against an agent runtime,
//! and turns the final output into a persisted post.

pub mod generator;
pub mod library;
pub mod llm;
pub mod sentiment;
pub mod tasks;

pub use generator::{Generator, ProgressReporter, SilentProgress};
pub use library::{Library, require_selection};
pub use llm::{AgentRuntime, GeminiRuntime, TaskInvocation, ToolOutput};
pub use tasks::{build_tasks, validate_dependencies};
