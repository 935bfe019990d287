//! Tool surface: the trait, the registry and the built-in tools.

pub mod builtin;
pub mod registry;
pub mod tool;

pub use registry::{ToolDefinition, ToolRegistry};
pub use tool::{Tool, ToolError, ToolOutcome};
