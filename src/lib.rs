//! kb-mcp: an MCP server for agent knowledge, remote exec and workflows.
//!
//! Tools fall into three groups, each a thin facade over one external
//! service:
//!
//! - knowledge base: collections and semantic search over a Qdrant vector
//!   store, with embeddings from an OpenAI-compatible API
//! - remote exec: shell commands and file I/O through an HTTP exec API
//! - workflows: n8n workflow definitions and executions
//!
//! Every tool call yields a JSON object: the success payload, a
//! `{"warning": ...}` for declined destructive actions, or an
//! `{"error": ...}`. Nothing is retried and nothing is cached.

pub mod clients;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use tools::{ToolOutcome, ToolRegistry};
