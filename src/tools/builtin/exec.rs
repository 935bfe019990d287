//! Remote shell and file tools over the exec API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::clients::ExecClient;
use crate::clients::exec::{DEFAULT_EXEC_TIMEOUT, DEFAULT_LIST_PATH};
use crate::tools::tool::{Tool, ToolError, ToolOutcome, int_or, optional_str, require_str};

const MAX_EXEC_TIMEOUT_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// exec_command
// ---------------------------------------------------------------------------

/// Run a shell command on the remote host.
pub struct ExecCommandTool {
    client: Arc<ExecClient>,
}

impl ExecCommandTool {
    pub fn new(client: Arc<ExecClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ExecCommandTool {
    fn name(&self) -> &str {
        "exec_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command on the remote host. Returns stdout, stderr and returncode."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "cmd": {"type": "string", "description": "The shell command to execute"},
                "timeout": {
                    "type": "integer",
                    "description": "Command timeout in seconds (default: 300)",
                    "default": DEFAULT_EXEC_TIMEOUT.as_secs()
                }
            },
            "required": ["cmd"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let cmd = require_str(&params, "cmd")?;
        let secs = int_or(
            &params,
            "timeout",
            DEFAULT_EXEC_TIMEOUT.as_secs(),
            1,
            MAX_EXEC_TIMEOUT_SECS,
        );

        let output = self.client.exec(cmd, Duration::from_secs(secs)).await?;
        Ok(ToolOutcome::Success(json!({
            "stdout": output.stdout,
            "stderr": output.stderr,
            "returncode": output.returncode,
        })))
    }
}

// ---------------------------------------------------------------------------
// read_file
// ---------------------------------------------------------------------------

/// Read a remote file through `cat`.
pub struct ReadFileTool {
    client: Arc<ExecClient>,
}

impl ReadFileTool {
    pub fn new(client: Arc<ExecClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file on the remote host."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filepath": {"type": "string", "description": "Absolute path to the file"}
            },
            "required": ["filepath"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let filepath = require_str(&params, "filepath")?;
        let output = self.client.read_file(filepath).await?;
        if !output.success() {
            return Ok(ToolOutcome::error(output.failure_message()));
        }
        Ok(ToolOutcome::Success(json!({
            "content": output.stdout,
            "filepath": filepath,
        })))
    }
}

// ---------------------------------------------------------------------------
// write_file
// ---------------------------------------------------------------------------

/// Replace a remote file with the given content.
pub struct WriteFileTool {
    client: Arc<ExecClient>,
}

impl WriteFileTool {
    pub fn new(client: Arc<ExecClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file on the remote host, replacing any existing file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filepath": {"type": "string", "description": "Absolute path to the file"},
                "content": {"type": "string", "description": "Content to write"}
            },
            "required": ["filepath", "content"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let filepath = require_str(&params, "filepath")?;
        // Empty content is a valid write (truncates the file).
        let content = params
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidParameters("missing 'content' parameter".into()))?;

        let output = self.client.write_file(filepath, content).await?;
        if !output.success() {
            return Ok(ToolOutcome::error(output.failure_message()));
        }
        Ok(ToolOutcome::Success(json!({"success": true, "filepath": filepath})))
    }
}

// ---------------------------------------------------------------------------
// list_directory
// ---------------------------------------------------------------------------

/// List a remote directory (`ls -la`).
pub struct ListDirectoryTool {
    client: Arc<ExecClient>,
}

impl ListDirectoryTool {
    pub fn new(client: Arc<ExecClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the contents of a directory on the remote host (ls -la)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Directory path (default: /config)", "default": DEFAULT_LIST_PATH}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let path = optional_str(&params, "path").unwrap_or(DEFAULT_LIST_PATH);
        let output = self.client.list_directory(path).await?;
        if !output.success() {
            return Ok(ToolOutcome::error(output.failure_message()));
        }
        Ok(ToolOutcome::Success(json!({"listing": output.stdout, "path": path})))
    }
}
