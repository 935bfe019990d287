//! Connectivity summary across all backends.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::knowledge::KnowledgeBase;
use crate::clients::{ExecClient, WorkflowClient};
use crate::tools::tool::{Tool, ToolError, ToolOutcome, optional_str};

/// Echo a message with a one-line backend status summary.
pub struct TestConnectionTool {
    kb: KnowledgeBase,
    exec: Arc<ExecClient>,
    workflow: Arc<WorkflowClient>,
}

impl TestConnectionTool {
    pub fn new(kb: KnowledgeBase, exec: Arc<ExecClient>, workflow: Arc<WorkflowClient>) -> Self {
        Self { kb, exec, workflow }
    }
}

fn label(ok: bool, yes: &'static str, no: &'static str) -> &'static str {
    if ok { yes } else { no }
}

#[async_trait]
impl Tool for TestConnectionTool {
    fn name(&self) -> &str {
        "test_connection"
    }

    fn description(&self) -> &str {
        "Echo a message and report which backends are reachable or configured."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Text echoed back in the reply"}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let message = optional_str(&params, "message").unwrap_or("ping");
        let qdrant_up = self.kb.store.list_collections().await.is_ok();

        let text = format!(
            "OK! {} | Qdrant: {} | Embeddings: {} | N8N: {} | Exec: {}",
            message,
            label(qdrant_up, "connected", "disconnected"),
            label(self.kb.embedder.is_configured(), "configured", "missing"),
            label(self.workflow.is_configured(), "configured", "missing"),
            label(self.exec.is_configured(), "configured", "missing"),
        );
        Ok(ToolOutcome::Success(json!({"status": text})))
    }
}
