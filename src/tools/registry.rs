//! Tool registry: name → tool lookup, definitions for `tools/list`, dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::{ExecClient, OpenAiEmbedder, QdrantStore, WorkflowClient};
use crate::config::Config;
use crate::tools::builtin::*;
use crate::tools::tool::{Tool, ToolOutcome};

/// Tool metadata as advertised over MCP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::with_capacity(32),
        }
    }

    /// Registry wired to the real backends described by `config`.
    pub fn with_builtin(config: &Config) -> Self {
        let kb = KnowledgeBase::new(
            Arc::new(QdrantStore::new(&config.qdrant)),
            Arc::new(OpenAiEmbedder::new(&config.embeddings)),
        );
        Self::from_parts(
            kb,
            Arc::new(ExecClient::new(&config.exec)),
            Arc::new(WorkflowClient::new(&config.workflow)),
        )
    }

    /// Registry over caller-supplied clients.
    pub fn from_parts(
        kb: KnowledgeBase,
        exec: Arc<ExecClient>,
        workflow: Arc<WorkflowClient>,
    ) -> Self {
        let mut registry = Self::new();

        // Knowledge base
        registry.register(Arc::new(ListCollectionsTool::new(kb.clone())));
        registry.register(Arc::new(CreateCollectionTool::new(kb.clone())));
        registry.register(Arc::new(CollectionStatsTool::new(kb.clone())));
        registry.register(Arc::new(DeleteCollectionTool::new(kb.clone())));
        registry.register(Arc::new(AddKnowledgeTool::new(kb.clone())));
        registry.register(Arc::new(SearchKnowledgeTool::new(kb.clone())));
        registry.register(Arc::new(DeleteKnowledgeTool::new(kb.clone())));
        registry.register(Arc::new(TroubleshootTool::new(kb.clone())));

        // Remote exec
        registry.register(Arc::new(ExecCommandTool::new(exec.clone())));
        registry.register(Arc::new(ReadFileTool::new(exec.clone())));
        registry.register(Arc::new(WriteFileTool::new(exec.clone())));
        registry.register(Arc::new(ListDirectoryTool::new(exec.clone())));

        // Workflows
        registry.register(Arc::new(ListWorkflowsTool::new(workflow.clone())));
        registry.register(Arc::new(GetWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(CreateWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(UpdateWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(ActivateWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(DeleteWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(ExecuteWorkflowTool::new(workflow.clone())));
        registry.register(Arc::new(ListExecutionsTool::new(workflow.clone())));
        registry.register(Arc::new(GetExecutionTool::new(workflow.clone())));
        registry.register(Arc::new(WorkflowConnectionTool::new(workflow.clone())));

        registry.register(Arc::new(TestConnectionTool::new(kb, exec, workflow)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Run a tool by name. `None` if no such tool is registered.
    ///
    /// Tool failures are folded into [`ToolOutcome::Error`]; callers always
    /// get a JSON-shaped result.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<ToolOutcome> {
        let tool = self.tools.get(name)?;
        let start = Instant::now();

        let arguments = if arguments.is_null() {
            Value::Object(Default::default())
        } else {
            arguments
        };

        let outcome = match tool.execute(arguments).await {
            Ok(outcome) => outcome,
            Err(e) => e.into(),
        };

        let kind = match &outcome {
            ToolOutcome::Success(_) => "success",
            ToolOutcome::Warning { .. } => "warning",
            ToolOutcome::Error { .. } => "error",
        };
        tracing::info!(
            tool = name,
            outcome = kind,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        Some(outcome)
    }
}
