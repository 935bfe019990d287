//! n8n workflow management tools.
//!
//! Each tool relays one request to the workflow engine. Deleting a workflow
//! is guarded: without `confirm: true` the tool only returns a warning.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::clients::{ExecutionFilter, WorkflowClient};
use crate::tools::tool::{Tool, ToolError, ToolOutcome, bool_or, int_or, optional_str, require_str};

fn id_schema(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn require_object(params: &Value, name: &str) -> Result<Value, ToolError> {
    match params.get(name) {
        Some(v @ Value::Object(_)) => Ok(v.clone()),
        Some(_) => Err(ToolError::InvalidParameters(format!("'{name}' must be an object"))),
        None => Err(ToolError::InvalidParameters(format!("missing '{name}' parameter"))),
    }
}

// ---------------------------------------------------------------------------
// n8n_list_workflows
// ---------------------------------------------------------------------------

/// List workflow summaries, optionally only active ones.
pub struct ListWorkflowsTool {
    client: Arc<WorkflowClient>,
}

impl ListWorkflowsTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListWorkflowsTool {
    fn name(&self) -> &str {
        "n8n_list_workflows"
    }

    fn description(&self) -> &str {
        "List n8n workflows with id, name, active status and last update time."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "description": "Maximum workflows to return (default: 50)", "default": 50},
                "active_only": {"type": "boolean", "description": "Only show active workflows", "default": false}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let limit = int_or(&params, "limit", 50, 1, 250) as u32;
        let active_only = bool_or(&params, "active_only", false);

        let mut workflows = self.client.list_workflows(limit).await?;
        if active_only {
            workflows.retain(|w| w.active == Some(true));
        }
        Ok(ToolOutcome::Success(json!({
            "workflows": workflows,
            "count": workflows.len(),
        })))
    }
}

// ---------------------------------------------------------------------------
// n8n_get_workflow
// ---------------------------------------------------------------------------

/// Fetch one full workflow document.
pub struct GetWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl GetWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWorkflowTool {
    fn name(&self) -> &str {
        "n8n_get_workflow"
    }

    fn description(&self) -> &str {
        "Get the full workflow document including nodes, connections and settings."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"workflow_id": id_schema("The workflow ID")},
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "workflow_id")?;
        Ok(ToolOutcome::Success(self.client.get_workflow(id).await?))
    }
}

// ---------------------------------------------------------------------------
// n8n_create_workflow
// ---------------------------------------------------------------------------

/// Create a workflow from nodes and connections.
pub struct CreateWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl CreateWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateWorkflowTool {
    fn name(&self) -> &str {
        "n8n_create_workflow"
    }

    fn description(&self) -> &str {
        "Create a new n8n workflow from node definitions and their connections."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Workflow name"},
                "nodes": {"type": "array", "items": {"type": "object"}, "description": "List of node definitions"},
                "connections": {"type": "object", "description": "Node connections object"},
                "active": {"type": "boolean", "description": "Whether to activate immediately", "default": false}
            },
            "required": ["name", "nodes", "connections"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let name = require_str(&params, "name")?;
        let nodes = match params.get("nodes") {
            Some(v @ Value::Array(_)) => v.clone(),
            _ => return Err(ToolError::InvalidParameters("'nodes' must be an array".into())),
        };
        let connections = require_object(&params, "connections")?;
        let active = bool_or(&params, "active", false);

        let created = self
            .client
            .create_workflow(name, nodes, connections, active)
            .await?;
        tracing::info!("Created workflow '{}'", name);
        Ok(ToolOutcome::Success(created))
    }
}

// ---------------------------------------------------------------------------
// n8n_update_workflow
// ---------------------------------------------------------------------------

/// Apply a partial update to a workflow.
pub struct UpdateWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl UpdateWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateWorkflowTool {
    fn name(&self) -> &str {
        "n8n_update_workflow"
    }

    fn description(&self) -> &str {
        "Update fields of an existing workflow (name, nodes, connections, active, settings)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": id_schema("The workflow ID"),
                "updates": {"type": "object", "description": "Fields to update"}
            },
            "required": ["workflow_id", "updates"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "workflow_id")?;
        let updates = require_object(&params, "updates")?;
        Ok(ToolOutcome::Success(
            self.client.update_workflow(id, updates).await?,
        ))
    }
}

// ---------------------------------------------------------------------------
// n8n_activate_workflow
// ---------------------------------------------------------------------------

/// Activate or deactivate a workflow.
pub struct ActivateWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl ActivateWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ActivateWorkflowTool {
    fn name(&self) -> &str {
        "n8n_activate_workflow"
    }

    fn description(&self) -> &str {
        "Activate or deactivate a workflow."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": id_schema("The workflow ID"),
                "active": {"type": "boolean", "description": "True to activate, false to deactivate", "default": true}
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "workflow_id")?;
        let active = bool_or(&params, "active", true);
        Ok(ToolOutcome::Success(self.client.set_active(id, active).await?))
    }
}

// ---------------------------------------------------------------------------
// n8n_delete_workflow
// ---------------------------------------------------------------------------

/// Delete a workflow, only when `confirm` is true.
pub struct DeleteWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl DeleteWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteWorkflowTool {
    fn name(&self) -> &str {
        "n8n_delete_workflow"
    }

    fn description(&self) -> &str {
        "Delete a workflow. Requires confirm=true; without it nothing is deleted \
         and a warning is returned."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": id_schema("The workflow ID"),
                "confirm": {"type": "boolean", "description": "Must be true to actually delete", "default": false}
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "workflow_id")?;
        if !bool_or(&params, "confirm", false) {
            return Ok(ToolOutcome::warning(format!(
                "Will DELETE workflow {id}! Set confirm=True to proceed"
            )));
        }

        let result = self.client.delete_workflow(id).await?;
        tracing::info!("Deleted workflow {}", id);
        Ok(ToolOutcome::Success(result))
    }
}

// ---------------------------------------------------------------------------
// n8n_execute_workflow
// ---------------------------------------------------------------------------

/// Trigger a manual workflow run.
pub struct ExecuteWorkflowTool {
    client: Arc<WorkflowClient>,
}

impl ExecuteWorkflowTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ExecuteWorkflowTool {
    fn name(&self) -> &str {
        "n8n_execute_workflow"
    }

    fn description(&self) -> &str {
        "Manually trigger a workflow run, optionally passing input data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": id_schema("The workflow ID"),
                "data": {"type": "object", "description": "Optional input data for the workflow"}
            },
            "required": ["workflow_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "workflow_id")?;
        let data = match params.get("data") {
            None | Some(Value::Null) => json!({}),
            Some(_) => require_object(&params, "data")?,
        };
        Ok(ToolOutcome::Success(self.client.run_workflow(id, data).await?))
    }
}

// ---------------------------------------------------------------------------
// n8n_list_executions
// ---------------------------------------------------------------------------

/// List run history, filtered by workflow or status.
pub struct ListExecutionsTool {
    client: Arc<WorkflowClient>,
}

impl ListExecutionsTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListExecutionsTool {
    fn name(&self) -> &str {
        "n8n_list_executions"
    }

    fn description(&self) -> &str {
        "List workflow executions (run history) with status and timing."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": id_schema("Only executions of this workflow"),
                "limit": {"type": "integer", "description": "Maximum results (default: 20)", "default": 20},
                "status": {"type": "string", "enum": ["success", "error", "waiting"], "description": "Only executions with this status"}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let filter = ExecutionFilter {
            workflow_id: optional_str(&params, "workflow_id").map(String::from),
            status: optional_str(&params, "status").map(String::from),
            limit: int_or(&params, "limit", 20, 1, 250) as u32,
        };

        let executions = self.client.list_executions(&filter).await?;
        Ok(ToolOutcome::Success(json!({
            "executions": executions,
            "count": executions.len(),
        })))
    }
}

// ---------------------------------------------------------------------------
// n8n_get_execution
// ---------------------------------------------------------------------------

/// Fetch one execution with its node results.
pub struct GetExecutionTool {
    client: Arc<WorkflowClient>,
}

impl GetExecutionTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetExecutionTool {
    fn name(&self) -> &str {
        "n8n_get_execution"
    }

    fn description(&self) -> &str {
        "Get execution details including node results and error messages."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"execution_id": id_schema("The execution ID")},
            "required": ["execution_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let id = require_str(&params, "execution_id")?;
        Ok(ToolOutcome::Success(self.client.get_execution(id).await?))
    }
}

// ---------------------------------------------------------------------------
// n8n_test_connection
// ---------------------------------------------------------------------------

/// Check that the workflow API accepts the configured key.
pub struct WorkflowConnectionTool {
    client: Arc<WorkflowClient>,
}

impl WorkflowConnectionTool {
    pub fn new(client: Arc<WorkflowClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WorkflowConnectionTool {
    fn name(&self) -> &str {
        "n8n_test_connection"
    }

    fn description(&self) -> &str {
        "Check that the n8n API is reachable with the configured key."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutcome, ToolError> {
        match self.client.list_workflows(1).await {
            Ok(_) => Ok(ToolOutcome::Success(json!({
                "status": "connected",
                "base_url": self.client.base_url(),
            }))),
            Err(e) => Ok(ToolOutcome::Success(json!({
                "status": "error",
                "message": e.to_string(),
            }))),
        }
    }
}
