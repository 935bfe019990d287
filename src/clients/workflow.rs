//! Client for the n8n workflow automation REST API (`/api/v1`).

use std::time::Duration;

use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::WorkflowConfig;
use crate::error::{Error, Result};

/// Workflow fields returned by list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub active: Option<bool>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

impl WorkflowSummary {
    fn from_document(doc: &Value) -> Self {
        Self {
            id: doc.get("id").cloned(),
            name: doc.get("name").and_then(Value::as_str).map(String::from),
            active: doc.get("active").and_then(Value::as_bool),
            updated_at: doc.get("updatedAt").and_then(Value::as_str).map(String::from),
        }
    }
}

/// Execution fields returned by list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub id: Option<Value>,
    #[serde(rename = "workflowId")]
    pub workflow_id: Option<Value>,
    pub status: Option<String>,
    #[serde(rename = "startedAt")]
    pub started_at: Option<String>,
    #[serde(rename = "stoppedAt")]
    pub stopped_at: Option<String>,
    pub finished: Option<bool>,
}

impl ExecutionSummary {
    fn from_document(doc: &Value) -> Self {
        let text = |key: &str| doc.get(key).and_then(Value::as_str).map(String::from);
        Self {
            id: doc.get("id").cloned(),
            workflow_id: doc.get("workflowId").cloned(),
            status: text("status"),
            started_at: text("startedAt"),
            stopped_at: text("stoppedAt"),
            finished: doc.get("finished").and_then(Value::as_bool),
        }
    }
}

/// Optional filters for [`WorkflowClient::list_executions`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionFilter {
    pub workflow_id: Option<String>,
    pub status: Option<String>,
    pub limit: u32,
}

pub struct WorkflowClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl WorkflowClient {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticated request against `{base}/api/v1{endpoint}`.
    ///
    /// A 2xx response with an empty body becomes `{"success": true}`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(Error::NotConfigured("N8N_API_KEY"))?;

        let timeout = timeout_for(&method);
        let url = format!("{}/api/v1{}", self.base_url, endpoint);
        tracing::debug!("n8n {} {}", method, url);

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header("X-N8N-API-KEY", api_key.expose_secret())
            .timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if method != Method::GET && method != Method::DELETE {
            builder = builder.json(&body.unwrap_or_else(|| json!({})));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_request(e, timeout.as_secs()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::from_request(e, timeout.as_secs()))?;

        if !status.is_success() {
            return Err(Error::http(status.as_u16(), &text));
        }
        if text.trim().is_empty() {
            return Ok(json!({"success": true}));
        }
        serde_json::from_str(&text).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    pub async fn list_workflows(&self, limit: u32) -> Result<Vec<WorkflowSummary>> {
        let result = self
            .request(Method::GET, "/workflows", &[("limit", limit.to_string())], None)
            .await?;
        Ok(data_items(&result)
            .iter()
            .map(WorkflowSummary::from_document)
            .collect())
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Value> {
        self.request(Method::GET, &workflow_path(id, ""), &[], None)
            .await
    }

    /// Create a workflow. The engine's `executionOrder` setting is fixed to `v1`.
    pub async fn create_workflow(
        &self,
        name: &str,
        nodes: Value,
        connections: Value,
        active: bool,
    ) -> Result<Value> {
        let body = json!({
            "name": name,
            "nodes": nodes,
            "connections": connections,
            "active": active,
            "settings": {"executionOrder": "v1"}
        });
        self.request(Method::POST, "/workflows", &[], Some(body))
            .await
    }

    pub async fn update_workflow(&self, id: &str, updates: Value) -> Result<Value> {
        self.request(Method::PUT, &workflow_path(id, ""), &[], Some(updates))
            .await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Value> {
        let action = if active { "/activate" } else { "/deactivate" };
        self.request(Method::POST, &workflow_path(id, action), &[], None)
            .await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<Value> {
        self.request(Method::DELETE, &workflow_path(id, ""), &[], None)
            .await
    }

    pub async fn run_workflow(&self, id: &str, data: Value) -> Result<Value> {
        self.request(Method::POST, &workflow_path(id, "/run"), &[], Some(data))
            .await
    }

    pub async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<ExecutionSummary>> {
        let mut query = vec![("limit", filter.limit.to_string())];
        if let Some(id) = &filter.workflow_id {
            query.push(("workflowId", id.clone()));
        }
        if let Some(status) = &filter.status {
            query.push(("status", status.clone()));
        }

        let result = self
            .request(Method::GET, "/executions", &query, None)
            .await?;
        Ok(data_items(&result)
            .iter()
            .map(ExecutionSummary::from_document)
            .collect())
    }

    pub async fn get_execution(&self, id: &str) -> Result<Value> {
        let path = format!("/executions/{}", urlencoding::encode(id));
        self.request(Method::GET, &path, &[], None).await
    }
}

fn timeout_for(method: &Method) -> Duration {
    if *method == Method::POST {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(30)
    }
}

fn workflow_path(id: &str, suffix: &str) -> String {
    format!("/workflows/{}{}", urlencoding::encode(id), suffix)
}

fn data_items(result: &Value) -> &[Value] {
    result
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
