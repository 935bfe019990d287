//! The `Tool` trait and the result shape every tool call produces.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Result of one tool call as seen by the remote caller.
///
/// Serializes to the success payload itself, to `{"warning": ...}` for a
/// declined destructive action, or to `{"error": ..., "detail": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Success(Value),
    Warning {
        warning: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ToolOutcome {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            warning: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
            detail: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<ToolError> for ToolOutcome {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidParameters(msg) => ToolOutcome::error(msg),
            ToolError::Failed(e) => ToolOutcome::Error {
                error: e.to_string(),
                detail: e.detail().map(String::from),
            },
        }
    }
}

/// Failure of a tool call before it could produce a result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Failed(#[from] crate::error::Error),
}

/// A named, remotely invokable operation with a declared argument schema.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the `arguments` object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError>;
}

/// Required, non-empty string argument.
pub fn require_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{name}' parameter")))
}

pub fn optional_str<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Integer argument with a default, clamped into `min..=max`.
pub fn int_or(params: &Value, name: &str, default: u64, min: u64, max: u64) -> u64 {
    params
        .get(name)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(default)
        .clamp(min, max)
}

pub fn bool_or(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
}
