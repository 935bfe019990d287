//! Process configuration.
//!
//! Read once at startup from the environment (after loading `.env` with
//! `dotenvy`) and handed to each client's constructor. Absent credentials
//! are kept as `None`; the dependent tools then report "not configured"
//! instead of preventing startup.

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Width of every vector stored by this server.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub embeddings: EmbeddingsConfig,
    pub exec: ExecConfig,
    pub workflow: WorkflowConfig,
}

/// Where the MCP HTTP transport binds.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Vector database (Qdrant REST) connection.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<SecretString>,
}

impl QdrantConfig {
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// Embedding provider (OpenAI-compatible `/embeddings` endpoint).
#[derive(Debug, Clone)]
pub struct EmbeddingsConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
}

/// Remote command execution API.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

/// Workflow automation (n8n) API.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            qdrant: QdrantConfig {
                host: "127.0.0.1".to_string(),
                port: 6333,
                api_key: None,
            },
            embeddings: EmbeddingsConfig {
                api_key: None,
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                model: DEFAULT_EMBEDDING_MODEL.to_string(),
            },
            exec: ExecConfig {
                base_url: "http://webtop:5000".to_string(),
                api_key: None,
            },
            workflow: WorkflowConfig {
                base_url: "http://localhost:5678".to_string(),
                api_key: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| get(key).map(SecretString::from);
        let defaults = Config::default();

        Ok(Self {
            server: ServerConfig {
                host: get("MCP_HTTP_HOST").unwrap_or(defaults.server.host),
                port: parse_port(get("MCP_HTTP_PORT"), "MCP_HTTP_PORT", defaults.server.port)?,
            },
            qdrant: QdrantConfig {
                host: get("QDRANT_HOST").unwrap_or(defaults.qdrant.host),
                port: parse_port(get("QDRANT_PORT"), "QDRANT_PORT", defaults.qdrant.port)?,
                api_key: secret("QDRANT_API_KEY"),
            },
            embeddings: EmbeddingsConfig {
                api_key: secret("OPENAI_API_KEY"),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.embeddings.base_url),
                model: get("EMBEDDING_MODEL").unwrap_or(defaults.embeddings.model),
            },
            exec: ExecConfig {
                base_url: get("WEBTOP_API_URL").unwrap_or(defaults.exec.base_url),
                api_key: secret("WEBTOP_API_KEY"),
            },
            workflow: WorkflowConfig {
                base_url: get("N8N_BASE_URL").unwrap_or(defaults.workflow.base_url),
                api_key: secret("N8N_API_KEY"),
            },
        })
    }
}

fn parse_port(value: Option<String>, key: &str, default: u16) -> Result<u16> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a port number, got '{raw}'"))),
    }
}
