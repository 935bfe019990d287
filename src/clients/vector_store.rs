//! Vector store abstraction and the shapes exchanged with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata stored alongside each knowledge vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl KnowledgePayload {
    pub fn new(title: &str, content: &str, category: &str, source: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            category: Some(category.to_string()),
            source: Some(source.to_string()),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// One vector plus its payload, ready for upsert.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: KnowledgePayload,
}

/// A search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub id: serde_json::Value,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<KnowledgePayload>,
}

impl ScoredPoint {
    /// Point ids come back as either UUID strings or integers.
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: Option<u64>,
    pub vectors_count: Option<u64>,
    pub status: String,
}

/// Collection and point lifecycle against a vector database.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Create a collection of fixed-width cosine vectors.
    async fn create_collection(&self, name: &str) -> Result<()>;

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo>;

    async fn delete_collection(&self, name: &str) -> Result<()>;

    async fn upsert_point(&self, collection: &str, point: Point) -> Result<()>;

    /// Nearest neighbours of `vector`, best first, at most `limit` of them.
    async fn search(&self, collection: &str, vector: Vec<f32>, limit: usize)
        -> Result<Vec<ScoredPoint>>;

    /// Remove a point. Removing an unknown id is not an error.
    async fn delete_point(&self, collection: &str, id: &str) -> Result<()>;
}

/// Canonical collection name: trimmed, lowercase, spaces and hyphens as `_`.
pub fn normalize_collection_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}
