//! Knowledge base tools backed by the vector store.
//!
//! Collection names are normalized (see [`normalize_collection_name`]) by
//! every tool that addresses a collection, so `"My Notes"` and `"my-notes"`
//! always reach the same collection.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::clients::{Embedder, KnowledgePayload, Point, VectorStore, normalize_collection_name};
use crate::error::{Error, truncate_chars};
use crate::tools::tool::{Tool, ToolError, ToolOutcome, bool_or, int_or, optional_str, require_str};

/// Characters of content returned per search hit.
pub const CONTENT_PREVIEW_CHARS: usize = 500;

pub const DEFAULT_SEARCH_LIMIT: u64 = 5;
pub const MAX_SEARCH_LIMIT: u64 = 100;

const EMBEDDINGS_MISSING: &str = "Embedding provider";

/// Clients shared by all knowledge tools.
#[derive(Clone)]
pub struct KnowledgeBase {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    fn require_embedder(&self) -> Result<(), ToolError> {
        if self.embedder.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured(EMBEDDINGS_MISSING).into())
        }
    }
}

/// A simplified search hit for internal callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeMatch {
    pub title: String,
    pub content: String,
    pub score: f32,
}

/// Embed-then-query that never fails: any problem yields an empty list.
pub async fn search_internal(
    kb: &KnowledgeBase,
    collection: &str,
    query: &str,
    limit: usize,
) -> Vec<KnowledgeMatch> {
    let collection = normalize_collection_name(collection);
    let Some(vector) = kb.embedder.embed(query).await else {
        tracing::warn!("Internal search skipped: no embedding for query");
        return Vec::new();
    };

    match kb.store.search(&collection, vector, limit).await {
        Ok(points) => points
            .into_iter()
            .take(limit)
            .map(|p| {
                let payload = p.payload.unwrap_or_default();
                KnowledgeMatch {
                    title: payload.title.unwrap_or_else(|| "Untitled".to_string()),
                    content: payload.content.unwrap_or_default(),
                    score: p.score,
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Internal search in '{}' failed: {}", collection, e);
            Vec::new()
        }
    }
}

fn round4(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}

// ---------------------------------------------------------------------------
// list_collections
// ---------------------------------------------------------------------------

/// List collection names in the vector store.
pub struct ListCollectionsTool {
    kb: KnowledgeBase,
}

impl ListCollectionsTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for ListCollectionsTool {
    fn name(&self) -> &str {
        "list_collections"
    }

    fn description(&self) -> &str {
        "List all available knowledge base collections."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutcome, ToolError> {
        let collections = self.kb.store.list_collections().await?;
        Ok(ToolOutcome::Success(json!({"collections": collections})))
    }
}

// ---------------------------------------------------------------------------
// create_collection
// ---------------------------------------------------------------------------

/// Create a collection under its normalized name, refusing duplicates.
pub struct CreateCollectionTool {
    kb: KnowledgeBase,
}

impl CreateCollectionTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for CreateCollectionTool {
    fn name(&self) -> &str {
        "create_collection"
    }

    fn description(&self) -> &str {
        "Create a new knowledge base collection. The name is normalized to lowercase \
         with spaces and hyphens replaced by underscores."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Collection name"}
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let name = normalize_collection_name(require_str(&params, "name")?);

        let existing = self.kb.store.list_collections().await?;
        if existing.iter().any(|c| *c == name) {
            return Ok(ToolOutcome::error(format!("Collection '{name}' already exists")));
        }

        self.kb.store.create_collection(&name).await?;
        tracing::info!("Created collection '{}'", name);
        Ok(ToolOutcome::Success(json!({"success": true, "collection": name})))
    }
}

// ---------------------------------------------------------------------------
// get_collection_stats
// ---------------------------------------------------------------------------

/// Report point count and status of one collection.
pub struct CollectionStatsTool {
    kb: KnowledgeBase,
}

impl CollectionStatsTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for CollectionStatsTool {
    fn name(&self) -> &str {
        "get_collection_stats"
    }

    fn description(&self) -> &str {
        "Get point count and status for a collection."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection": {"type": "string", "description": "Collection name"}
            },
            "required": ["collection"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let name = normalize_collection_name(require_str(&params, "collection")?);
        let info = self.kb.store.collection_info(&name).await?;
        Ok(ToolOutcome::Success(json!({
            "name": info.name,
            "points_count": info.points_count,
            "vectors_count": info.vectors_count,
            "status": info.status,
        })))
    }
}

// ---------------------------------------------------------------------------
// delete_collection
// ---------------------------------------------------------------------------

/// Drop a collection, only when `confirm` is true.
pub struct DeleteCollectionTool {
    kb: KnowledgeBase,
}

impl DeleteCollectionTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for DeleteCollectionTool {
    fn name(&self) -> &str {
        "delete_collection"
    }

    fn description(&self) -> &str {
        "Delete a collection and everything in it. Requires confirm=true; \
         without it nothing is deleted and a warning is returned."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Collection name"},
                "confirm": {"type": "boolean", "description": "Must be true to actually delete", "default": false}
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let name = normalize_collection_name(require_str(&params, "name")?);
        if !bool_or(&params, "confirm", false) {
            return Ok(ToolOutcome::warning(format!(
                "Will delete '{name}'! Call with confirm=True to proceed"
            )));
        }

        self.kb.store.delete_collection(&name).await?;
        tracing::info!("Deleted collection '{}'", name);
        Ok(ToolOutcome::Success(json!({"success": true, "deleted": name})))
    }
}

// ---------------------------------------------------------------------------
// add_knowledge
// ---------------------------------------------------------------------------

/// Embed and store one knowledge entry under a fresh point id.
pub struct AddKnowledgeTool {
    kb: KnowledgeBase,
}

impl AddKnowledgeTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for AddKnowledgeTool {
    fn name(&self) -> &str {
        "add_knowledge"
    }

    fn description(&self) -> &str {
        "Add a knowledge entry to a collection. The title and content are embedded \
         automatically for later semantic search."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection": {"type": "string", "description": "Target collection"},
                "title": {"type": "string", "description": "Short title of the entry"},
                "content": {"type": "string", "description": "Full text of the entry"},
                "category": {"type": "string", "description": "Category label", "default": "general"},
                "source": {"type": "string", "description": "Where this knowledge came from", "default": "conversation"}
            },
            "required": ["collection", "title", "content"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let collection = normalize_collection_name(require_str(&params, "collection")?);
        let title = require_str(&params, "title")?;
        let content = require_str(&params, "content")?;
        let category = optional_str(&params, "category").unwrap_or("general");
        let source = optional_str(&params, "source").unwrap_or("conversation");

        self.kb.require_embedder()?;

        let Some(vector) = self.kb.embedder.embed(&format!("{title}\n\n{content}")).await else {
            return Ok(ToolOutcome::error("Failed to generate embedding"));
        };

        let point_id = uuid::Uuid::new_v4().to_string();
        let point = Point {
            id: point_id.clone(),
            vector,
            payload: KnowledgePayload::new(title, content, category, source),
        };
        self.kb.store.upsert_point(&collection, point).await?;

        tracing::info!("Stored knowledge '{}' in '{}'", title, collection);
        Ok(ToolOutcome::Success(json!({
            "success": true,
            "point_id": point_id,
            "title": title,
            "collection": collection,
        })))
    }
}

// ---------------------------------------------------------------------------
// search_knowledge
// ---------------------------------------------------------------------------

/// Semantic search over one collection, best match first.
pub struct SearchKnowledgeTool {
    kb: KnowledgeBase,
}

impl SearchKnowledgeTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeTool {
    fn name(&self) -> &str {
        "search_knowledge"
    }

    fn description(&self) -> &str {
        "Search a collection by semantic similarity. Returns the best matches, \
         highest score first, with a preview of each entry's content."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection": {"type": "string", "description": "Collection to search"},
                "query": {"type": "string", "description": "Natural language query"},
                "limit": {"type": "integer", "description": "Maximum results (default: 5)", "default": DEFAULT_SEARCH_LIMIT}
            },
            "required": ["collection", "query"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let start = Instant::now();
        let collection = normalize_collection_name(require_str(&params, "collection")?);
        let query = require_str(&params, "query")?;
        let limit = int_or(&params, "limit", DEFAULT_SEARCH_LIMIT, 0, MAX_SEARCH_LIMIT) as usize;
        if limit == 0 {
            return Ok(ToolOutcome::Success(json!({"count": 0, "results": []})));
        }

        self.kb.require_embedder()?;

        let Some(vector) = self.kb.embedder.embed(query).await else {
            return Ok(ToolOutcome::error("Failed to generate query embedding"));
        };

        let mut points = self.kb.store.search(&collection, vector, limit).await?;
        points.sort_by(|a, b| b.score.total_cmp(&a.score));
        points.truncate(limit);

        let results: Vec<Value> = points
            .into_iter()
            .map(|p| {
                let point_id = p.id_string();
                let payload = p.payload.unwrap_or_default();
                let content = payload.content.unwrap_or_default();
                json!({
                    "score": round4(p.score),
                    "title": payload.title.unwrap_or_else(|| "Untitled".to_string()),
                    "content": truncate_chars(&content, CONTENT_PREVIEW_CHARS),
                    "category": payload.category,
                    "source": payload.source,
                    "point_id": point_id,
                })
            })
            .collect();

        tracing::debug!(
            count = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search_knowledge in '{}'",
            collection
        );
        Ok(ToolOutcome::Success(json!({"count": results.len(), "results": results})))
    }
}

// ---------------------------------------------------------------------------
// delete_knowledge
// ---------------------------------------------------------------------------

/// Remove one point by id.
pub struct DeleteKnowledgeTool {
    kb: KnowledgeBase,
}

impl DeleteKnowledgeTool {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for DeleteKnowledgeTool {
    fn name(&self) -> &str {
        "delete_knowledge"
    }

    fn description(&self) -> &str {
        "Delete a knowledge entry by point ID."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "collection": {"type": "string", "description": "Collection holding the entry"},
                "point_id": {"type": "string", "description": "ID returned by add_knowledge"}
            },
            "required": ["collection", "point_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutcome, ToolError> {
        let collection = normalize_collection_name(require_str(&params, "collection")?);
        let point_id = require_str(&params, "point_id")?;

        self.kb.store.delete_point(&collection, point_id).await?;
        Ok(ToolOutcome::Success(json!({"success": true, "deleted": point_id})))
    }
}
