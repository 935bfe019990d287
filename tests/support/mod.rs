//! Shared fixtures: in-memory backends and axum mock servers.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, post};
use secrecy::SecretString;
use serde_json::{Value, json};

use kb_mcp::clients::{
    CollectionInfo, Embedder, ExecClient, KnowledgePayload, Point, ScoredPoint, VectorStore,
    WorkflowClient,
};
use kb_mcp::config::{ExecConfig, WorkflowConfig};
use kb_mcp::error::{Error, Result};
use kb_mcp::tools::ToolRegistry;
use kb_mcp::tools::builtin::KnowledgeBase;

pub const EXEC_KEY: &str = "exec-secret";
pub const N8N_KEY: &str = "n8n-secret";

/// Serve `router` on an ephemeral loopback port, returning its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub const DEAD_URL: &str = "http://127.0.0.1:9";

// ---------------------------------------------------------------------------
// Stub embedder
// ---------------------------------------------------------------------------

const STUB_DIMS: usize = 64;

/// Deterministic bag-of-words embedding; counts calls.
pub struct StubEmbedder {
    configured: bool,
    pub calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            configured: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn stub_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; STUB_DIMS];
    for word in text.split_whitespace() {
        let mut hasher = DefaultHasher::new();
        word.to_lowercase().hash(&mut hasher);
        v[(hasher.finish() as usize) % STUB_DIMS] += 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return None;
        }
        Some(stub_vector(text))
    }
}

// ---------------------------------------------------------------------------
// In-memory vector store
// ---------------------------------------------------------------------------

/// Cosine-similarity store over a map of collections; counts calls.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Vec<Point>>>,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(name: &str) -> Self {
        let store = Self::default();
        store
            .collections
            .lock()
            .unwrap()
            .insert(name.to_string(), Vec::new());
        store
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn names(&self) -> Vec<String> {
        self.collections.lock().unwrap().keys().cloned().collect()
    }

    pub fn points(&self, collection: &str) -> Vec<Point> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert a point with a hand-picked vector.
    pub fn insert_raw(&self, collection: &str, id: &str, vector: Vec<f32>, title: &str) {
        let point = Point {
            id: id.to_string(),
            vector,
            payload: KnowledgePayload::new(title, &format!("{title} body"), "general", "test"),
        };
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(point);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        self.touch();
        Ok(self.names())
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        self.touch();
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(name) {
            return Err(Error::Conflict(format!("Collection '{name}' already exists")));
        }
        collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        self.touch();
        let collections = self.collections.lock().unwrap();
        let points = collections
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Collection '{name}'")))?;
        Ok(CollectionInfo {
            name: name.to_string(),
            points_count: Some(points.len() as u64),
            vectors_count: None,
            status: "green".to_string(),
        })
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.touch();
        self.collections.lock().unwrap().remove(name);
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: Point) -> Result<()> {
        self.touch();
        let mut collections = self.collections.lock().unwrap();
        let points = collections
            .get_mut(collection)
            .ok_or_else(|| Error::NotFound(format!("Collection '{collection}'")))?;
        points.retain(|p| p.id != point.id);
        points.push(point);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        self.touch();
        let collections = self.collections.lock().unwrap();
        let points = collections
            .get(collection)
            .ok_or_else(|| Error::NotFound(format!("Collection '{collection}'")))?;
        let mut scored: Vec<ScoredPoint> = points
            .iter()
            .map(|p| ScoredPoint {
                id: json!(p.id),
                score: cosine(&vector, &p.vector),
                payload: Some(p.payload.clone()),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_point(&self, collection: &str, id: &str) -> Result<()> {
        self.touch();
        if let Some(points) = self.collections.lock().unwrap().get_mut(collection) {
            points.retain(|p| p.id != id);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request recorder shared by mock HTTP services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn all(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn record(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: &str) {
        let headers = headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        self.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(String::from),
            headers,
            body: serde_json::from_str(body).unwrap_or(Value::Null),
        });
    }
}

// ---------------------------------------------------------------------------
// Mock exec API
// ---------------------------------------------------------------------------

/// `POST /exec` that understands a few commands:
/// `sleep N` waits N seconds, `fail` exits 1 with stderr, `killed` has a
/// null exit code, `garbled` replies without one, `boom` returns HTTP 500,
/// anything else echoes the command on stdout.
pub async fn spawn_exec_api() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/exec", post(exec_handler))
        .with_state(recorder.clone());
    (spawn(router).await, recorder)
}

async fn exec_handler(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri, &headers, &body);

    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(EXEC_KEY) {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    let cmd = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("cmd").and_then(Value::as_str).map(String::from))
        .unwrap_or_default();

    if let Some(secs) = cmd.strip_prefix("sleep ") {
        let secs: u64 = secs.trim().parse().unwrap_or(1);
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
    if cmd == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(2_000)).into_response();
    }
    if cmd == "garbled" {
        return Json(json!({"error": "worker crashed"})).into_response();
    }
    if cmd == "killed" || cmd.contains("/killed") {
        return Json(json!({"stdout": "", "stderr": "", "returncode": null})).into_response();
    }
    if cmd == "fail" || cmd.contains("/missing") {
        return Json(json!({"stdout": "", "stderr": "No such file or directory", "returncode": 1}))
            .into_response();
    }
    Json(json!({"stdout": cmd, "stderr": "", "returncode": 0})).into_response()
}

pub fn exec_client(base_url: &str, key: Option<&str>) -> ExecClient {
    ExecClient::new(&ExecConfig {
        base_url: base_url.to_string(),
        api_key: key.map(|k| SecretString::from(k.to_string())),
    })
}

// ---------------------------------------------------------------------------
// Mock n8n API
// ---------------------------------------------------------------------------

/// Minimal n8n: two workflows, one execution, records every request.
pub async fn spawn_n8n_api() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/api/v1/{*rest}", any(n8n_handler))
        .with_state(recorder.clone());
    (spawn(router).await, recorder)
}

async fn n8n_handler(
    State(recorder): State<Recorder>,
    Path(rest): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri, &headers, &body);

    if headers.get("x-n8n-api-key").and_then(|v| v.to_str().ok()) != Some(N8N_KEY) {
        return (StatusCode::UNAUTHORIZED, r#"{"message":"unauthorized"}"#).into_response();
    }

    let segments: Vec<&str> = rest.split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["workflows"]) => Json(json!({
            "data": [
                {"id": "1", "name": "Backup", "active": true, "updatedAt": "2026-01-01T00:00:00.000Z", "nodes": []},
                {"id": "2", "name": "Draft", "active": false, "updatedAt": "2026-01-02T00:00:00.000Z", "nodes": []}
            ],
            "nextCursor": null
        }))
        .into_response(),
        ("POST", ["workflows"]) => {
            let mut doc: Value = serde_json::from_str(&body).unwrap_or(json!({}));
            doc["id"] = json!("99");
            Json(doc).into_response()
        }
        ("GET", ["workflows", "404"]) => {
            (StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#).into_response()
        }
        ("GET", ["workflows", id]) => {
            Json(json!({"id": id, "name": "Backup", "nodes": [], "connections": {}})).into_response()
        }
        ("PUT", ["workflows", id]) => {
            let mut doc: Value = serde_json::from_str(&body).unwrap_or(json!({}));
            doc["id"] = json!(id);
            Json(doc).into_response()
        }
        ("DELETE", ["workflows", id]) => Json(json!({"id": id, "deleted": true})).into_response(),
        ("POST", ["workflows", id, "activate"]) => {
            Json(json!({"id": id, "active": true})).into_response()
        }
        ("POST", ["workflows", id, "deactivate"]) => {
            Json(json!({"id": id, "active": false})).into_response()
        }
        ("POST", ["workflows", _id, "run"]) => StatusCode::OK.into_response(),
        ("GET", ["executions"]) => Json(json!({
            "data": [{
                "id": "500", "workflowId": "1", "status": "success",
                "startedAt": "2026-01-01T00:00:00.000Z", "stoppedAt": "2026-01-01T00:00:01.000Z",
                "finished": true, "data": {"resultData": {}}
            }]
        }))
        .into_response(),
        ("GET", ["executions", id]) => {
            Json(json!({"id": id, "status": "error", "data": {"resultData": {"error": {"message": "boom"}}}}))
                .into_response()
        }
        _ => (StatusCode::NOT_FOUND, "no route").into_response(),
    }
}

pub fn workflow_client(base_url: &str, key: Option<&str>) -> WorkflowClient {
    WorkflowClient::new(&WorkflowConfig {
        base_url: base_url.to_string(),
        api_key: key.map(|k| SecretString::from(k.to_string())),
    })
}

// ---------------------------------------------------------------------------
// Registry wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub registry: ToolRegistry,
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<StubEmbedder>,
}

pub fn harness_with(
    store: MemoryStore,
    embedder: StubEmbedder,
    exec: ExecClient,
    workflow: WorkflowClient,
) -> Harness {
    let store = Arc::new(store);
    let embedder = Arc::new(embedder);
    let kb = KnowledgeBase::new(store.clone(), embedder.clone());
    let registry = ToolRegistry::from_parts(kb, Arc::new(exec), Arc::new(workflow));
    Harness {
        registry,
        store,
        embedder,
    }
}

/// Knowledge tools over in-memory backends; exec and n8n unconfigured.
pub fn knowledge_harness(store: MemoryStore, embedder: StubEmbedder) -> Harness {
    harness_with(
        store,
        embedder,
        exec_client(DEAD_URL, None),
        workflow_client(DEAD_URL, None),
    )
}

impl Harness {
    pub async fn call(&self, tool: &str, args: Value) -> Value {
        self.registry
            .call(tool, args)
            .await
            .unwrap_or_else(|| panic!("tool {tool} not registered"))
            .to_value()
    }
}
