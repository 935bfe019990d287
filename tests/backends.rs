//! Qdrant and embedding clients against mock HTTP services.

mod support;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, post};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};

use kb_mcp::clients::{
    Embedder, KnowledgePayload, OpenAiEmbedder, Point, QdrantStore, VectorStore,
};
use kb_mcp::config::{DEFAULT_EMBEDDING_MODEL, EmbeddingsConfig};
use kb_mcp::error::Error;
use support::{Recorder, spawn};

// ---------------------------------------------------------------------------
// Mock Qdrant
// ---------------------------------------------------------------------------

async fn spawn_qdrant() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/collections", any(qdrant_handler_root))
        .route("/collections/{*rest}", any(qdrant_handler))
        .with_state(recorder.clone());
    (spawn(router).await, recorder)
}

async fn qdrant_handler_root(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri, &headers, &body);
    Json(json!({
        "result": {"collections": [{"name": "docs"}, {"name": "solutions"}]},
        "status": "ok",
        "time": 0.0
    }))
    .into_response()
}

async fn qdrant_handler(
    State(recorder): State<Recorder>,
    Path(rest): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri, &headers, &body);

    let segments: Vec<&str> = rest.split('/').collect();
    let ok = |result: Value| Json(json!({"result": result, "status": "ok", "time": 0.0}));
    match (method.as_str(), segments.as_slice()) {
        ("PUT", ["docs"]) => (
            StatusCode::CONFLICT,
            Json(json!({"status": {"error": "Wrong input: Collection `docs` already exists!"}})),
        )
            .into_response(),
        ("PUT", [_]) | ("DELETE", [_]) => ok(json!(true)).into_response(),
        ("GET", ["missing"]) => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": {"error": "Not found: Collection `missing` doesn't exist!"}})),
        )
            .into_response(),
        ("GET", [_]) => ok(json!({"status": "green", "points_count": 3, "vectors_count": null}))
            .into_response(),
        ("PUT", [_, "points"]) | ("POST", [_, "points", "delete"]) => {
            ok(json!({"operation_id": 1, "status": "completed"})).into_response()
        }
        ("POST", [_, "points", "query"]) => ok(json!({
            "points": [
                {"id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26", "score": 0.91,
                 "payload": {"title": "Restart nginx", "content": "systemctl restart nginx"}},
                {"id": 7, "score": 0.42}
            ]
        }))
        .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "unexpected").into_response(),
    }
}

fn store(url: &str) -> QdrantStore {
    QdrantStore::with_base_url(url, Some(SecretString::from("qdrant-key".to_string())))
}

#[tokio::test]
async fn qdrant_lists_collections_with_api_key() {
    let (url, recorder) = spawn_qdrant().await;

    let names = store(&url).list_collections().await.unwrap();

    assert_eq!(names, vec!["docs".to_string(), "solutions".to_string()]);
    assert_eq!(recorder.all()[0].headers["api-key"], "qdrant-key");
}

#[tokio::test]
async fn qdrant_creates_fixed_width_cosine_collections() {
    let (url, recorder) = spawn_qdrant().await;

    store(&url).create_collection("runbooks").await.unwrap();

    let sent = &recorder.all()[0];
    assert_eq!(sent.method, "PUT");
    assert_eq!(sent.path, "/collections/runbooks");
    assert_eq!(
        sent.body,
        json!({"vectors": {"size": 1536, "distance": "Cosine"}})
    );
}

#[tokio::test]
async fn qdrant_maps_conflict_and_not_found() {
    let (url, _) = spawn_qdrant().await;
    let store = store(&url);

    let conflict = store.create_collection("docs").await.unwrap_err();
    let missing = store.collection_info("missing").await.unwrap_err();

    assert!(matches!(conflict, Error::Conflict(ref m) if m.contains("already exists")));
    assert!(matches!(missing, Error::NotFound(ref m) if m.contains("doesn't exist")));
}

#[tokio::test]
async fn qdrant_collection_info_reads_counts() {
    let (url, _) = spawn_qdrant().await;

    let info = store(&url).collection_info("docs").await.unwrap();

    assert_eq!(info.name, "docs");
    assert_eq!(info.points_count, Some(3));
    assert_eq!(info.vectors_count, None);
    assert_eq!(info.status, "green");
}

#[tokio::test]
async fn qdrant_upsert_waits_and_sends_payload() {
    let (url, recorder) = spawn_qdrant().await;
    let point = Point {
        id: "5c56c793-69f3-4fbf-87e6-c4bf54c28c26".to_string(),
        vector: vec![0.5, 0.25],
        payload: KnowledgePayload::new("t", "c", "general", "conversation"),
    };

    store(&url).upsert_point("docs", point).await.unwrap();

    let sent = &recorder.all()[0];
    assert_eq!(sent.path, "/collections/docs/points");
    assert_eq!(sent.query.as_deref(), Some("wait=true"));
    let stored = &sent.body["points"][0];
    assert_eq!(stored["id"], "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
    assert_eq!(stored["vector"], json!([0.5, 0.25]));
    assert_eq!(stored["payload"]["title"], "t");
    assert_eq!(stored["payload"]["category"], "general");
    assert!(stored["payload"]["created_at"].is_string());
}

#[tokio::test]
async fn qdrant_query_returns_scored_points() {
    let (url, recorder) = spawn_qdrant().await;

    let hits = store(&url).search("docs", vec![1.0, 0.0], 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id_string(), "5c56c793-69f3-4fbf-87e6-c4bf54c28c26");
    assert_eq!(
        hits[0].payload.as_ref().and_then(|p| p.title.as_deref()),
        Some("Restart nginx")
    );
    assert_eq!(hits[1].id_string(), "7");
    assert!(hits[1].payload.is_none());

    let sent = &recorder.all()[0];
    assert_eq!(sent.path, "/collections/docs/points/query");
    assert_eq!(
        sent.body,
        json!({"query": [1.0, 0.0], "limit": 2, "with_payload": true})
    );
}

#[tokio::test]
async fn qdrant_deletes_points_by_id() {
    let (url, recorder) = spawn_qdrant().await;

    store(&url).delete_point("docs", "abc").await.unwrap();

    let sent = &recorder.all()[0];
    assert_eq!(sent.path, "/collections/docs/points/delete");
    assert_eq!(sent.body, json!({"points": ["abc"]}));
}

// ---------------------------------------------------------------------------
// Mock embeddings provider
// ---------------------------------------------------------------------------

async fn spawn_embeddings() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/v1/embeddings", post(embeddings_handler))
        .with_state(recorder.clone());
    (format!("{}/v1", spawn(router).await), recorder)
}

async fn embeddings_handler(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    recorder.record(&method, &uri, &headers, &body);
    let request: Value = serde_json::from_str(&body).unwrap_or_default();
    if request["input"] == "fail" {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }
    Json(json!({"data": [{"embedding": [0.1, 0.2, 0.3]}], "model": request["model"]}))
        .into_response()
}

fn embedder(base_url: &str) -> OpenAiEmbedder {
    OpenAiEmbedder::new(&EmbeddingsConfig {
        api_key: Some(SecretString::from("sk-test".to_string())),
        base_url: base_url.to_string(),
        model: DEFAULT_EMBEDDING_MODEL.to_string(),
    })
}

#[tokio::test]
async fn embedder_posts_bearer_authenticated_request() {
    let (url, recorder) = spawn_embeddings().await;

    let vector = embedder(&url).embed("hello").await;

    assert_eq!(vector, Some(vec![0.1, 0.2, 0.3]));
    let sent = &recorder.all()[0];
    assert_eq!(sent.headers["authorization"], "Bearer sk-test");
    assert_eq!(
        sent.body,
        json!({"model": DEFAULT_EMBEDDING_MODEL, "input": "hello"})
    );
}

#[tokio::test]
async fn embedder_truncates_long_input() {
    let (url, recorder) = spawn_embeddings().await;

    embedder(&url).embed(&"ß".repeat(9_000)).await;

    let sent = &recorder.all()[0];
    assert_eq!(sent.body["input"].as_str().unwrap().chars().count(), 8_000);
}

#[tokio::test]
async fn embedder_failure_is_absent_vector() {
    let (url, _) = spawn_embeddings().await;

    assert_eq!(embedder(&url).embed("fail").await, None);
}
