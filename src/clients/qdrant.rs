//! Qdrant REST implementation of [`VectorStore`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::clients::vector_store::{CollectionInfo, Point, ScoredPoint, VectorStore};
use crate::config::{EMBEDDING_DIMENSIONS, QdrantConfig};
use crate::error::{Error, Result};

const QDRANT_TIMEOUT_SECS: u64 = 30;

pub struct QdrantStore {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

/// Qdrant wraps every response body in `{"result": ..., "status": ..., "time": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Deserialize)]
struct CollectionInfoResult {
    status: String,
    #[serde(default)]
    points_count: Option<u64>,
    #[serde(default)]
    vectors_count: Option<u64>,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Self {
        Self::with_base_url(config.base_url(), config.api_key.clone())
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Qdrant {} {}", method, url);
        let builder = self
            .http
            .request(method, url)
            .timeout(Duration::from_secs(QDRANT_TIMEOUT_SECS));
        match &self.api_key {
            Some(key) => builder.header("api-key", key.expose_secret()),
            None => builder,
        }
    }

    /// Send, map non-2xx statuses onto the crate error taxonomy, decode `result`.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        subject: &str,
    ) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::from_request(e, QDRANT_TIMEOUT_SECS))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = qdrant_error_message(&body);
            return Err(match status {
                StatusCode::NOT_FOUND => Error::NotFound(message.unwrap_or_else(|| subject.to_string())),
                StatusCode::CONFLICT => Error::Conflict(
                    message.unwrap_or_else(|| format!("{subject} already exists")),
                ),
                _ => Error::http(status.as_u16(), &body),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.result)
    }
}

/// Pull `status.error` out of a Qdrant error body.
fn qdrant_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("status")
        .and_then(|s| s.get("error"))
        .and_then(|e| e.as_str())
        .map(String::from)
}

fn collection_path(name: &str) -> String {
    format!("/collections/{}", urlencoding::encode(name))
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let result: CollectionsResult = self
            .send(self.request(Method::GET, "/collections"), "collections")
            .await?;
        Ok(result.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        let body = json!({
            "vectors": {"size": EMBEDDING_DIMENSIONS, "distance": "Cosine"}
        });
        let _: Value = self
            .send(
                self.request(Method::PUT, &collection_path(name)).json(&body),
                &format!("Collection '{name}'"),
            )
            .await?;
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let info: CollectionInfoResult = self
            .send(
                self.request(Method::GET, &collection_path(name)),
                &format!("Collection '{name}'"),
            )
            .await?;
        Ok(CollectionInfo {
            name: name.to_string(),
            points_count: info.points_count,
            vectors_count: info.vectors_count,
            status: info.status,
        })
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let _: Value = self
            .send(
                self.request(Method::DELETE, &collection_path(name)),
                &format!("Collection '{name}'"),
            )
            .await?;
        Ok(())
    }

    async fn upsert_point(&self, collection: &str, point: Point) -> Result<()> {
        let path = format!("{}/points?wait=true", collection_path(collection));
        let _: Value = self
            .send(
                self.request(Method::PUT, &path).json(&json!({"points": [point]})),
                &format!("Collection '{collection}'"),
            )
            .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let path = format!("{}/points/query", collection_path(collection));
        let body = json!({"query": vector, "limit": limit, "with_payload": true});
        let result: QueryResult = self
            .send(
                self.request(Method::POST, &path).json(&body),
                &format!("Collection '{collection}'"),
            )
            .await?;
        Ok(result.points)
    }

    async fn delete_point(&self, collection: &str, id: &str) -> Result<()> {
        let path = format!("{}/points/delete?wait=true", collection_path(collection));
        let _: Value = self
            .send(
                self.request(Method::POST, &path).json(&json!({"points": [id]})),
                &format!("Collection '{collection}'"),
            )
            .await?;
        Ok(())
    }
}
