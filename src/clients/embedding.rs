//! Text embeddings through an OpenAI-compatible `/embeddings` endpoint.
//!
//! Embedding is best-effort: an unconfigured provider or any call-time
//! failure yields `None`, never an error. Callers decide how to report the
//! missing vector.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingsConfig;
use crate::error::truncate_chars;

/// Inputs longer than this many characters are cut before submission.
pub const MAX_EMBED_CHARS: usize = 8000;

const EMBED_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of text embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Whether a provider credential is present.
    fn is_configured(&self) -> bool;

    /// Embed `text`, or `None` when no vector could be produced.
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

pub struct OpenAiEmbedder {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingsConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    async fn request(&self, api_key: &SecretString, input: &str) -> Result<Vec<f32>, String> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .timeout(EMBED_TIMEOUT)
            .json(&EmbeddingRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("provider returned {}: {}", status, truncate_chars(&body, 200)));
        }

        let payload: EmbeddingResponse = response.json().await.map_err(|e| e.to_string())?;
        payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| "provider returned no embedding".to_string())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let api_key = self.api_key.as_ref()?;
        let input = truncate_chars(text, MAX_EMBED_CHARS);

        match self.request(api_key, input).await {
            Ok(vector) => {
                tracing::debug!(dims = vector.len(), "Generated embedding");
                Some(vector)
            }
            Err(e) => {
                tracing::error!("Embedding failed: {}", e);
                None
            }
        }
    }
}
