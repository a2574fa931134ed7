//! Embedding provider abstraction and implementations.
//!
//! Three providers are supported, selected by `embedding.provider`:
//!
//! - `disabled` — embedding calls fail; ingestion still persists chunks.
//! - `ollama` — `POST {base_url}/api/embed` against a local Ollama
//!   daemon (e.g. `nomic-embed-text`).
//! - `openai` — `POST https://api.openai.com/v1/embeddings`; the API key
//!   comes from the `OPENAI_API_KEY` environment variable.
//!
//! Batches retry transient failures (HTTP 429/5xx, network errors) with
//! exponential backoff; other client errors fail immediately.
//!
//! Vector utilities at the bottom encode embeddings as little-endian
//! `f32` BLOBs for SQLite storage and score them with cosine similarity.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Metadata interface for embedding backends. The embedding computation
/// itself lives in [`embed_texts`] (free function; the trait stays
/// object-safe without async methods).
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;
    fn dims(&self) -> usize;
}

struct DisabledProvider;

impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
}

struct RemoteProvider {
    model: String,
    dims: usize,
}

impl EmbeddingProvider for RemoteProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
}

/// Instantiate the provider named by the configuration.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "ollama" | "openai" => {
            let model = config
                .model
                .clone()
                .ok_or_else(|| anyhow::anyhow!("embedding.model required"))?;
            let dims = config
                .dims
                .ok_or_else(|| anyhow::anyhow!("embedding.dims required"))?;
            if config.provider == "openai" && std::env::var("OPENAI_API_KEY").is_err() {
                bail!("OPENAI_API_KEY environment variable not set");
            }
            Ok(Box::new(RemoteProvider { model, dims }))
        }
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Embed a batch of texts. Returns one vector per input, in input order.
pub async fn embed_texts(config: &EmbeddingConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    match config.provider.as_str() {
        "ollama" => embed_ollama(config, texts).await,
        "openai" => embed_openai(config, texts).await,
        "disabled" => bail!("Embedding provider is disabled"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Embed a single query text, for similarity search.
pub async fn embed_query(config: &EmbeddingConfig, text: &str) -> Result<Vec<f32>> {
    let mut results = embed_texts(config, &[text.to_string()]).await?;
    if results.is_empty() {
        bail!("Empty embedding response");
    }
    Ok(results.swap_remove(0))
}

fn http_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Backoff schedule: 1s, 2s, 4s, 8s, 16s, 32s (capped).
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.min(5))
}

async fn embed_ollama(config: &EmbeddingConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("embedding.model required"))?;
    let base_url = config
        .base_url
        .as_deref()
        .unwrap_or("http://localhost:11434");
    let url = format!("{}/api/embed", base_url.trim_end_matches('/'));

    let client = http_client(config)?;
    let body = serde_json::json!({ "model": model, "input": texts });

    let json = request_json_with_retry(&client, config, |c| c.post(&url).json(&body)).await?;

    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|row| {
            row.as_array()
                .map(|vals| {
                    vals.iter()
                        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: embedding not an array"))
        })
        .collect()
}

async fn embed_openai(config: &EmbeddingConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("embedding.model required"))?;

    let client = http_client(config)?;
    let body = serde_json::json!({ "model": model, "input": texts });

    let json = request_json_with_retry(&client, config, |c| {
        c.post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&api_key)
            .json(&body)
    })
    .await?;

    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    data.iter()
        .map(|item| {
            item.get("embedding")
                .and_then(|e| e.as_array())
                .map(|vals| {
                    vals.iter()
                        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))
        })
        .collect()
}

/// Issue a request, retrying 429/5xx and network errors with backoff.
/// Other HTTP errors fail immediately with the response body attached.
async fn request_json_with_retry(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt - 1)).await;
        }

        match build(client).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow::anyhow!(
                        "Embedding API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }
                bail!("Embedding API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
}

// ============ Vector utilities ============

/// Encode a float vector as little-endian `f32` bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`vec_to_blob`]. Trailing partial values are
/// ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity in `[-1, 1]`. Mismatched or empty vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        assert_eq!(blob_to_vec(&vec_to_blob(&vec)), vec);
    }

    #[test]
    fn blob_length() {
        assert_eq!(vec_to_blob(&[1.0, 2.0, 3.0]).len(), 12);
    }

    #[test]
    fn cosine_identical_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn disabled_provider_has_no_dims() {
        let provider = create_provider(&EmbeddingConfig::default()).unwrap();
        assert_eq!(provider.model_name(), "disabled");
        assert_eq!(provider.dims(), 0);
    }

    #[tokio::test]
    async fn disabled_provider_refuses_to_embed() {
        let err = embed_texts(&EmbeddingConfig::default(), &["x".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }
}
