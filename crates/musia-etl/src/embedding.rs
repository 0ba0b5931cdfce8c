//! Embeddings over HTTP.
//!
//! Speaks the Ollama `/api/embed` protocol, which hosted gateways such as
//! Open WebUI proxy unchanged. A request carries one input string and the
//! first returned embedding is used.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use musia_search::{EmbeddingError, EmbeddingProvider};

use crate::config::Config;

const PROVIDER_NAME: &str = "ollama";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f64>>,
}

/// Embedding provider backed by an Ollama-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    http: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OllamaEmbedder {
    /// Every request, body included, is abandoned after `timeout`.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("musia/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            Duration::from_secs(config.embedding_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, err: &reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            EmbeddingError::Http {
                provider: PROVIDER_NAME.to_string(),
                message: err.to_string(),
            }
        }
    }
}

fn first_embedding(response: EmbedResponse) -> Result<Vec<f64>, EmbeddingError> {
    response
        .embeddings
        .into_iter()
        .next()
        .filter(|vector| !vector.is_empty())
        .ok_or_else(|| EmbeddingError::Malformed {
            provider: PROVIDER_NAME.to_string(),
            message: "response contained no embedding".to_string(),
        })
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn vectorize(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let body = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let mut request = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Http {
                provider: PROVIDER_NAME.to_string(),
                message: format!("{status}: {}", detail.trim()),
            });
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(&e)
            } else {
                EmbeddingError::Malformed {
                    provider: PROVIDER_NAME.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let vector = first_embedding(parsed)?;
        log::debug!(
            "Embedded {} chars into {} dimensions with {}",
            text.len(),
            vector.len(),
            self.model
        );
        Ok(vector)
    }
}
