//! External embedding generators
//!
//! The engine only sees the [`EmbeddingProvider`] trait. Failures of any
//! provider are reported as [`Error::EmbeddingGeneratorUnavailable`] and are
//! recovered by the engine, never surfaced to the caller.

use crate::encoder::fallback_text_embedding;
use crate::explain::EmbeddingQuality;
use async_trait::async_trait;
use carematch_core::{Entity, Error, Result, Vector};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Width of locally encoded profiles when neither the collection nor an
/// existing record fixes one. Matches the usual generator output.
pub const DEFAULT_PROFILE_DIM: usize = 1536;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Embed free text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
}

/// Calls an HTTP embedding endpoint that accepts `{"input": text}` and
/// answers with a bare JSON array of floats.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpEmbeddingProvider {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let unavailable = |e: reqwest::Error| Error::EmbeddingGeneratorUnavailable(e.to_string());

        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { input: text })
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        let vector: Vec<f32> = response.json().await.map_err(unavailable)?;
        if vector.is_empty() {
            return Err(Error::EmbeddingGeneratorUnavailable("empty embedding".to_string()));
        }
        Ok(vector)
    }
}

/// Stands in when no generator is configured; every call fails, so text
/// queries always take the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::EmbeddingGeneratorUnavailable(
            "no embedding generator configured".to_string(),
        ))
    }
}

/// Embeds entity profiles that arrive without a base vector.
///
/// The profile text from [`Entity::profile_text`] goes to the provider under
/// a timeout. A failed, late, wrongly sized or non-finite answer is replaced
/// by [`fallback_text_embedding`] of the same text.
#[derive(Clone)]
pub struct ProfileEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    fallback_dim: usize,
}

impl ProfileEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            fallback_dim: DEFAULT_PROFILE_DIM,
        }
    }

    /// Dimension used for the fallback when no `dim` is passed to
    /// [`embed`](Self::embed). Zero is ignored.
    #[must_use]
    pub fn with_fallback_dim(mut self, dim: usize) -> Self {
        if dim > 0 {
            self.fallback_dim = dim;
        }
        self
    }

    pub fn fallback_dim(&self) -> usize {
        self.fallback_dim
    }

    /// Embed one entity's profile. With `dim` set, generator output of any
    /// other length is rejected and the fallback is built at `dim`.
    pub async fn embed(&self, entity: &Entity, dim: Option<usize>) -> (Vector, EmbeddingQuality) {
        let text = entity.profile_text();
        let outcome = match tokio::time::timeout(self.timeout, self.provider.embed(&text)).await {
            Ok(Ok(v)) if v.is_empty() || v.iter().any(|x| !x.is_finite()) => Err(
                Error::EmbeddingGeneratorUnavailable("embedding is empty or non-finite".to_string()),
            ),
            Ok(Ok(v)) if dim.map_or(false, |d| d != v.len()) => Err(Error::EmbeddingGeneratorUnavailable(format!(
                "embedding has {} dimensions, expected {}",
                v.len(),
                dim.unwrap_or_default()
            ))),
            Ok(result) => result,
            Err(_) => Err(Error::EmbeddingGeneratorUnavailable(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        };

        match outcome {
            Ok(v) => {
                debug!(entity = %entity.id, provider = self.provider.name(), "profile embedded");
                (Vector::new(v), EmbeddingQuality::Generated)
            }
            Err(e) => {
                warn!(entity = %entity.id, provider = self.provider.name(), error = %e, "using fallback profile embedding");
                let dim = dim.unwrap_or(self.fallback_dim);
                (fallback_text_embedding(&text, dim), EmbeddingQuality::Fallback)
            }
        }
    }
}

impl std::fmt::Debug for ProfileEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEmbedder")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("fallback_dim", &self.fallback_dim)
            .finish()
    }
}
