//! Ranking engine
//!
//! Runs one query through `Embedding -> Scoring -> Filtering -> Sorting ->
//! Done`. The engine holds no per-query state and never writes to an
//! [`EmbeddingStore`](carematch_core::EmbeddingStore), so any number of
//! queries can run concurrently alongside delta ingestion, and a query can be
//! abandoned at any stage.
//!
//! Scoring, filtering and sorting are CPU-bound and run on the blocking pool,
//! so they never hold an async worker thread.

use crate::config::EngineConfig;
use crate::encoder::{fallback_text_embedding, QueryEncoder};
use crate::explain::{reasoning, EmbeddingQuality, RankedResult, SearchResponse, SearchStats};
use crate::highlight::extract_highlights;
use crate::provider::EmbeddingProvider;
use crate::query::Query;
use carematch_core::{
    cosine_similarity, Collection, CollectionRegistry, Entity, Error, Filterer, GeoFilter, Result, Vector,
};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Idle,
    Embedding,
    Scoring,
    Filtering,
    Sorting,
    Done,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation shared between a caller and a running query.
///
/// Pipeline stages poll the flag; the embedding stage also wakes on
/// [`cancel`](Self::cancel) so a slow generator call is abandoned at once.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<CancelState>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::Release);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut notified = std::pin::pin!(self.0.notify.notified());
        // register before checking so a concurrent cancel is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    fn check(&self, stage: QueryStage) -> Result<()> {
        if self.is_cancelled() {
            debug!(?stage, "query cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// The query vector together with how it was produced.
#[derive(Debug, Clone)]
pub struct QueryEmbedding {
    pub vector: Vector,
    pub quality: EmbeddingQuality,
}

struct Candidate {
    entity: Arc<Entity>,
    score: f32,
    distance_km: Option<f64>,
}

/// Output of the blocking part of the pipeline.
struct Ranked {
    top: Vec<Candidate>,
    candidates_count: usize,
    filtered_count: usize,
}

pub struct RankingEngine {
    registry: Arc<CollectionRegistry>,
    provider: Arc<dyn EmbeddingProvider>,
    encoder: QueryEncoder,
    config: EngineConfig,
}

impl RankingEngine {
    pub fn new(registry: Arc<CollectionRegistry>, provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> Self {
        let encoder = QueryEncoder::new(config.layout.clone());
        Self {
            registry,
            provider,
            encoder,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.registry
    }

    pub async fn search(&self, collection: &str, query: &Query) -> Result<SearchResponse> {
        self.search_with_cancel(collection, query, &CancelFlag::new()).await
    }

    pub async fn search_with_cancel(&self, collection: &str, query: &Query, cancel: &CancelFlag) -> Result<SearchResponse> {
        query.validate()?;
        let collection = self.registry.get(collection)?;
        let limit = query.effective_limit(self.config.default_limit);

        cancel.check(QueryStage::Embedding)?;
        let embedding = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(stage = ?QueryStage::Embedding, "query cancelled");
                return Err(Error::Cancelled);
            }
            embedded = self.embed_query(query, collection.vector_dim()) => embedded?,
        };
        debug!(
            collection = %collection.name(),
            quality = ?embedding.quality,
            dim = embedding.vector.dim(),
            "query embedded"
        );

        let ranked = {
            let collection = Arc::clone(&collection);
            let query = query.clone();
            let vector = embedding.vector;
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || Self::rank(&collection, &query, &vector, limit, &cancel))
                .await
                .map_err(|e| Error::Task(e.to_string()))??
        };

        let terms = query.terms(self.config.min_term_len);
        let results: Vec<RankedResult> = ranked
            .top
            .into_iter()
            .map(|c| RankedResult {
                highlights: extract_highlights(&c.entity, &terms, self.config.max_highlights),
                reasoning: reasoning(&c.entity, c.score, query),
                entity: (*c.entity).clone(),
                score: c.score,
                distance_km: c.distance_km,
            })
            .collect();

        let stats = SearchStats::compute(&results, ranked.candidates_count, ranked.filtered_count);
        debug!(
            stage = ?QueryStage::Done,
            scored = stats.candidates_count,
            kept = stats.filtered_count,
            returned = stats.results_count,
            "query finished"
        );

        Ok(SearchResponse {
            results,
            embedding_quality: embedding.quality,
            stats,
        })
    }

    /// Score, filter, sort and truncate. Runs on the blocking pool.
    fn rank(collection: &Collection, query: &Query, vector: &Vector, limit: usize, cancel: &CancelFlag) -> Result<Ranked> {
        cancel.check(QueryStage::Scoring)?;
        let mut candidates = Self::score(collection, vector);
        let candidates_count = candidates.len();

        cancel.check(QueryStage::Filtering)?;
        Self::filter(&mut candidates, query);
        let filtered_count = candidates.len();

        cancel.check(QueryStage::Sorting)?;
        Self::sort(&mut candidates);
        candidates.truncate(limit);

        Ok(Ranked {
            top: candidates,
            candidates_count,
            filtered_count,
        })
    }

    /// Obtain the query vector. Structured features are encoded locally; text
    /// goes to the generator under a timeout and falls back to the local
    /// character encoding on any failure.
    pub async fn embed_query(&self, query: &Query, collection_dim: Option<usize>) -> Result<QueryEmbedding> {
        let dim = collection_dim.unwrap_or(self.config.layout.dim);

        if let Some(structured) = query.structured.as_ref().filter(|s| !s.is_empty()) {
            return Ok(QueryEmbedding {
                vector: self.encoder.encode(structured, dim)?,
                quality: EmbeddingQuality::Structured,
            });
        }

        let text = query.text.as_deref().unwrap_or_default();
        let outcome = match tokio::time::timeout(self.config.embed_timeout(), self.provider.embed(text)).await {
            Ok(Ok(v)) if v.iter().any(|x| !x.is_finite()) => Err(Error::EmbeddingGeneratorUnavailable(
                "embedding contains non-finite values".to_string(),
            )),
            Ok(Ok(v)) if collection_dim.map_or(false, |d| d != v.len()) => {
                Err(Error::EmbeddingGeneratorUnavailable(format!(
                    "embedding has {} dimensions, collection has {}",
                    v.len(),
                    dim
                )))
            }
            Ok(result) => result,
            Err(_) => Err(Error::EmbeddingGeneratorUnavailable(format!(
                "timed out after {}ms",
                self.config.embed_timeout_ms
            ))),
        };

        match outcome {
            Ok(v) => Ok(QueryEmbedding {
                vector: Vector::new(v),
                quality: EmbeddingQuality::Generated,
            }),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "using fallback query embedding");
                Ok(QueryEmbedding {
                    vector: fallback_text_embedding(text, dim),
                    quality: EmbeddingQuality::Fallback,
                })
            }
        }
    }

    /// Cosine similarity against every entity's current effective vector.
    /// Entities without a usable embedding score 0.
    fn score(collection: &Collection, query: &Vector) -> Vec<Candidate> {
        let store = collection.store();
        let entities: Vec<Arc<Entity>> = collection.entities().cloned().collect();
        entities
            .into_par_iter()
            .map(|entity| {
                let score = store
                    .try_effective_vector(entity.id.as_str())
                    .and_then(|v| cosine_similarity(query.as_slice(), v.as_slice()).ok())
                    .filter(|s| s.is_finite())
                    .unwrap_or(0.0);
                Candidate {
                    entity,
                    score,
                    distance_km: None,
                }
            })
            .collect()
    }

    /// Drop candidates failing attribute predicates or the radius, and attach
    /// distances when the query has a center.
    fn filter(candidates: &mut Vec<Candidate>, query: &Query) {
        let spec = query.filter_spec();
        candidates.retain_mut(|c| {
            if !Filterer::matches(&c.entity, &spec) {
                return false;
            }
            if let Some(geo) = &query.geo {
                let d = GeoFilter::annotate_distance(c.entity.location, geo.center);
                if let Some(radius) = geo.radius_km {
                    if d > radius {
                        return false;
                    }
                }
                c.distance_km = Some(d);
            }
            true
        });
    }

    /// Descending score, then ascending id.
    fn sort(candidates: &mut [Candidate]) {
        candidates.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then_with(|| a.entity.id.cmp(&b.entity.id))
        });
    }
}
