//! # CareMatch Ranking
//!
//! Turns a query into a ranked, filtered and explained list of entities.
//!
//! ```text
//!   Query ──► embed (structured | generator | fallback)
//!               │
//!               ▼
//!   EmbeddingStore ──► cosine scoring (rayon) ──► Filterer + GeoFilter
//!                                                      │
//!                                                      ▼
//!                               sort (score desc, id asc) ──► top-k
//!                                                      │
//!                                                      ▼
//!                                   highlights + reasoning + stats
//! ```
//!
//! - [`RankingEngine`] - runs queries against a [`CollectionRegistry`](carematch_core::CollectionRegistry)
//! - [`EmbeddingProvider`] - external text embedding generator
//! - [`ProfileEmbedder`] - base vectors for entities loaded without one
//! - [`QueryEncoder`] / [`ProfileEncoder`] - slot-based structured encodings
//! - [`EngineConfig`] - limits, timeouts and the slot layout
//!
//! ## Example
//!
//! ```rust,no_run
//! use carematch_core::{Collection, CollectionConfig, CollectionRegistry};
//! use carematch_ranking::{DisabledProvider, EngineConfig, Query, RankingEngine};
//! use std::sync::Arc;
//!
//! # async fn run() -> carematch_core::Result<()> {
//! let registry = Arc::new(CollectionRegistry::new());
//! registry.insert(Collection::new(CollectionConfig::named("doctors"))?);
//!
//! let engine = RankingEngine::new(registry, Arc::new(DisabledProvider), EngineConfig::default());
//! let response = engine.search("doctors", &Query::text("cardiologist").with_limit(5)).await?;
//! for result in &response.results {
//!     println!("{} {:.3} {}", result.id(), result.score, result.reasoning);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod engine;
pub mod explain;
pub mod highlight;
pub mod provider;
pub mod query;

pub use config::EngineConfig;
pub use encoder::{fallback_text_embedding, hash_string, ProfileEncoder, QueryEncoder, SlotLayout, DEFAULT_STRUCTURED_DIM};
pub use engine::{CancelFlag, QueryEmbedding, QueryStage, RankingEngine};
pub use explain::{reasoning, EmbeddingQuality, RankedResult, SearchResponse, SearchStats};
pub use highlight::extract_highlights;
pub use provider::{DisabledProvider, EmbeddingProvider, HttpEmbeddingProvider, ProfileEmbedder, DEFAULT_PROFILE_DIM};
pub use query::{GeoQuery, Query, StructuredQuery, Urgency, DEFAULT_LIMIT};
