//! # CareMatch
//!
//! Matches patients to doctors and hospitals by embedding similarity, with
//! real-time availability deltas, attribute filters and a geographic radius.
//!
//! ## Quick Start
//!
//! ### As a Binary
//!
//! ```bash
//! carematch --collection doctors.json --text "chest pain cardiologist" --limit 5
//! carematch --collection doctors.json --events updates.jsonl --query query.json
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use carematch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> carematch::Result<()> {
//! let mut doctors = Collection::new(CollectionConfig::named("doctors"))?;
//! let entity = Entity::new("doc-1", EntityKind::Doctor, "Dr. Rajesh Kumar", GeoPoint::new(77.209, 28.567));
//! doctors.insert(entity, Some(Vector::new(vec![0.1, 0.9, 0.3])))?;
//!
//! let registry = Arc::new(CollectionRegistry::new());
//! registry.insert(doctors);
//!
//! let engine = RankingEngine::new(registry, Arc::new(DisabledProvider), EngineConfig::default());
//! let query = Query::text("cardiologist").near(GeoPoint::new(77.2, 28.6), Some(10.0));
//! let response = engine.search("doctors", &query).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - [`carematch-core`](carematch_core) - vectors, entities, filters, geo, the embedding store and delta ingestion
//! - [`carematch-ranking`](carematch_ranking) - query embedding, scoring, highlights and the ranking engine

pub mod loader;

// Re-export core types
pub use carematch_core::{
    Attributes, Change, Collection, CollectionConfig, CollectionRegistry, DeltaIngestor, DeltaPolicy, DeltaSchema,
    DeltaVector, EmbeddingStore, Entity, EntityId, EntityKind, EntityRecord, Error, FilterSpec, Filterer, GeoFilter,
    GeoPoint, Predicate, Result, SearchFilters, UpdateEvent, Vector,
};

// Re-export ranking
pub use carematch_ranking::{
    CancelFlag, DisabledProvider, EmbeddingProvider, EmbeddingQuality, EngineConfig, HttpEmbeddingProvider,
    ProfileEmbedder, ProfileEncoder, Query, RankedResult, RankingEngine, SearchResponse, StructuredQuery, Urgency,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attributes, CancelFlag, Change, Collection, CollectionConfig, CollectionRegistry, DeltaIngestor, DeltaSchema,
        DisabledProvider, EmbeddingProvider, EngineConfig, Entity, EntityKind, Error, GeoPoint, Query, RankingEngine,
        Result, SearchFilters, StructuredQuery, UpdateEvent, Urgency, Vector,
    };
}

/// Vector math
pub mod math {
    pub use carematch_core::{cosine_similarity, dot, haversine_km, norm};
}
