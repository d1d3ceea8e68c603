//! # CareMatch Core
//!
//! Core library for the CareMatch entity matching engine.
//!
//! This crate provides the data structures the ranking layer reads from:
//!
//! - [`vector`] - dot product, norm and cosine similarity over dense vectors
//! - [`geo`] - haversine distance and the radius predicate
//! - [`Entity`] - a doctor or hospital with filterable attributes
//! - [`FilterSpec`] - attribute predicates joined by AND
//! - [`EmbeddingStore`] - per-entity base vector plus real-time delta
//! - [`DeltaIngestor`] - turns update events into deltas
//! - [`Collection`] - entities and their store, addressed by name
//!
//! ## Example
//!
//! ```rust
//! use carematch_core::{Collection, CollectionConfig, Entity, EntityKind, GeoPoint, Vector};
//!
//! let mut doctors = Collection::new(CollectionConfig::named("doctors")).unwrap();
//! let entity = Entity::new("doc-1", EntityKind::Doctor, "Dr. Rajesh Kumar", GeoPoint::new(77.209, 28.567));
//! doctors.insert(entity, Some(Vector::new(vec![1.0, 0.0, 0.0]))).unwrap();
//!
//! let effective = doctors.store().effective_vector("doc-1").unwrap();
//! assert_eq!(effective.as_slice(), &[1.0, 0.0, 0.0]);
//! ```

pub mod collection;
pub mod delta;
pub mod entity;
pub mod error;
pub mod filter;
pub mod geo;
pub mod ingest;
pub mod store;
pub mod vector;

/// Dot-product kernels with AVX2/FMA and NEON paths
pub mod simd;

pub use collection::{Collection, CollectionConfig, CollectionRegistry, EntityRecord};
pub use delta::{DeltaPolicy, DeltaRecord, DeltaVector, Provenance, UpdateKind};
pub use entity::{Attributes, Entity, EntityId, EntityKind};
pub use error::{Error, Result};
pub use filter::{Bounds, Filter, FilterSpec, Filterer, FlagField, NumericField, Predicate, SearchFilters, TagField, TextField};
pub use geo::{haversine_km, GeoFilter, GeoPoint, EARTH_RADIUS_KM};
pub use ingest::{Change, DeltaIngestor, DeltaSchema, IngestStats, UpdateEvent};
pub use store::EmbeddingStore;
pub use vector::{cosine_similarity, dot, norm, Vector};
