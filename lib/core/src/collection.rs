use crate::delta::DeltaPolicy;
use crate::store::{EmbeddingStore, DEFAULT_HISTORY_LEN};
use crate::{Entity, EntityId, EntityKind, Error, Result, Vector};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Configuration for a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub name: String,
    /// Restricts which entity kind may be loaded, if set.
    pub kind: Option<EntityKind>,
    /// Fixes the embedding dimension up front; otherwise the first base does.
    pub vector_dim: Option<usize>,
    pub delta_policy: DeltaPolicy,
    pub history_len: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: None,
            vector_dim: None,
            delta_policy: DeltaPolicy::LatestWins,
            history_len: DEFAULT_HISTORY_LEN,
        }
    }
}

impl CollectionConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One entity as supplied by the collection loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(flatten)]
    pub entity: Entity,
    /// Base embedding from the external generator, if it produced one.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// A set of entities of one category with their embeddings.
///
/// Entity metadata is immutable once the collection is built; only the delta
/// slots inside the [`EmbeddingStore`] change afterwards.
pub struct Collection {
    config: CollectionConfig,
    entities: AHashMap<EntityId, Arc<Entity>>,
    store: Arc<EmbeddingStore>,
}

impl Collection {
    pub fn new(config: CollectionConfig) -> Result<Self> {
        let store = match config.vector_dim {
            Some(dim) => EmbeddingStore::with_dimension(dim, config.delta_policy, config.history_len)?,
            None => EmbeddingStore::new(config.delta_policy, config.history_len),
        };
        Ok(Self {
            config,
            entities: AHashMap::new(),
            store: Arc::new(store),
        })
    }

    /// Build a collection from loader records.
    pub fn from_records(config: CollectionConfig, records: impl IntoIterator<Item = EntityRecord>) -> Result<Self> {
        let mut collection = Self::new(config)?;
        for record in records {
            collection.insert(record.entity, record.embedding.map(Vector::new))?;
        }
        info!(
            collection = %collection.name(),
            entities = collection.count(),
            embedded = collection.store.len(),
            dim = ?collection.store.dimension(),
            "collection loaded"
        );
        Ok(collection)
    }

    /// Insert or replace an entity. Entities without an embedding are kept
    /// searchable by filters but score 0.
    pub fn insert(&mut self, entity: Entity, embedding: Option<Vector>) -> Result<()> {
        if let Some(kind) = self.config.kind {
            if entity.kind != kind {
                return Err(Error::InvalidConfig(format!(
                    "collection {} only holds {} entities, got {} {}",
                    self.config.name, kind, entity.kind, entity.id
                )));
            }
        }
        match embedding {
            Some(base) => self.store.set_base(entity.id.clone(), base)?,
            // a replaced entity must not keep scoring from its old vector
            None => {
                self.store.remove(entity.id.as_str());
            }
        }
        self.entities.insert(entity.id.clone(), Arc::new(entity));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn vector_dim(&self) -> Option<usize> {
        self.store.dimension()
    }

    pub fn count(&self) -> usize {
        self.entities.len()
    }

    pub fn get(&self, id: &str) -> Option<Arc<Entity>> {
        self.entities.get(id).cloned()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    pub fn store(&self) -> &Arc<EmbeddingStore> {
        &self.store
    }
}

/// Named collections addressed by the query's collection selector.
#[derive(Default)]
pub struct CollectionRegistry {
    collections: RwLock<AHashMap<String, Arc<Collection>>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection under its name, replacing (reloading) any
    /// previous one. Returns the replaced collection.
    pub fn insert(&self, collection: Collection) -> Option<Arc<Collection>> {
        let name = collection.name().to_string();
        let previous = self.collections.write().insert(name.clone(), Arc::new(collection));
        if previous.is_some() {
            info!(collection = %name, "collection reloaded");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.write().remove(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}
