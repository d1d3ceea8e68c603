use crate::delta::{DeltaPolicy, DeltaRecord, DeltaVector};
use crate::{EntityId, Error, Result, Vector};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

/// Default number of provenance records kept per entity
pub const DEFAULT_HISTORY_LEN: usize = 16;

#[derive(Debug, Default)]
struct DeltaState {
    delta: Option<DeltaVector>,
    history: VecDeque<DeltaRecord>,
}

/// Base vector plus the mutable delta slot for one entity.
///
/// Each slot carries its own lock so writers on one entity never block
/// readers of another.
#[derive(Debug)]
struct EntitySlot {
    base: Vector,
    state: RwLock<DeltaState>,
}

/// Owns every entity's base vector and accumulated delta.
///
/// The outer map is only written while a collection is being loaded; delta
/// ingestion and queries take the outer read lock just long enough to clone
/// the slot handle.
#[derive(Debug)]
pub struct EmbeddingStore {
    dim: OnceLock<usize>,
    policy: DeltaPolicy,
    history_len: usize,
    slots: RwLock<AHashMap<EntityId, Arc<EntitySlot>>>,
}

impl Default for EmbeddingStore {
    fn default() -> Self {
        Self::new(DeltaPolicy::default(), DEFAULT_HISTORY_LEN)
    }
}

impl EmbeddingStore {
    pub fn new(policy: DeltaPolicy, history_len: usize) -> Self {
        Self {
            dim: OnceLock::new(),
            policy,
            history_len,
            slots: RwLock::new(AHashMap::new()),
        }
    }

    /// A store whose dimension is fixed up front rather than by the first base.
    pub fn with_dimension(dim: usize, policy: DeltaPolicy, history_len: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be at least 1".to_string()));
        }
        let store = Self::new(policy, history_len);
        let _ = store.dim.set(dim);
        Ok(store)
    }

    /// Collection dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dim.get().copied()
    }

    pub fn policy(&self) -> DeltaPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.read().contains_key(id)
    }

    fn slot(&self, id: &str) -> Result<Arc<EntitySlot>> {
        self.slots
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownEntity(id.to_string()))
    }

    /// Register the base embedding for an entity.
    ///
    /// The first base fixes the collection dimension; later bases of a
    /// different length fail with [`Error::InvalidDimension`]. Registering an
    /// id again replaces its base and clears its delta.
    pub fn set_base(&self, id: impl Into<EntityId>, base: Vector) -> Result<()> {
        if base.is_empty() {
            return Err(Error::InvalidDimension {
                expected: self.dimension().unwrap_or(1),
                actual: 0,
            });
        }
        let expected = *self.dim.get_or_init(|| base.dim());
        if base.dim() != expected {
            return Err(Error::InvalidDimension {
                expected,
                actual: base.dim(),
            });
        }

        let slot = Arc::new(EntitySlot {
            base,
            state: RwLock::new(DeltaState::default()),
        });
        self.slots.write().insert(id.into(), slot);
        Ok(())
    }

    /// Drop the entity's base, delta and history. Returns whether it was
    /// registered. The collection dimension stays fixed.
    pub fn remove(&self, id: &str) -> bool {
        self.slots.write().remove(id).is_some()
    }

    /// Fold a delta into the entity's stored delta under the store's policy.
    ///
    /// Deltas longer than the base fail with [`Error::DimensionMismatch`].
    pub fn apply_delta(&self, id: &str, delta: DeltaVector) -> Result<()> {
        let slot = self.slot(id)?;
        if delta.len() > slot.base.dim() {
            return Err(Error::DimensionMismatch {
                expected: slot.base.dim(),
                actual: delta.len(),
            });
        }

        let mut state = slot.state.write();
        let folded = self.policy.fold(state.delta.as_ref(), delta);

        if self.history_len > 0 {
            while state.history.len() >= self.history_len {
                state.history.pop_front();
            }
            state.history.push_back(DeltaRecord {
                timestamp: folded.timestamp,
                provenance: folded.provenance.clone(),
                magnitude: crate::vector::norm(&folded.values),
            });
        }
        state.delta = Some(folded);
        Ok(())
    }

    /// Base with the current delta folded in, computed on every call.
    pub fn effective_vector(&self, id: &str) -> Result<Vector> {
        let slot = self.slot(id)?;
        let state = slot.state.read();
        match &state.delta {
            Some(delta) => slot.base.compose(&delta.values),
            None => Ok(slot.base.clone()),
        }
    }

    /// Like [`effective_vector`](Self::effective_vector) but `None` for
    /// unregistered ids.
    pub fn try_effective_vector(&self, id: &str) -> Option<Vector> {
        self.effective_vector(id).ok()
    }

    pub fn base(&self, id: &str) -> Result<Vector> {
        Ok(self.slot(id)?.base.clone())
    }

    pub fn delta(&self, id: &str) -> Result<Option<DeltaVector>> {
        Ok(self.slot(id)?.state.read().delta.clone())
    }

    /// Provenance of the most recent deltas, oldest first.
    pub fn history(&self, id: &str) -> Result<Vec<DeltaRecord>> {
        Ok(self.slot(id)?.state.read().history.iter().cloned().collect())
    }
}
