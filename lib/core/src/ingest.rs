//! Translation of operational update events into delta vectors.
//!
//! Each event kind writes into a fixed slot of the delta according to a
//! [`DeltaSchema`]. The mapping depends only on the event itself (including
//! the hour of its timestamp), so feeding the same event twice yields the same
//! delta.

use crate::delta::{DeltaVector, Provenance, UpdateKind};
use crate::store::EmbeddingStore;
use crate::{EntityId, Result};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What changed for the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    AvailabilityChange { slots: u32 },
    EmergencyToggle {
        emergency: bool,
        #[serde(default)]
        on_call: bool,
    },
    /// Bed or stock levels.
    InventoryChange { available: u32, total: u32 },
    /// A raw delta produced elsewhere, applied as-is.
    Other { delta: Vec<f32> },
}

impl Change {
    pub fn kind(&self) -> UpdateKind {
        match self {
            Change::AvailabilityChange { .. } => UpdateKind::AvailabilityChange,
            Change::EmergencyToggle { .. } => UpdateKind::EmergencyToggle,
            Change::InventoryChange { .. } => UpdateKind::InventoryChange,
            Change::Other { .. } => UpdateKind::Other,
        }
    }
}

/// A time-stamped update pushed by the external update source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub entity_id: EntityId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub change: Change,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl UpdateEvent {
    pub fn new(entity_id: impl Into<EntityId>, timestamp: DateTime<Utc>, change: Change) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp,
            change,
            reasoning: String::new(),
            confidence: 1.0,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>, confidence: f32) -> Self {
        self.reasoning = reasoning.into();
        self.confidence = confidence;
        self
    }
}

/// Slot assignments and weights for delta encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaSchema {
    /// `slots / slots_scale - 0.5`
    pub availability_slot: usize,
    /// `available / total - 0.5`
    pub inventory_slot: usize,
    pub emergency_slot: usize,
    pub on_call_slot: usize,
    /// `sin(2π·hour/24) * time_of_day_weight`
    pub time_of_day_slot: usize,
    pub emergency_boost: f32,
    pub on_call_boost: f32,
    pub time_of_day_weight: f32,
    pub slots_scale: f32,
}

impl Default for DeltaSchema {
    fn default() -> Self {
        Self {
            availability_slot: 100,
            inventory_slot: 101,
            emergency_slot: 110,
            on_call_slot: 111,
            time_of_day_slot: 112,
            emergency_boost: 0.3,
            on_call_boost: 0.2,
            time_of_day_weight: 0.1,
            slots_scale: 10.0,
        }
    }
}

impl DeltaSchema {
    /// Length of every delta this schema emits for structured changes.
    pub fn width(&self) -> usize {
        [
            self.availability_slot,
            self.inventory_slot,
            self.emergency_slot,
            self.on_call_slot,
            self.time_of_day_slot,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    pub fn time_of_day(&self, timestamp: DateTime<Utc>) -> f32 {
        let hour = timestamp.hour() as f32;
        (2.0 * PI * hour / 24.0).sin() * self.time_of_day_weight
    }

    /// Encode the numeric part of an event.
    pub fn encode(&self, event: &UpdateEvent) -> Vec<f32> {
        let mut delta = match &event.change {
            Change::Other { delta } => return delta.clone(),
            _ => vec![0.0f32; self.width()],
        };

        match &event.change {
            Change::AvailabilityChange { slots } => {
                let scale = if self.slots_scale > 0.0 { self.slots_scale } else { 1.0 };
                delta[self.availability_slot] = *slots as f32 / scale - 0.5;
            }
            Change::EmergencyToggle { emergency, on_call } => {
                if *emergency {
                    delta[self.emergency_slot] = self.emergency_boost;
                }
                if *on_call {
                    delta[self.on_call_slot] = self.on_call_boost;
                }
            }
            Change::InventoryChange { available, total } => {
                delta[self.inventory_slot] = if *total == 0 {
                    0.0
                } else {
                    *available as f32 / *total as f32 - 0.5
                };
            }
            Change::Other { .. } => {}
        }
        delta[self.time_of_day_slot] = self.time_of_day(event.timestamp);
        delta
    }
}

/// Counters returned when an ingest loop finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub applied: u64,
    pub rejected: u64,
}

/// Folds update events into an [`EmbeddingStore`].
#[derive(Debug, Clone)]
pub struct DeltaIngestor {
    store: Arc<EmbeddingStore>,
    schema: DeltaSchema,
}

impl DeltaIngestor {
    pub fn new(store: Arc<EmbeddingStore>, schema: DeltaSchema) -> Self {
        Self { store, schema }
    }

    pub fn schema(&self) -> &DeltaSchema {
        &self.schema
    }

    /// Encode one event and apply it. Confidence and reasoning travel as
    /// provenance only.
    pub fn ingest(&self, event: UpdateEvent) -> Result<()> {
        let values = self.schema.encode(&event);
        let provenance = Provenance::new(event.change.kind(), event.reasoning, event.confidence);
        debug!(
            entity = %event.entity_id,
            kind = ?provenance.kind,
            confidence = provenance.confidence,
            "ingesting delta"
        );
        self.store
            .apply_delta(event.entity_id.as_str(), DeltaVector::new(values, event.timestamp, provenance))
    }

    /// Consume events until every sender is dropped. Events that fail to apply
    /// are logged and skipped.
    pub async fn run(self, mut events: mpsc::Receiver<UpdateEvent>) -> IngestStats {
        let mut stats = IngestStats::default();
        while let Some(event) = events.recv().await {
            let id = event.entity_id.clone();
            match self.ingest(event) {
                Ok(()) => stats.applied += 1,
                Err(e) => {
                    stats.rejected += 1;
                    warn!(entity = %id, error = %e, "dropping update event");
                }
            }
        }
        debug!(applied = stats.applied, rejected = stats.rejected, "update stream closed");
        stats
    }
}
