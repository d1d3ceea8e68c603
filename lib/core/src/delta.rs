//! Real-time adjustments to entity embeddings and the policy that folds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    AvailabilityChange,
    EmergencyToggle,
    InventoryChange,
    Other,
}

/// Where a delta came from. Kept for audit; never folded into the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub kind: UpdateKind,
    pub reasoning: String,
    /// Clamped into `[0, 1]` on construction.
    pub confidence: f32,
}

impl Provenance {
    pub fn new(kind: UpdateKind, reasoning: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            kind,
            reasoning: reasoning.into(),
            confidence,
        }
    }
}

/// A possibly-short vector of adjustments; positions past its end are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaVector {
    pub values: Vec<f32>,
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
}

impl DeltaVector {
    pub fn new(values: Vec<f32>, timestamp: DateTime<Utc>, provenance: Provenance) -> Self {
        Self {
            values,
            timestamp,
            provenance,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Audit entry kept in the per-entity history ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
    /// L2 norm of the delta as it was stored.
    pub magnitude: f32,
}

/// How a new delta combines with the one already stored for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeltaPolicy {
    /// The incoming delta replaces the stored one.
    #[default]
    LatestWins,
    /// The stored delta decays by `0.5^(dt / half_life_secs)`, the incoming one
    /// is added, and the sum is clamped to L2 norm `max_norm`.
    DecayedAccumulation { half_life_secs: f64, max_norm: f32 },
}

impl DeltaPolicy {
    /// Combine `incoming` with `previous` under this policy.
    pub fn fold(&self, previous: Option<&DeltaVector>, incoming: DeltaVector) -> DeltaVector {
        match *self {
            DeltaPolicy::LatestWins => incoming,
            DeltaPolicy::DecayedAccumulation { half_life_secs, max_norm } => {
                let Some(prev) = previous else {
                    return clamp_norm(incoming, max_norm);
                };
                let dt = (incoming.timestamp - prev.timestamp).num_milliseconds().max(0) as f64 / 1000.0;
                let decay = if half_life_secs > 0.0 {
                    0.5f64.powf(dt / half_life_secs) as f32
                } else {
                    0.0
                };

                let len = prev.values.len().max(incoming.values.len());
                let mut values = vec![0.0f32; len];
                for (v, p) in values.iter_mut().zip(&prev.values) {
                    *v += p * decay;
                }
                for (v, n) in values.iter_mut().zip(&incoming.values) {
                    *v += n;
                }
                clamp_norm(DeltaVector { values, ..incoming }, max_norm)
            }
        }
    }
}

fn clamp_norm(mut delta: DeltaVector, max_norm: f32) -> DeltaVector {
    let n = crate::vector::norm(&delta.values);
    if max_norm >= 0.0 && n > max_norm && n > 0.0 {
        let scale = max_norm / n;
        for v in &mut delta.values {
            *v *= scale;
        }
    }
    delta
}
