//! Structured encoders
//!
//! Turn profiles and structured queries into vectors by writing features into
//! fixed slots, and provide the character-based fallback used when the
//! external embedding generator cannot answer.

use crate::query::StructuredQuery;
use carematch_core::{Entity, Error, Result, Vector};
use serde::{Deserialize, Serialize};

/// Default dimension of structured vectors
pub const DEFAULT_STRUCTURED_DIM: usize = 128;

const SPECIALIZATIONS: [&str; 6] = ["Cardiology", "Neurology", "Pediatrics", "Orthopedics", "Dermatology", "General"];

const COMMON_SYMPTOMS: [&str; 12] = [
    "chest pain",
    "headache",
    "fever",
    "cough",
    "fatigue",
    "shortness of breath",
    "nausea",
    "dizziness",
    "joint pain",
    "skin rash",
    "abdominal pain",
    "back pain",
];

/// Where each structured feature lives in the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    pub dim: usize,
    pub specializations: Vec<String>,
    /// One-hot block for the profile's specialization.
    pub specialization_slot: usize,
    pub experience_slot: usize,
    /// Years at which experience saturates to 1.0.
    pub experience_cap: f32,
    pub rating_slot: usize,
    pub rating_scale: f32,
    pub location_slot: usize,
    pub location_buckets: usize,
    pub symptoms: Vec<String>,
    pub symptom_slot: usize,
    pub urgency_slot: usize,
    /// One-hot block for the query's specialization preference.
    pub preference_slot: usize,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            dim: DEFAULT_STRUCTURED_DIM,
            specializations: SPECIALIZATIONS.iter().map(|s| s.to_string()).collect(),
            specialization_slot: 0,
            experience_slot: 20,
            experience_cap: 30.0,
            rating_slot: 30,
            rating_scale: 5.0,
            location_slot: 35,
            location_buckets: 15,
            symptoms: COMMON_SYMPTOMS.iter().map(|s| s.to_string()).collect(),
            symptom_slot: 0,
            urgency_slot: 60,
            preference_slot: 70,
        }
    }
}

impl SlotLayout {
    /// Smallest dimension that holds every slot.
    pub fn required_dim(&self) -> usize {
        [
            self.specialization_slot + self.specializations.len(),
            self.experience_slot + 1,
            self.rating_slot + 1,
            self.location_slot + self.location_buckets,
            self.symptom_slot + self.symptoms.len(),
            self.urgency_slot + 1,
            self.preference_slot + self.specializations.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    fn specialization_index(&self, name: &str) -> Option<usize> {
        self.specializations.iter().position(|s| s == name)
    }

    fn check(&self, dim: usize) -> Result<()> {
        let required = self.required_dim();
        if dim < required {
            return Err(Error::DimensionMismatch {
                expected: required,
                actual: dim,
            });
        }
        Ok(())
    }
}

/// Encodes symptom lists, urgency and specialization preference.
#[derive(Debug, Clone, Default)]
pub struct QueryEncoder {
    layout: SlotLayout,
}

impl QueryEncoder {
    pub fn new(layout: SlotLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Encode into a vector of length `dim`; `dim` must hold the whole layout.
    pub fn encode(&self, query: &StructuredQuery, dim: usize) -> Result<Vector> {
        self.layout.check(dim)?;
        let mut v = vec![0.0f32; dim];

        for symptom in &query.symptoms {
            let symptom = symptom.trim().to_lowercase();
            if symptom.is_empty() {
                continue;
            }
            let hit = self
                .layout
                .symptoms
                .iter()
                .position(|known| symptom.contains(known.as_str()) || known.contains(symptom.as_str()));
            if let Some(i) = hit {
                v[self.layout.symptom_slot + i] = 1.0;
            }
        }

        if let Some(urgency) = query.urgency {
            v[self.layout.urgency_slot] = urgency.weight();
        }

        if let Some(i) = query
            .specialization
            .as_deref()
            .and_then(|s| self.layout.specialization_index(s))
        {
            v[self.layout.preference_slot + i] = 1.0;
        }

        Ok(Vector::new(v))
    }
}

/// Deterministic base vectors for entity profiles.
#[derive(Debug, Clone, Default)]
pub struct ProfileEncoder {
    layout: SlotLayout,
}

impl ProfileEncoder {
    pub fn new(layout: SlotLayout) -> Self {
        Self { layout }
    }

    pub fn encode(&self, entity: &Entity) -> Result<Vector> {
        let layout = &self.layout;
        layout.check(layout.dim)?;
        let mut v = vec![0.0f32; layout.dim];
        let attrs = &entity.attributes;

        // unknown specializations fall into "General" when the layout has it
        let spec = attrs.specialization.as_deref().unwrap_or("General");
        if let Some(i) = layout
            .specialization_index(spec)
            .or_else(|| layout.specialization_index("General"))
        {
            v[layout.specialization_slot + i] = 1.0;
        }

        if layout.experience_cap > 0.0 {
            let years = attrs.experience.unwrap_or(0.0) as f32;
            v[layout.experience_slot] = (years / layout.experience_cap).clamp(0.0, 1.0);
        }
        if layout.rating_scale > 0.0 {
            v[layout.rating_slot] = attrs.rating.unwrap_or(0.0) as f32 / layout.rating_scale;
        }

        if let Some(address) = attrs.address.as_deref().filter(|a| !a.is_empty()) {
            if layout.location_buckets > 0 {
                let bucket = hash_string(address) as usize % layout.location_buckets;
                v[layout.location_slot + bucket] = 1.0;
            }
        }

        Ok(Vector::new(v))
    }
}

/// 31-multiplier string hash over UTF-16 code units, folded to a non-negative
/// 32-bit value.
pub fn hash_string(s: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// Character-based pseudo-embedding used when the generator is unavailable.
///
/// Every character adds `sin(code) * 0.1` at position `code % dim`; the result
/// is L2-normalized. Empty text yields the zero vector.
pub fn fallback_text_embedding(text: &str, dim: usize) -> Vector {
    let mut v = vec![0.0f32; dim];
    if dim == 0 {
        return Vector::new(v);
    }
    for unit in text.encode_utf16() {
        let code = unit as usize;
        v[code % dim] += ((unit as f64).sin() * 0.1) as f32;
    }
    let mut vector = Vector::new(v);
    vector.normalize();
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Urgency;
    use carematch_core::{Attributes, EntityKind, GeoPoint};

    #[test]
    fn test_default_layout_fits_default_dim() {
        let layout = SlotLayout::default();
        assert_eq!(layout.required_dim(), 76);
        assert!(layout.required_dim() <= layout.dim);
    }

    #[test]
    fn test_query_encoding_slots() {
        let encoder = QueryEncoder::default();
        let query = StructuredQuery {
            symptoms: vec!["Severe chest pain".to_string(), "fever".to_string(), "".to_string()],
            urgency: Some(Urgency::Critical),
            specialization: Some("Cardiology".to_string()),
        };
        let v = encoder.encode(&query, 128).unwrap();
        let s = v.as_slice();
        assert_eq!(s[0], 1.0);
        assert_eq!(s[2], 1.0);
        assert_eq!(s[1], 0.0);
        assert_eq!(s[60], 1.0);
        assert_eq!(s[70], 1.0);
        assert_eq!(s.iter().filter(|x| **x != 0.0).count(), 4);
    }

    #[test]
    fn test_partial_symptom_matches_known_phrase() {
        let encoder = QueryEncoder::default();
        let query = StructuredQuery {
            symptoms: vec!["breath".to_string()],
            urgency: None,
            specialization: None,
        };
        let v = encoder.encode(&query, 128).unwrap();
        assert_eq!(v.as_slice()[5], 1.0);
    }

    #[test]
    fn test_query_encoding_into_wider_collection() {
        let v = QueryEncoder::default()
            .encode(&StructuredQuery { urgency: Some(Urgency::Low), ..Default::default() }, 1536)
            .unwrap();
        assert_eq!(v.dim(), 1536);
        assert_eq!(v.as_slice()[60], 0.25);
    }

    #[test]
    fn test_query_encoding_into_narrow_collection_fails() {
        let err = QueryEncoder::default().encode(&StructuredQuery::default(), 32).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 76, actual: 32 }));
    }

    #[test]
    fn test_profile_encoding() {
        let doctor = Entity::new("doc-1", EntityKind::Doctor, "Dr. Priya Sharma", GeoPoint::new(77.2, 28.6))
            .with_attributes(Attributes {
                specialization: Some("Neurology".to_string()),
                experience: Some(45.0),
                rating: Some(4.5),
                address: Some("Sri Aurobindo Marg, Ansari Nagar".to_string()),
                ..Attributes::default()
            });
        let v = ProfileEncoder::default().encode(&doctor).unwrap();
        let s = v.as_slice();
        assert_eq!(v.dim(), 128);
        assert_eq!(s[1], 1.0);
        assert_eq!(s[20], 1.0);
        assert!((s[30] - 0.9).abs() < 1e-6);
        assert_eq!(s[35..50].iter().filter(|x| **x == 1.0).count(), 1);
        assert!(s[50..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_unknown_specialization_maps_to_general() {
        let doctor = Entity::new("doc-2", EntityKind::Doctor, "Dr. X", GeoPoint::new(77.2, 28.6))
            .with_attributes(Attributes {
                specialization: Some("Oncology".to_string()),
                ..Attributes::default()
            });
        let v = ProfileEncoder::default().encode(&doctor).unwrap();
        assert_eq!(v.as_slice()[5], 1.0);
    }

    #[test]
    fn test_hash_string() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("a"), 97);
        assert_eq!(hash_string("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_fallback_embedding() {
        let v = fallback_text_embedding("cardiologist near AIIMS", 1536);
        assert_eq!(v.dim(), 1536);
        assert!((v.norm() - 1.0).abs() < 1e-5);
        assert_eq!(v, fallback_text_embedding("cardiologist near AIIMS", 1536));

        let empty = fallback_text_embedding("", 64);
        assert!(empty.as_slice().iter().all(|x| *x == 0.0));
    }
}
