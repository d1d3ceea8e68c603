use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Identifier of a searchable entity. Ordering is lexicographic, which is what
/// the ranking tie-break relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(s)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Doctor,
    Hospital,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Doctor => f.write_str("doctor"),
            EntityKind::Hospital => f.write_str("hospital"),
        }
    }
}

/// Filterable and text-bearing attributes of an entity.
///
/// Doctors usually carry `specialization`, `experience` and `slots`; hospitals
/// carry `facility_type`, `specialties`, `facilities` and bed counts in `slots`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub specialization: Option<String>,
    /// Hospital ownership type (Government, Private, Trust, Corporate).
    pub facility_type: Option<String>,
    pub rating: Option<f64>,
    /// Years of practice.
    pub experience: Option<f64>,
    /// Open appointment slots (doctors) or available beds (hospitals).
    pub slots: Option<u32>,
    pub emergency: bool,
    pub on_call: bool,
    pub specialties: Vec<String>,
    pub facilities: Vec<String>,
    pub bio: Option<String>,
    /// Degrees and fellowships, e.g. `MBBS`, `DM (Neurology)`.
    pub qualifications: Vec<String>,
    /// Languages a doctor consults in.
    pub languages: Vec<String>,
    pub hospital: Option<String>,
    pub address: Option<String>,
}

/// A doctor or hospital as loaded from the collection source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Entity {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, kind: EntityKind, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            location,
            attributes: Attributes::default(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Specialization for doctors, ownership type for hospitals.
    pub fn category_label(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Doctor => self.attributes.specialization.as_deref(),
            EntityKind::Hospital => self
                .attributes
                .facility_type
                .as_deref()
                .or(self.attributes.specialization.as_deref()),
        }
    }

    /// Free-text profile handed to an embedding generator.
    ///
    /// Doctors: name, specialization, bio, qualifications, languages.
    /// Hospitals: name, specialties, facilities, ownership type. Missing
    /// fields are skipped.
    pub fn profile_text(&self) -> String {
        let a = &self.attributes;
        let mut parts: Vec<&str> = vec![self.name.as_str()];
        match self.kind {
            EntityKind::Doctor => {
                parts.extend(a.specialization.as_deref());
                parts.extend(a.bio.as_deref());
                parts.extend(a.qualifications.iter().map(String::as_str));
                parts.extend(a.languages.iter().map(String::as_str));
            }
            EntityKind::Hospital => {
                parts.extend(a.specialties.iter().map(String::as_str));
                parts.extend(a.facilities.iter().map(String::as_str));
                parts.extend(a.facility_type.as_deref());
            }
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_from_json() {
        let raw = json!({
            "id": "doc-001",
            "kind": "doctor",
            "name": "Dr. Rajesh Kumar",
            "location": [77.2090, 28.5672],
            "attributes": {
                "specialization": "Cardiology",
                "rating": 4.9,
                "experience": 15,
                "slots": 3,
                "emergency": true
            }
        });
        let e: Entity = serde_json::from_value(raw).unwrap();
        assert_eq!(e.id.as_str(), "doc-001");
        assert_eq!(e.kind, EntityKind::Doctor);
        assert_eq!(e.attributes.experience, Some(15.0));
        assert!(e.attributes.emergency);
        assert!(!e.attributes.on_call);
        assert_eq!(e.category_label(), Some("Cardiology"));
    }

    #[test]
    fn test_id_ordering_is_lexicographic() {
        let mut ids = vec![EntityId::from("b"), EntityId::from("a10"), EntityId::from("a2")];
        ids.sort();
        assert_eq!(ids, vec![EntityId::from("a10"), EntityId::from("a2"), EntityId::from("b")]);
    }

    #[test]
    fn test_hospital_category_label() {
        let h = Entity::new("hosp-1", EntityKind::Hospital, "AIIMS", GeoPoint::new(77.2, 28.5))
            .with_attributes(Attributes {
                facility_type: Some("Government".to_string()),
                ..Attributes::default()
            });
        assert_eq!(h.category_label(), Some("Government"));
    }

    #[test]
    fn test_profile_text() {
        let raw = json!({
            "id": "doc-002",
            "kind": "doctor",
            "name": "Dr. Priya Sharma",
            "location": [77.2, 28.6],
            "attributes": {
                "specialization": "Neurology",
                "bio": "Stroke care",
                "qualifications": ["MBBS", "DM (Neurology)"],
                "languages": ["Hindi", "English"]
            }
        });
        let doctor: Entity = serde_json::from_value(raw).unwrap();
        assert_eq!(
            doctor.profile_text(),
            "Dr. Priya Sharma Neurology Stroke care MBBS DM (Neurology) Hindi English"
        );

        let hospital = Entity::new("hosp-2", EntityKind::Hospital, "Max Saket", GeoPoint::new(77.2, 28.5))
            .with_attributes(Attributes {
                specialties: vec!["Cardiology".to_string(), "Oncology".to_string()],
                facilities: vec!["ICU".to_string()],
                facility_type: Some("Private".to_string()),
                bio: Some("ignored for hospitals".to_string()),
                ..Attributes::default()
            });
        assert_eq!(hospital.profile_text(), "Max Saket Cardiology Oncology ICU Private");

        let bare = Entity::new("doc-3", EntityKind::Doctor, "Dr. X", GeoPoint::new(0.0, 0.0));
        assert_eq!(bare.profile_text(), "Dr. X");
    }
}
