// Attribute predicates over entities.
// A filter is a flat list of tagged predicates joined by AND; one dispatcher
// evaluates every variant.

use crate::entity::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

pub trait Filter {
    fn matches(&self, entity: &Entity) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Name,
    Specialization,
    FacilityType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Rating,
    Experience,
    Slots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagField {
    Emergency,
    OnCall,
    /// At least one open slot or bed.
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    FacilityType,
    Specialties,
    Facilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Case-sensitive equality on a text attribute.
    Exact { field: TextField, value: String },
    /// Inclusive range; a missing bound is open.
    Range {
        field: NumericField,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Flag { field: FlagField },
    /// Passes if any of the entity's values for `field` is in `values`.
    OneOf { field: TagField, values: Vec<String> },
    Kind { kind: EntityKind },
}

/// Conjunction of predicates. The empty spec matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl Filter for FilterSpec {
    fn matches(&self, entity: &Entity) -> bool {
        Filterer::matches(entity, self)
    }
}

/// Evaluates a [`FilterSpec`] against an entity. Never mutates, never fails.
pub struct Filterer;

impl Filterer {
    pub fn matches(entity: &Entity, spec: &FilterSpec) -> bool {
        spec.predicates.iter().all(|p| Self::matches_predicate(entity, p))
    }

    fn text_value(entity: &Entity, field: TextField) -> Option<&str> {
        match field {
            TextField::Name => Some(entity.name.as_str()),
            TextField::Specialization => entity.attributes.specialization.as_deref(),
            TextField::FacilityType => entity.attributes.facility_type.as_deref(),
        }
    }

    fn numeric_value(entity: &Entity, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Rating => entity.attributes.rating,
            NumericField::Experience => entity.attributes.experience,
            NumericField::Slots => entity.attributes.slots.map(f64::from),
        }
    }

    fn tag_values(entity: &Entity, field: TagField) -> Vec<&str> {
        match field {
            TagField::FacilityType => entity.attributes.facility_type.as_deref().into_iter().collect(),
            TagField::Specialties => entity.attributes.specialties.iter().map(String::as_str).collect(),
            TagField::Facilities => entity.attributes.facilities.iter().map(String::as_str).collect(),
        }
    }

    fn matches_predicate(entity: &Entity, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Exact { field, value } => {
                Self::text_value(entity, *field)
                    .map(|v| v == value)
                    .unwrap_or(false)
            }
            Predicate::Range { field, min, max } => {
                if min.is_none() && max.is_none() {
                    return true;
                }
                Self::numeric_value(entity, *field)
                    .map(|v| min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi))
                    .unwrap_or(false)
            }
            Predicate::Flag { field } => match field {
                FlagField::Emergency => entity.attributes.emergency,
                FlagField::OnCall => entity.attributes.on_call,
                FlagField::Available => entity.attributes.slots.map(|s| s > 0).unwrap_or(false),
            },
            Predicate::OneOf { field, values } => {
                Self::tag_values(entity, *field)
                    .iter()
                    .any(|v| values.iter().any(|allowed| allowed == v))
            }
            Predicate::Kind { kind } => entity.kind == *kind,
        }
    }
}

/// Range bounds as they arrive from a search form
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Search-form filters, lowered into a [`FilterSpec`] by [`SearchFilters::to_spec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchFilters {
    pub specialization: Option<String>,
    pub experience: Option<Bounds>,
    pub rating: Option<Bounds>,
    /// Only entities with at least one open slot.
    pub availability: bool,
    pub emergency_only: bool,
    pub hospital_type: Vec<String>,
}

impl SearchFilters {
    pub fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        if let Some(s) = &self.specialization {
            spec.push(Predicate::Exact {
                field: TextField::Specialization,
                value: s.clone(),
            });
        }
        if let Some(b) = self.experience {
            spec.push(Predicate::Range { field: NumericField::Experience, min: b.min, max: b.max });
        }
        if let Some(b) = self.rating {
            spec.push(Predicate::Range { field: NumericField::Rating, min: b.min, max: b.max });
        }
        if self.availability {
            spec.push(Predicate::Flag { field: FlagField::Available });
        }
        if self.emergency_only {
            spec.push(Predicate::Flag { field: FlagField::Emergency });
        }
        if !self.hospital_type.is_empty() {
            spec.push(Predicate::OneOf {
                field: TagField::FacilityType,
                values: self.hospital_type.clone(),
            });
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Attributes;
    use crate::geo::GeoPoint;

    fn doctor(id: &str, spec: &str, rating: f64, slots: u32) -> Entity {
        Entity::new(id, EntityKind::Doctor, format!("Dr. {}", id), GeoPoint::new(77.2, 28.6)).with_attributes(
            Attributes {
                specialization: Some(spec.to_string()),
                rating: Some(rating),
                experience: Some(10.0),
                slots: Some(slots),
                ..Attributes::default()
            },
        )
    }

    fn hospital(id: &str, kind: &str) -> Entity {
        Entity::new(id, EntityKind::Hospital, id, GeoPoint::new(77.2, 28.6)).with_attributes(Attributes {
            facility_type: Some(kind.to_string()),
            emergency: true,
            facilities: vec!["ICU".to_string(), "Blood Bank".to_string()],
            ..Attributes::default()
        })
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        assert!(Filterer::matches(&doctor("a", "Cardiology", 4.0, 1), &FilterSpec::new()));
    }

    #[test]
    fn test_exact_match() {
        let spec = FilterSpec::new().and(Predicate::Exact {
            field: TextField::Specialization,
            value: "Cardiology".to_string(),
        });
        assert!(spec.matches(&doctor("a", "Cardiology", 4.9, 2)));
        assert!(!spec.matches(&doctor("b", "Neurology", 4.9, 2)));
        assert!(!spec.matches(&hospital("h", "Private")));
    }

    #[test]
    fn test_range_inclusive_and_open() {
        let spec = FilterSpec::new().and(Predicate::Range {
            field: NumericField::Rating,
            min: Some(4.5),
            max: None,
        });
        assert!(spec.matches(&doctor("a", "Cardiology", 4.5, 1)));
        assert!(spec.matches(&doctor("a", "Cardiology", 4.9, 1)));
        assert!(!spec.matches(&doctor("b", "Cardiology", 4.2, 1)));
    }

    #[test]
    fn test_range_on_missing_attribute_fails() {
        let spec = FilterSpec::new().and(Predicate::Range {
            field: NumericField::Experience,
            min: Some(1.0),
            max: None,
        });
        assert!(!spec.matches(&hospital("h", "Government")));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let spec = FilterSpec::new().and(Predicate::Range {
            field: NumericField::Rating,
            min: Some(5.0),
            max: Some(1.0),
        });
        for r in [0.5, 1.0, 3.0, 5.0] {
            assert!(!spec.matches(&doctor("a", "General", r, 1)));
        }
    }

    #[test]
    fn test_flags() {
        let available = FilterSpec::new().and(Predicate::Flag { field: FlagField::Available });
        assert!(available.matches(&doctor("a", "General", 4.0, 1)));
        assert!(!available.matches(&doctor("a", "General", 4.0, 0)));

        let emergency = FilterSpec::new().and(Predicate::Flag { field: FlagField::Emergency });
        assert!(emergency.matches(&hospital("h", "Private")));
        assert!(!emergency.matches(&doctor("a", "General", 4.0, 1)));
    }

    #[test]
    fn test_set_membership() {
        let spec = FilterSpec::new().and(Predicate::OneOf {
            field: TagField::FacilityType,
            values: vec!["Government".to_string(), "Trust".to_string()],
        });
        assert!(spec.matches(&hospital("h1", "Government")));
        assert!(!spec.matches(&hospital("h2", "Private")));

        let icu = FilterSpec::new().and(Predicate::OneOf {
            field: TagField::Facilities,
            values: vec!["ICU".to_string()],
        });
        assert!(icu.matches(&hospital("h1", "Private")));
    }

    #[test]
    fn test_predicates_compose_with_and() {
        let filters = SearchFilters {
            specialization: Some("Cardiology".to_string()),
            rating: Some(Bounds { min: Some(4.5), max: None }),
            availability: true,
            ..SearchFilters::default()
        };
        let spec = filters.to_spec();
        assert_eq!(spec.predicates().len(), 3);
        assert!(spec.matches(&doctor("a", "Cardiology", 4.9, 2)));
        assert!(!spec.matches(&doctor("b", "Cardiology", 4.2, 2)));
        assert!(!spec.matches(&doctor("c", "Cardiology", 4.9, 0)));
    }

    #[test]
    fn test_search_filters_from_form_json() {
        let filters: SearchFilters = serde_json::from_str(
            r#"{"rating": {"min": 4.0}, "emergencyOnly": true, "hospitalType": ["Government"]}"#,
        )
        .unwrap();
        let spec = filters.to_spec();
        assert_eq!(spec.predicates().len(), 3);
        assert!(spec.matches(&Entity {
            attributes: Attributes {
                rating: Some(4.8),
                ..hospital("h", "Government").attributes
            },
            ..hospital("h", "Government")
        }));
    }

    #[test]
    fn test_predicate_wire_format() {
        let p: Predicate = serde_json::from_str(r#"{"op": "flag", "field": "on_call"}"#).unwrap();
        assert_eq!(p, Predicate::Flag { field: FlagField::OnCall });
    }
}
