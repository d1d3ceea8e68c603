use ahash::AHashSet;
use carematch_core::{Entity, EntityKind};

/// Text fields scanned for query terms, in output order.
fn text_fields(entity: &Entity) -> [(&'static str, Option<&str>); 5] {
    let label = match entity.kind {
        EntityKind::Doctor => "specialization",
        EntityKind::Hospital => "type",
    };
    [
        ("name", Some(entity.name.as_str())),
        (label, entity.category_label()),
        ("bio", entity.attributes.bio.as_deref()),
        ("hospital", entity.attributes.hospital.as_deref()),
        ("address", entity.attributes.address.as_deref()),
    ]
}

/// Excerpts of the entity's text fields that contain any of `terms`
/// (already lowercased), as `field: ...value...`.
pub fn extract_highlights(entity: &Entity, terms: &[String], max: usize) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    if terms.is_empty() || max == 0 {
        return out;
    }

    for (field, value) in text_fields(entity) {
        let Some(value) = value else { continue };
        let lowered = value.to_lowercase();
        if terms.iter().any(|t| lowered.contains(t.as_str())) {
            let excerpt = format!("{}: ...{}...", field, value);
            if seen.insert(excerpt.clone()) {
                out.push(excerpt);
                if out.len() >= max {
                    break;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use carematch_core::{Attributes, GeoPoint};

    fn doctor() -> Entity {
        Entity::new("doc-1", EntityKind::Doctor, "Dr. Rajesh Kumar", GeoPoint::new(77.2, 28.6)).with_attributes(
            Attributes {
                specialization: Some("Cardiology".to_string()),
                bio: Some("Interventional cardiologist with 15 years at AIIMS".to_string()),
                hospital: Some("AIIMS".to_string()),
                address: Some("Ansari Nagar, New Delhi".to_string()),
                ..Attributes::default()
            },
        )
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_field_match() {
        let h = extract_highlights(&doctor(), &terms(&["cardio"]), 5);
        assert_eq!(
            h,
            vec![
                "specialization: ...Cardiology...".to_string(),
                "bio: ...Interventional cardiologist with 15 years at AIIMS...".to_string(),
            ]
        );
    }

    #[test]
    fn test_one_excerpt_per_field() {
        let h = extract_highlights(&doctor(), &terms(&["aiims", "years", "interventional"]), 5);
        assert_eq!(h.len(), 2);
        assert!(h[0].starts_with("bio:"));
        assert_eq!(h[1], "hospital: ...AIIMS...");
    }

    #[test]
    fn test_cap_and_empty_terms() {
        let h = extract_highlights(&doctor(), &terms(&["a"]), 2);
        assert_eq!(h.len(), 2);
        assert!(extract_highlights(&doctor(), &[], 5).is_empty());
        assert!(extract_highlights(&doctor(), &terms(&["pediatrics"]), 5).is_empty());
    }

    #[test]
    fn test_hospital_type_label() {
        let h = Entity::new("h-1", EntityKind::Hospital, "Safdarjung Hospital", GeoPoint::new(77.2, 28.6))
            .with_attributes(Attributes {
                facility_type: Some("Government".to_string()),
                ..Attributes::default()
            });
        assert_eq!(
            extract_highlights(&h, &terms(&["government"]), 5),
            vec!["type: ...Government...".to_string()]
        );
    }
}
