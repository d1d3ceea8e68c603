use carematch_core::{EntityKind, Error, FilterSpec, GeoPoint, Predicate, Result, SearchFilters};
use serde::{Deserialize, Serialize};

/// Default number of results when a query does not set a limit
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn weight(self) -> f32 {
        match self {
            Urgency::Low => 0.25,
            Urgency::Medium => 0.5,
            Urgency::High => 0.75,
            Urgency::Critical => 1.0,
        }
    }
}

/// Feature-list query, encoded directly without the embedding generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredQuery {
    pub symptoms: Vec<String>,
    pub urgency: Option<Urgency>,
    pub specialization: Option<String>,
}

impl StructuredQuery {
    /// No symptom, urgency or specialization to encode.
    pub fn is_empty(&self) -> bool {
        self.symptoms.iter().all(|s| s.trim().is_empty())
            && self.urgency.is_none()
            && self.specialization.as_deref().map_or(true, |s| s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoQuery {
    pub center: GeoPoint,
    /// Without a radius the distance is only annotated.
    #[serde(default)]
    pub radius_km: Option<f64>,
}

/// A ranked nearest-match request against one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub text: Option<String>,
    pub structured: Option<StructuredQuery>,
    pub filters: SearchFilters,
    /// Extra predicates ANDed with `filters`.
    pub predicates: FilterSpec,
    pub geo: Option<GeoQuery>,
    pub category: Option<EntityKind>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn structured(structured: StructuredQuery) -> Self {
        Self {
            structured: Some(structured),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn near(mut self, center: GeoPoint, radius_km: Option<f64>) -> Self {
        self.geo = Some(GeoQuery { center, radius_km });
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: EntityKind) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requested limit, with non-positive values clamped to 1.
    pub fn effective_limit(&self, default: usize) -> usize {
        match self.limit {
            None => default.max(1),
            Some(n) if n <= 0 => 1,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let has_text = self.text.as_deref().map_or(false, |t| !t.trim().is_empty());
        let has_features = self.structured.as_ref().map_or(false, |s| !s.is_empty());
        if !has_text && !has_features {
            return Err(Error::InvalidQuery("query needs text or structured features".to_string()));
        }
        if let Some(geo) = &self.geo {
            if !geo.center.is_valid() {
                return Err(Error::InvalidQuery(format!(
                    "center out of range: [{}, {}]",
                    geo.center.longitude, geo.center.latitude
                )));
            }
            if let Some(r) = geo.radius_km {
                if !r.is_finite() || r < 0.0 {
                    return Err(Error::InvalidQuery(format!("radius must be a non-negative number, got {}", r)));
                }
            }
        }
        Ok(())
    }

    /// Every attribute predicate the query implies.
    pub fn filter_spec(&self) -> FilterSpec {
        let mut spec = self.filters.to_spec();
        for p in self.predicates.predicates() {
            spec.push(p.clone());
        }
        if let Some(kind) = self.category {
            spec.push(Predicate::Kind { kind });
        }
        spec
    }

    /// Lowercased terms used for highlight extraction, in first-seen order.
    pub fn terms(&self, min_len: usize) -> Vec<String> {
        let mut sources: Vec<&str> = Vec::new();
        if let Some(t) = &self.text {
            sources.push(t);
        }
        if let Some(s) = &self.structured {
            sources.extend(s.symptoms.iter().map(String::as_str));
            if let Some(spec) = &s.specialization {
                sources.push(spec);
            }
        }

        let mut terms: Vec<String> = Vec::new();
        for word in sources.iter().flat_map(|s| s.split_whitespace()) {
            let word = word.to_lowercase();
            if word.chars().count() >= min_len && !terms.contains(&word) {
                terms.push(word);
            }
        }
        terms
    }
}
