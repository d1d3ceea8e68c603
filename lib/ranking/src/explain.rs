//! Result structures returned by the ranking engine
//!
//! Each result carries the matched entity, its similarity score, the distance
//! to the query center when one was given, highlight excerpts and a one-line
//! reasoning string.

use crate::query::{Query, Urgency};
use carematch_core::{Entity, EntityKind};
use serde::Serialize;

/// How the query vector was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingQuality {
    /// Produced by the external embedding generator.
    Generated,
    /// Encoded directly from structured features.
    Structured,
    /// Local character-based encoding after the generator failed.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub entity: Entity,
    /// Cosine similarity in `[-1, 1]`; 0 for entities without an embedding.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub highlights: Vec<String>,
    pub reasoning: String,
}

impl RankedResult {
    pub fn id(&self) -> &str {
        self.entity.id.as_str()
    }
}

/// Build the human-readable match summary for one result.
pub fn reasoning(entity: &Entity, score: f32, query: &Query) -> String {
    let mut out = format!("Match: {:.1}% - ", score * 100.0);

    let structured = query.structured.as_ref();
    let critical = structured.and_then(|s| s.urgency) == Some(Urgency::Critical);
    if critical && entity.attributes.emergency {
        out.push_str("Emergency availability, ");
    }

    let preferred = structured
        .and_then(|s| s.specialization.as_deref())
        .or(query.filters.specialization.as_deref());
    if preferred.is_some() && preferred == entity.attributes.specialization.as_deref() {
        out.push_str("Specialization match, ");
    }

    match entity.attributes.slots {
        Some(n) => {
            let unit = match entity.kind {
                EntityKind::Doctor => "slots",
                EntityKind::Hospital => "beds",
            };
            out.push_str(&format!("{} {} available", n, unit));
        }
        None => {
            // drop the trailing separator
            let trimmed = out.trim_end_matches(", ").trim_end_matches(" - ").len();
            out.truncate(trimmed);
        }
    }
    out
}

/// Summary statistics for a query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchStats {
    /// Entities scored.
    pub candidates_count: usize,
    /// Entities left after attribute and geo filtering.
    pub filtered_count: usize,
    pub results_count: usize,
    pub best_score: f32,
    pub avg_score: f32,
}

impl SearchStats {
    /// `results` must already be sorted best-first.
    pub fn compute(results: &[RankedResult], candidates_count: usize, filtered_count: usize) -> Self {
        if results.is_empty() {
            return Self {
                candidates_count,
                filtered_count,
                results_count: 0,
                best_score: 0.0,
                avg_score: 0.0,
            };
        }
        let sum: f32 = results.iter().map(|r| r.score).sum();
        Self {
            candidates_count,
            filtered_count,
            results_count: results.len(),
            best_score: results[0].score,
            avg_score: sum / results.len() as f32,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<RankedResult>,
    pub embedding_quality: EmbeddingQuality,
    pub stats: SearchStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::StructuredQuery;
    use carematch_core::{Attributes, GeoPoint};

    fn doctor(slots: Option<u32>) -> Entity {
        Entity::new("doc-1", EntityKind::Doctor, "Dr. A", GeoPoint::new(77.2, 28.6)).with_attributes(Attributes {
            specialization: Some("Cardiology".to_string()),
            emergency: true,
            slots,
            ..Attributes::default()
        })
    }

    fn result(id: &str, score: f32) -> RankedResult {
        RankedResult {
            entity: Entity::new(id, EntityKind::Doctor, id, GeoPoint::new(0.0, 0.0)),
            score,
            distance_km: None,
            highlights: Vec::new(),
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_reasoning_full() {
        let query = Query::structured(StructuredQuery {
            symptoms: vec![],
            urgency: Some(Urgency::Critical),
            specialization: Some("Cardiology".to_string()),
        });
        assert_eq!(
            reasoning(&doctor(Some(3)), 0.875, &query),
            "Match: 87.5% - Emergency availability, Specialization match, 3 slots available"
        );
    }

    #[test]
    fn test_reasoning_without_slots() {
        let query = Query::text("heart");
        assert_eq!(reasoning(&doctor(None), 0.5, &query), "Match: 50.0%");
    }

    #[test]
    fn test_stats() {
        let results = vec![result("a", 0.9), result("b", 0.7), result("c", 0.5)];
        let stats = SearchStats::compute(&results, 10, 4);
        assert_eq!(stats.results_count, 3);
        assert_eq!(stats.filtered_count, 4);
        assert_eq!(stats.best_score, 0.9);
        assert!((stats.avg_score - 0.7).abs() < 1e-6);

        let empty = SearchStats::compute(&[], 5, 0);
        assert_eq!(empty.results_count, 0);
        assert_eq!(empty.best_score, 0.0);
    }

    #[test]
    fn test_serialization_skips_missing_distance() {
        let json = serde_json::to_value(result("a", 0.5)).unwrap();
        assert!(json.get("distance_km").is_none());
        assert_eq!(json["entity"]["id"], "a");
        assert_eq!(
            serde_json::to_value(EmbeddingQuality::Fallback).unwrap(),
            serde_json::json!("fallback")
        );
    }
}
