//! Great-circle distance and radius checks.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe, in degrees. Serialized as `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    #[inline]
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Finite and within `[-180, 180] x [-90, 90]`.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(c: [f64; 2]) -> Self {
        GeoPoint::new(c[0], c[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(p: GeoPoint) -> Self {
        [p.longitude, p.latitude]
    }
}

/// Haversine distance between two points in kilometers.
pub fn haversine_km(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lon = (p2.longitude - p1.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + p1.latitude.to_radians().cos() * p2.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Radius predicate over entity locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoFilter;

impl GeoFilter {
    /// Inclusive: a point exactly `radius_km` away is inside.
    #[inline]
    pub fn within_radius(entity: GeoPoint, center: GeoPoint, radius_km: f64) -> bool {
        haversine_km(entity, center) <= radius_km
    }

    #[inline]
    pub fn annotate_distance(entity: GeoPoint, center: GeoPoint) -> f64 {
        haversine_km(entity, center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIIMS: GeoPoint = GeoPoint { longitude: 77.2090, latitude: 28.5672 };
    const SAFDARJUNG: GeoPoint = GeoPoint { longitude: 77.2065, latitude: 28.5685 };

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_km(AIIMS, AIIMS), 0.0);
    }

    #[test]
    fn test_known_distance() {
        // one degree of latitude along a meridian
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(a, b) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let d1 = haversine_km(AIIMS, SAFDARJUNG);
        let d2 = haversine_km(SAFDARJUNG, AIIMS);
        assert!((d1 - d2).abs() < 1e-12);
        assert!(d1 > 0.2 && d1 < 0.4, "got {}", d1);
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let d = GeoFilter::annotate_distance(SAFDARJUNG, AIIMS);
        assert!(GeoFilter::within_radius(SAFDARJUNG, AIIMS, d));
        assert!(!GeoFilter::within_radius(SAFDARJUNG, AIIMS, d - 1e-6));
    }

    #[test]
    fn test_point_serializes_as_lon_lat_pair() {
        let json = serde_json::to_string(&AIIMS).unwrap();
        assert_eq!(json, "[77.209,28.5672]");
        let back: GeoPoint = serde_json::from_str("[77.209,28.5672]").unwrap();
        assert_eq!(back, AIIMS);
    }

    #[test]
    fn test_validity() {
        assert!(AIIMS.is_valid());
        assert!(!GeoPoint::new(181.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }
}
