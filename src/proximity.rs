use serde::{Deserialize, Serialize};

use crate::geo_utils::{great_circle_distance, meters_to_feet};
use crate::point::LatLon;

/// Default proximity radius: 350 ft.
///
/// Some callers historically used 200 ft; they pass it explicitly.
pub const DEFAULT_PROXIMITY_THRESHOLD_FEET: f64 = 350.0;

/// Whether the great-circle distance between `a` and `b` is at most
/// `threshold_feet`. A `NaN` distance is never within the threshold.
pub fn are_points_within_feet<A, B>(a: &A, b: &B, threshold_feet: f64) -> bool
where
    A: LatLon + ?Sized,
    B: LatLon + ?Sized,
{
    let distance_feet = meters_to_feet(great_circle_distance(a, b));
    distance_feet <= threshold_feet
}

pub fn are_points_within_default<A, B>(a: &A, b: &B) -> bool
where
    A: LatLon + ?Sized,
    B: LatLon + ?Sized,
{
    are_points_within_feet(a, b, DEFAULT_PROXIMITY_THRESHOLD_FEET)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ProximityConfig {
    pub threshold_feet: f64,
}

impl ProximityConfig {
    pub fn new(threshold_feet: f64) -> Self {
        Self { threshold_feet }
    }

    pub fn are_points_within<A, B>(&self, a: &A, b: &B) -> bool
    where
        A: LatLon + ?Sized,
        B: LatLon + ?Sized,
    {
        are_points_within_feet(a, b, self.threshold_feet)
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD_FEET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::GeoPoint;

    const ORIGIN: GeoPoint = GeoPoint::new(54.3233, 10.1228);

    // 0.0009 degrees of latitude is about 100 m, about 328 ft
    const NEAR: GeoPoint = GeoPoint::new(54.3242, 10.1228);
    // about 0.2 km away
    const FAR: GeoPoint = GeoPoint::new(54.3251, 10.1228);

    #[test]
    fn test_default_threshold() {
        assert!(are_points_within_default(&ORIGIN, &NEAR));
        assert!(!are_points_within_default(&ORIGIN, &FAR));
        assert!(are_points_within_default(&ORIGIN, &ORIGIN));
    }

    #[test]
    fn test_explicit_threshold() {
        assert!(!are_points_within_feet(&ORIGIN, &NEAR, 200.0));
        assert!(are_points_within_feet(&ORIGIN, &FAR, 1000.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let feet = meters_to_feet(great_circle_distance(&ORIGIN, &NEAR));
        assert!(are_points_within_feet(&ORIGIN, &NEAR, feet));
        assert!(!are_points_within_feet(&ORIGIN, &NEAR, feet - 1e-6));
    }

    #[test]
    fn test_nan_is_never_within() {
        let broken = GeoPoint::new(f64::NAN, 0.0);
        assert!(!are_points_within_feet(&ORIGIN, &broken, f64::INFINITY));
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(ProximityConfig::default().threshold_feet, 350.0);
        let config: ProximityConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProximityConfig::default());
        let config: ProximityConfig = serde_json::from_str(r#"{"threshold_feet": 200}"#).unwrap();
        assert!(!config.are_points_within(&ORIGIN, &NEAR));
    }
}
