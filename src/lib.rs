//! Small geometric helpers for tracking positions along a route.
//!
//! Everything here is pure computation. Malformed input does not produce
//! errors at the top-level helpers: it comes back as `NaN`, an empty list or
//! index 0, and the `try_*` variants expose the underlying [`Error`].

mod error;
mod geo_utils;
pub mod json;
pub mod path;
pub mod point;
pub mod proximity;
pub mod time;

pub use error::{Error, Result};
pub use geo_utils::{
    great_circle_distance, haversine_meters, meters_to_feet, vincenty_distance,
    EARTH_RADIUS_METERS, FEET_PER_METER,
};
pub use json::{normalize_to_array, JsonShape};
pub use path::{nearest_index, Path};
pub use point::{GeoPoint, LatLon};
pub use proximity::{
    are_points_within_default, are_points_within_feet, ProximityConfig,
    DEFAULT_PROXIMITY_THRESHOLD_FEET,
};
pub use time::{elapsed_seconds, try_elapsed_seconds, Timestamp};
