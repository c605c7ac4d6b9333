use geo::VincentyDistance;

use crate::point::LatLon;

/// Mean earth radius used for the spherical model, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const FEET_PER_METER: f64 = 3.28084;

/// Great-circle distance using the haversine formula.
/// Input lat/lon in degrees. Output in meters.
///
/// Nothing is validated: non-finite input comes back as `NaN` or infinity.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// [`haversine_meters`] over any two point records.
pub fn great_circle_distance<A, B>(a: &A, b: &B) -> f64
where
    A: LatLon + ?Sized,
    B: LatLon + ?Sized,
{
    haversine_meters(a.lat(), a.lon(), b.lat(), b.lon())
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

/// Distance in meters on the WGS-84 ellipsoid.
///
/// Returns `NaN` when the iteration fails to converge, which happens for
/// nearly antipodal points.
pub fn vincenty_distance<A, B>(a: &A, b: &B) -> f64
where
    A: LatLon + ?Sized,
    B: LatLon + ?Sized,
{
    let p1 = point_from_lat_lon(a.lat(), a.lon());
    let p2 = point_from_lat_lon(b.lat(), b.lon());
    match p1.vincenty_distance(&p2) {
        Ok(distance) => distance,
        Err(err) => {
            log::debug!("vincenty distance between {:?} and {:?}: {:?}", p1, p2, err);
            f64::NAN
        }
    }
}

fn point_from_lat_lon(lat: f64, lon: f64) -> geo::Point<f64> {
    geo::Point::new(lon, lat)
}
