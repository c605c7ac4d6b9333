use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::error::Result;

/// Anything that can be read as a latitude/longitude pair in degrees.
///
/// Implemented for [`GeoPoint`], `(lat, lon)` tuples and the `geo` point
/// types, so path and distance helpers accept whatever point records a
/// caller already has.
pub trait LatLon {
    fn lat(&self) -> f64;
    fn lon(&self) -> f64;

    fn to_geo_point(&self) -> GeoPoint {
        GeoPoint::new(self.lat(), self.lon())
    }
}

/// A position on the earth in degrees. No range validation is performed.
///
/// Deserializes from `{"lat": .., "lon": ..}` as well as
/// `{"latitude": .., "longitude": ..}`; coordinates may be numbers or
/// numeric strings.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    #[serde(alias = "lat")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Strict conversion of a JSON point record.
    pub fn try_from_json(value: &Value) -> Result<Self> {
        Ok(GeoPoint::deserialize(value)?)
    }

    /// Reads a JSON point record the way loosely-typed callers produce them.
    ///
    /// Missing or non-numeric coordinates become `NaN` instead of an error,
    /// so a malformed vertex still occupies its slot in a path and simply
    /// never wins a distance comparison.
    pub fn from_json_lossy(value: &Value) -> Self {
        let latitude = coerce_number(field(value, &["lat", "latitude"]));
        let longitude = coerce_number(field(value, &["lon", "longitude", "lng"]));
        let point = GeoPoint::new(latitude, longitude);
        if !point.is_finite() {
            log::debug!("point record {} coerced to {:?}", value, point);
        }
        point
    }
}

fn field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a Value> {
    let object = value.as_object()?;
    names.iter().find_map(|name| object.get(*name))
}

// ECMAScript ToNumber over a JSON field: absent is NaN, null is 0, booleans
// are 0/1, arrays go through their joined string form
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => coerce_str(s),
        Some(Value::Array(items)) => coerce_array(items),
        Some(Value::Object(_)) => f64::NAN,
    }
}

// [] reads as "", [x] as x; longer arrays contain a comma and never parse
fn coerce_array(items: &[Value]) -> f64 {
    match items {
        [] => 0.0,
        [only] => match only {
            Value::Null => 0.0,
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => coerce_str(s),
            Value::Array(inner) => coerce_array(inner),
            Value::Bool(_) | Value::Object(_) => f64::NAN,
        },
        _ => f64::NAN,
    }
}

fn coerce_str(s: &str) -> f64 {
    let trimmed = s.trim();
    if let Some((digits, radix)) = radix_literal(trimmed) {
        return coerce_radix(digits, radix);
    }
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // rust accepts "inf" and "nan" spellings, plain decimal notation only here
        t if t
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')) =>
        {
            t.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

// 0x.., 0o.. and 0b.. with at least one digit after the prefix
fn radix_literal(t: &str) -> Option<(&str, u32)> {
    let radix = match t.as_bytes() {
        [b'0', b'x' | b'X', _, ..] => 16,
        [b'0', b'o' | b'O', _, ..] => 8,
        [b'0', b'b' | b'B', _, ..] => 2,
        _ => return None,
    };
    Some((&t[2..], radix))
}

// unsigned digits only; accumulates in f64 so long literals round instead of overflowing
fn coerce_radix(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .try_fold(0.0, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

impl LatLon for GeoPoint {
    fn lat(&self) -> f64 {
        self.latitude
    }

    fn lon(&self) -> f64 {
        self.longitude
    }

    fn to_geo_point(&self) -> GeoPoint {
        *self
    }
}

/// `(lat, lon)`, matching the argument order of [`crate::haversine_meters`].
impl LatLon for (f64, f64) {
    fn lat(&self) -> f64 {
        self.0
    }

    fn lon(&self) -> f64 {
        self.1
    }
}

impl LatLon for geo::Point<f64> {
    fn lat(&self) -> f64 {
        self.y()
    }

    fn lon(&self) -> f64 {
        self.x()
    }
}

impl LatLon for geo::Coord<f64> {
    fn lat(&self) -> f64 {
        self.y
    }

    fn lon(&self) -> f64 {
        self.x
    }
}

impl<T: LatLon + ?Sized> LatLon for &T {
    fn lat(&self) -> f64 {
        (**self).lat()
    }

    fn lon(&self) -> f64 {
        (**self).lon()
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::coord! { x: point.longitude, y: point.latitude }
    }
}
