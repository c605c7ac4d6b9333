use geojson::{Feature, Geometry, JsonObject, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geo_utils::great_circle_distance;
use crate::json::normalize_to_array;
use crate::point::{GeoPoint, LatLon};

/// Index of the path vertex closest to `point`.
///
/// The first of several equally close vertices wins. An empty path, or one
/// whose distances are all `NaN`, gives 0.
pub fn nearest_index<P, Q>(path: &[P], point: &Q) -> usize
where
    P: LatLon,
    Q: LatLon + ?Sized,
{
    let mut min_distance = f64::INFINITY;
    let mut index = 0;
    for (i, vertex) in path.iter().enumerate() {
        let distance = great_circle_distance(vertex, point);
        if distance < min_distance {
            min_distance = distance;
            index = i;
        }
    }
    log::trace!(
        "nearest of {} vertices is {} at {} m",
        path.len(),
        index,
        min_distance
    );
    index
}

/// An ordered polyline; the position of a point is its vertex index.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Path(Vec<GeoPoint>);

impl Path {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nearest_index<Q: LatLon + ?Sized>(&self, point: &Q) -> usize {
        nearest_index(&self.0, point)
    }

    /// Builds a path from a list (or keyed mapping) of `{lat, lon}` records.
    ///
    /// Every record keeps its slot; malformed records become `NaN` vertices.
    pub fn from_json(value: &Value) -> Self {
        normalize_to_array(value)
            .iter()
            .map(GeoPoint::from_json_lossy)
            .collect()
    }

    /// Reads a GeoJSON point, multi point or line string.
    pub fn try_from_geometry(geometry: &Geometry) -> Result<Self> {
        match &geometry.value {
            geojson::Value::Point(position) => Ok(Path(vec![point_from_position(position)?])),
            geojson::Value::MultiPoint(positions) | geojson::Value::LineString(positions) => {
                positions.iter().map(|position| point_from_position(position)).collect()
            }
            _ => Err(Error::UnsupportedGeometry),
        }
    }

    pub fn to_feature(&self, properties: Option<JsonObject>) -> Feature {
        let coordinates = self
            .0
            .iter()
            .map(|point| vec![point.longitude, point.latitude])
            .collect();
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::LineString(coordinates))),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

fn point_from_position(position: &Position) -> Result<GeoPoint> {
    match position.as_slice() {
        [lon, lat, ..] => Ok(GeoPoint::new(*lat, *lon)),
        short => Err(Error::ShortPosition(short.len())),
    }
}

impl From<Vec<GeoPoint>> for Path {
    fn from(points: Vec<GeoPoint>) -> Self {
        Path(points)
    }
}

impl FromIterator<GeoPoint> for Path {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl AsRef<[GeoPoint]> for Path {
    fn as_ref(&self) -> &[GeoPoint] {
        &self.0
    }
}

impl From<Path> for geo::LineString<f64> {
    fn from(path: Path) -> Self {
        path.0.into_iter().map(geo::Coord::from).collect()
    }
}
