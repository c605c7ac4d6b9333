use serde_json::{Map, Value};

/// Largest key that still counts as an array index when ordering mapping keys.
const MAX_ARRAY_INDEX: u64 = u32::MAX as u64 - 1;

/// The three shapes [`normalize_to_array`] distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonShape {
    OrderedSequence(Vec<Value>),
    KeyedMapping(Map<String, Value>),
    Other(Value),
}

impl From<Value> for JsonShape {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => JsonShape::OrderedSequence(items),
            Value::Object(map) => JsonShape::KeyedMapping(map),
            other => JsonShape::Other(other),
        }
    }
}

impl From<&Value> for JsonShape {
    fn from(value: &Value) -> Self {
        JsonShape::from(value.clone())
    }
}

impl From<Vec<Value>> for JsonShape {
    fn from(items: Vec<Value>) -> Self {
        JsonShape::OrderedSequence(items)
    }
}

impl From<Map<String, Value>> for JsonShape {
    fn from(map: Map<String, Value>) -> Self {
        JsonShape::KeyedMapping(map)
    }
}

/// Coerces a loosely shaped JSON value into a list of records.
///
/// A sequence is returned as is. A mapping yields its object and array
/// values in iteration order. Anything else yields an empty list.
pub fn normalize_to_array(value: impl Into<JsonShape>) -> Vec<Value> {
    match value.into() {
        JsonShape::OrderedSequence(items) => items,
        JsonShape::KeyedMapping(map) => {
            let total = map.len();
            let records = mapping_values(map)
                .into_iter()
                .filter(is_object_like)
                .collect::<Vec<_>>();
            if records.len() < total {
                log::trace!("dropped {} primitive mapping values", total - records.len());
            }
            records
        }
        JsonShape::Other(_) => Vec::new(),
    }
}

fn is_object_like(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

// integer-like keys first in ascending order, then the rest in insertion order
fn mapping_values(map: Map<String, Value>) -> Vec<Value> {
    let mut indexed = Vec::new();
    let mut named = Vec::new();
    for (key, value) in map {
        match array_index(&key) {
            Some(index) => indexed.push((index, value)),
            None => named.push(value),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, value)| value).chain(named).collect()
}

fn array_index(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u64>().ok().filter(|index| *index <= MAX_ARRAY_INDEX)
}
