//! Parameter document values.
//!
//! A parameter document is a tree of records, lists and scalars. It is parsed
//! once from JSON into [`Value`] so the validator can match over an explicit
//! tagged union instead of probing untyped maps.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScenarioError;
use crate::geometry::TimePeriod;

/// A node of a parameter document.
///
/// # Examples
///
/// ```
/// use hospital_scenario::Value;
///
/// let doc = Value::from_json(serde_json::json!({
///     "walk_speed": 2.0,
///     "beds": 90,
///     "influx": [[1, 2], [3, 4]]
/// })).unwrap();
///
/// let record = doc.as_record().unwrap();
/// assert!(record["walk_speed"].is_float());
/// assert!(record["beds"].is_int());
/// assert!(record["influx"].is_matrix());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Duration(TimePeriod),
    Matrix(Vec<Vec<i64>>),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty record.
    #[must_use]
    pub fn record() -> Self {
        Self::Record(BTreeMap::new())
    }

    /// Adds a field to a record, builder style. Non-records are returned
    /// unchanged.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Record(fields) = &mut self {
            fields.insert(key.into(), value.into());
        }
        self
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix(_))
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view of the value. Integers are not widened: the schema keeps
    /// numeric kinds apart.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_duration(&self) -> Option<TimePeriod> {
        match self {
            Self::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<i64>]> {
        match self {
            Self::Matrix(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a field of a record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(key))
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Duration(_) => "time period",
            Self::Matrix(_) => "int matrix",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }

    /// Parses a JSON tree into a parameter document.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Document` for `null`, for numbers that are
    /// neither `i64` nor `f64`, and `ScenarioError::Geometry` for a duration
    /// object with out-of-range fields.
    pub fn from_json(json: serde_json::Value) -> Result<Self, ScenarioError> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Err(ScenarioError::document("null is not a valid parameter value")),
            Json::Bool(v) => Ok(Self::Bool(v)),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Self::Int(v))
                } else if let Some(v) = n.as_f64().filter(|_| !n.is_u64()) {
                    Ok(Self::Float(v))
                } else {
                    Err(ScenarioError::document(format!("number {n} is out of range")))
                }
            }
            Json::String(v) => Ok(Self::String(v)),
            Json::Array(items) => {
                if let Some(matrix) = int_matrix(&items) {
                    return Ok(Self::Matrix(matrix));
                }
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::List)
            }
            Json::Object(fields) => {
                if let Some(period) = duration(&fields)? {
                    return Ok(Self::Duration(period));
                }
                fields
                    .into_iter()
                    .map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(Self::Record)
            }
        }
    }

    /// Converts the document back to a JSON tree.
    ///
    /// # Errors
    ///
    /// Fails only for non-finite floats, which JSON cannot represent.
    pub fn to_json(&self) -> Result<serde_json::Value, ScenarioError> {
        serde_json::to_value(self).map_err(|e| ScenarioError::document(e.to_string()))
    }
}

/// A non-empty array whose elements are all arrays of integers.
fn int_matrix(items: &[serde_json::Value]) -> Option<Vec<Vec<i64>>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|row| {
            row.as_array()?
                .iter()
                .map(serde_json::Value::as_i64)
                .collect::<Option<Vec<_>>>()
        })
        .collect()
}

/// An object with exactly the four integer duration fields.
fn duration(
    fields: &serde_json::Map<String, serde_json::Value>,
) -> Result<Option<TimePeriod>, ScenarioError> {
    if fields.len() != TimePeriod::FIELDS.len() {
        return Ok(None);
    }
    let mut parts = [0i64; 4];
    for (slot, key) in parts.iter_mut().zip(TimePeriod::FIELDS) {
        match fields.get(key).and_then(serde_json::Value::as_i64) {
            Some(v) => *slot = v,
            None => return Ok(None),
        }
    }
    let [days, hours, minutes, seconds] = parts;
    Ok(Some(TimePeriod::new(days, hours, minutes, seconds)?))
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Duration(v) => v.serialize(serializer),
            Self::Matrix(rows) => serializer.collect_seq(rows),
            Self::List(items) => serializer.collect_seq(items),
            Self::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(json).map_err(D::Error::custom)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Duration(v) => write!(f, "{v}"),
            Self::Matrix(v) => write!(f, "matrix[{}]", v.len()),
            Self::List(v) => write!(f, "list[{}]", v.len()),
            Self::Record(v) => write!(f, "record{{{}}}", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<TimePeriod> for Value {
    fn from(v: TimePeriod) -> Self {
        Self::Duration(v)
    }
}

impl From<Vec<Vec<i64>>> for Value {
    fn from(v: Vec<Vec<i64>>) -> Self {
        Self::Matrix(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_keep_their_kind() {
        assert_eq!(Value::from_json(json!(3)).unwrap(), Value::Int(3));
        assert_eq!(Value::from_json(json!(3.0)).unwrap(), Value::Float(3.0));
        assert_eq!(Value::from_json(json!(-7)).unwrap(), Value::Int(-7));
    }

    #[test]
    fn test_null_is_rejected() {
        assert!(Value::from_json(json!(null)).is_err());
        assert!(Value::from_json(json!({"a": [1, null]})).is_err());
    }

    #[test]
    fn test_duration_object() {
        let v = Value::from_json(json!({"days": 0, "hours": 0, "minutes": 15, "seconds": 0}))
            .unwrap();
        assert_eq!(v, Value::Duration(TimePeriod::new(0, 0, 15, 0).unwrap()));
    }

    #[test]
    fn test_duration_object_out_of_range() {
        let err = Value::from_json(json!({"days": 0, "hours": 30, "minutes": 0, "seconds": 0}))
            .unwrap_err();
        assert!(err.is_geometry());
    }

    #[test]
    fn test_record_with_extra_key_is_not_a_duration() {
        let v = Value::from_json(
            json!({"days": 0, "hours": 0, "minutes": 0, "seconds": 0, "label": "x"}),
        )
        .unwrap();
        assert!(v.as_record().is_some());
    }

    #[test]
    fn test_matrix_and_list() {
        let m = Value::from_json(json!([[1, 2, 3], [4, 5, 6]])).unwrap();
        assert_eq!(m.as_matrix().unwrap().len(), 2);

        let l = Value::from_json(json!([[1, 2.5]])).unwrap();
        assert!(l.as_list().is_some());

        let empty = Value::from_json(json!([])).unwrap();
        assert_eq!(empty, Value::List(vec![]));
    }

    #[test]
    fn test_json_roundtrip() {
        let doc = json!({
            "human": {
                "infect_probability": 0.15,
                "incubation_time": {"days": 6, "hours": 0, "minutes": 0, "seconds": 0}
            },
            "patient": {"influx": [[1, 2], [3, 4]]},
            "doctors": [{"specialty": "surgeon"}]
        });
        let value = Value::from_json(doc.clone()).unwrap();
        assert_eq!(value.to_json().unwrap(), doc);
    }

    #[test]
    fn test_builder_and_lookup() {
        let v = Value::record()
            .with("walk_speed", 2.0)
            .with("beds", 90)
            .with("attention", TimePeriod::new(0, 0, 15, 0).unwrap());
        assert_eq!(v.get("beds").and_then(Value::as_int), Some(90));
        assert_eq!(v.get("walk_speed").and_then(Value::as_float), Some(2.0));
        assert!(v.get("missing").is_none());
        assert_eq!(v.get("attention").unwrap().type_name(), "time period");
    }

    #[test]
    fn test_int_is_not_read_as_float() {
        assert!(Value::Int(1).as_float().is_none());
        assert!(Value::Float(1.0).as_int().is_none());
    }
}
