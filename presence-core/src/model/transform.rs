use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Reads `{x, y, z}` or `[x, y, z]`. Missing or non-numeric components
    /// become zero; anything else is the zero vector.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                x: component(map.get("x")),
                y: component(map.get("y")),
                z: component(map.get("z")),
            },
            Value::Array(items) => Self {
                x: component(items.first()),
                y: component(items.get(1)),
                z: component(items.get(2)),
            },
            _ => Self::ZERO,
        }
    }
}

fn component(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

impl From<Value> for Vec3 {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// Avatar pose at one instant plus free-form auxiliary state.
///
/// Deserialization never fails: each field is salvaged on its own and
/// malformed parts fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub auxiliary: Map<String, Value>,
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            auxiliary: Map::new(),
        }
    }

    pub fn with_auxiliary(mut self, key: impl Into<String>, value: Value) -> Self {
        self.auxiliary.insert(key.into(), value);
        self
    }
}

impl From<Value> for Transform {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let position = map.get("position").map(Vec3::from_value).unwrap_or_default();
        let rotation = map.get("rotation").map(Vec3::from_value).unwrap_or_default();
        let auxiliary = match map.remove("auxiliary") {
            Some(Value::Object(aux)) => aux,
            _ => Map::new(),
        };

        Self {
            position,
            rotation,
            auxiliary,
        }
    }
}
