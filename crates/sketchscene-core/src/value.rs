//! Typed field values for scene elements.
//!
//! Every field of an [`ElementRecord`](crate::element::ElementRecord) holds a
//! [`FieldValue`]. The enum is deliberately small: the drawing format only
//! needs scalars, point sequences and opaque nested structures.
//!
//! # Number Rendering
//!
//! Numbers are stored as `f64`. When serialized, integral values that fit in
//! an `i64` are written as JSON integers so that `x = 10` appears as `10`
//! rather than `10.0`. Non-finite numbers serialize as `null`.

use serde::{Serialize, Serializer, ser::SerializeTuple};
use serde_json::Value;

/// Largest magnitude rendered as a JSON integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single two-dimensional coordinate pair, as used by `points`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    pub fn origin() -> Self {
        Self::default()
    }

    /// Horizontal coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Build a point from a JSON `[x, y]` pair.
    ///
    /// Returns `None` unless the value is an array of exactly two numbers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [x, y] => Some(Self::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&Number(self.x))?;
        pair.serialize_element(&Number(self.y))?;
        pair.end()
    }
}

/// The value of one element field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit JSON `null`.
    Null,
    /// A boolean flag such as `isDeleted` or `locked`.
    Bool(bool),
    /// A numeric field such as `x` or `strokeWidth`.
    Number(f64),
    /// Free-form text.
    Text(String),
    /// An ordered sequence of coordinate pairs.
    Points(Vec<Point>),
    /// Any other nested structure (arrays, objects, bindings).
    Structured(Value),
}

impl FieldValue {
    /// An empty sequence, the fallback for list-valued fields.
    pub fn empty_sequence() -> Self {
        Self::Structured(Value::Array(Vec::new()))
    }

    /// Convert parsed JSON into the narrowest matching variant.
    ///
    /// Arrays and objects stay [`FieldValue::Structured`]; point sequences are
    /// only recognised by callers that know the field expects them.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number
                .as_f64()
                .map_or_else(|| Self::Structured(Value::Number(number)), Self::Number),
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }

    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`FieldValue::Text`].
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// The text content, if this is a [`FieldValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The numeric content, if this is a [`FieldValue::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// The boolean content, if this is a [`FieldValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// The point sequence, if this is a [`FieldValue::Points`].
    pub fn as_points(&self) -> Option<&[Point]> {
        match self {
            Self::Points(points) => Some(points),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<f64> for FieldValue {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Point>> for FieldValue {
    fn from(points: Vec<Point>) -> Self {
        Self::Points(points)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => Number(*number).serialize(serializer),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Points(points) => points.serialize(serializer),
            Self::Structured(value) => value.serialize(serializer),
        }
    }
}

/// Serialization helper applying the integer rendering rule.
struct Number(f64);

impl Serialize for Number {
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let number = self.0;
        if !number.is_finite() {
            serializer.serialize_unit()
        } else if number.fract() == 0.0 && number.abs() <= MAX_EXACT_INTEGER {
            serializer.serialize_i64(number as i64)
        } else {
            serializer.serialize_f64(number)
        }
    }
}
