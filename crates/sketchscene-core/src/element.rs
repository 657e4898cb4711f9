//! Scene elements.
//!
//! An [`ElementRecord`] is an ordered mapping from field name to
//! [`FieldValue`]. Field order is preserved so that serialized elements list
//! their fields in the order the source columns appeared, followed by the
//! fields asserted during parsing.

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::FieldValue;

/// Discriminator value of the `type` field for text elements.
pub const TEXT_ELEMENT_TYPE: &str = "text";

/// One typed visual element of a scene document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ElementRecord {
    fields: IndexMap<String, FieldValue>,
}

impl ElementRecord {
    /// Create an element with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns `true` if the field is present (including explicit `null`).
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a field, returning the previous value.
    ///
    /// Overwriting an existing field keeps its original position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Set a field only if it is not already present.
    pub fn insert_if_absent(&mut self, name: &str, value: impl Into<FieldValue>) {
        if !self.fields.contains_key(name) {
            self.fields.insert(name.to_string(), value.into());
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the element has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The value of the `type` field, if it is text.
    pub fn kind(&self) -> Option<&str> {
        self.get("type").and_then(FieldValue::as_str)
    }

    /// Returns `true` if this element is a text element.
    pub fn is_text(&self) -> bool {
        self.kind() == Some(TEXT_ELEMENT_TYPE)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ElementRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
