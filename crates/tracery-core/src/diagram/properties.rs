//! Ordered, named properties attached to diagram elements.
//!
//! Properties are the only user-editable state of most elements (names,
//! labels, flags). They keep their insertion order so that an element
//! serializes to the same text every time.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Well-known property keys.
pub mod keys {
    /// Display name of lifelines and text of notes.
    pub const NAME: &str = "name";
    /// Call node still active at the visual end of the diagram.
    pub const OPEN_BOTTOM: &str = "openBottom";
    /// Label drawn in the middle of call, return and constructor edges.
    pub const MIDDLE_LABEL: &str = "middleLabel";
    /// Asynchronous call edge.
    pub const SIGNAL: &str = "signal";
}

/// The value of a single property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// An ordered key to value map.
///
/// Setting an existing key replaces its value in place; setting a new key
/// appends it.
///
/// # Examples
///
/// ```
/// # use tracery_core::diagram::{Properties, PropertyValue};
/// let mut properties = Properties::new();
/// properties.set("name", "alice");
/// properties.set("openBottom", false);
/// properties.set("name", "bob");
///
/// let keys: Vec<_> = properties.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, ["name", "openBottom"]);
/// assert_eq!(properties.get_str("name"), Some("bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: IndexMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, keeping the key's position if it already exists.
    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Returns the value of `key` if it is a text property.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(PropertyValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the value of `key` if it is a boolean property.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(PropertyValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
