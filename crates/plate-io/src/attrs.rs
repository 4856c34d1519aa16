//! Typed attribute sets.
//!
//! [`Attrs`] maps string keys to typed [`AttrValue`]s. Two things use it:
//!
//! - **Configuration**: reader and writer options arrive as an attribute set
//!   with the keys `dataWindow`, `displayWindow`, `channels`, `colorSpace`
//!   and `rawChannels` (see [`crate::options`]).
//! - **Header metadata**: readers report what they parsed from a file
//!   header (creator, timestamps, byte order...) through
//!   [`ImageReader::header`](crate::ImageReader::header).
//!
//! # Example
//!
//! ```rust
//! use plate_io::{AttrValue, Attrs};
//! use plate_core::Rect;
//!
//! let mut attrs = Attrs::new();
//! attrs.set("rawChannels", true);
//! attrs.set("dataWindow", Rect::new(0, 0, 15, 7));
//! attrs.set("creator", "plate-io");
//!
//! assert_eq!(attrs.get_bool("rawChannels"), Some(true));
//! assert_eq!(attrs.get_rect("dataWindow"), Some(Rect::new(0, 0, 15, 7)));
//! assert_eq!(attrs.get_str("creator"), Some("plate-io"));
//! ```

use std::collections::BTreeMap;

use plate_core::Rect;

/// Typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),

    /// UTF-8 string value.
    Str(String),

    /// Signed 32-bit integer.
    Int(i32),

    /// Unsigned 32-bit integer.
    UInt(u32),

    /// 32-bit floating point.
    Float(f32),

    /// 64-bit floating point.
    Double(f64),

    /// Integer window.
    Rect(Rect),

    /// List of strings, e.g. channel names.
    StrList(Vec<String>),
}

impl AttrValue {
    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Rect(_) => "rect",
            Self::StrList(_) => "string list",
        }
    }

    /// Returns the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i32`, converting from unsigned when it fits.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u32`, converting from signed when non-negative.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `f32`, converting from other numeric types.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Double(v) => Some(*v as f32),
            Self::Int(v) => Some(*v as f32),
            Self::UInt(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Returns the value as a boolean. Integers are truthy when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(v) => Some(*v != 0),
            Self::UInt(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Returns the value as a window.
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns the value as a string list. A single string is a list of one.
    pub fn as_str_list(&self) -> Option<Vec<String>> {
        match self {
            Self::StrList(v) => Some(v.clone()),
            Self::Str(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Rect(v) => write!(f, "{}", v),
            Self::StrList(v) => write!(f, "{}", v.join(",")),
        }
    }
}

// === From implementations for convenience ===

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Rect> for AttrValue {
    fn from(v: Rect) -> Self {
        Self::Rect(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        Self::StrList(v)
    }
}

/// Attribute container: string key -> typed value, sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    map: BTreeMap<String, AttrValue>,
}

impl Attrs {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.map.insert(key.into(), value.into());
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    /// Removes a value by key.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    /// Returns `true` if the key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    // === Typed getters ===

    /// Gets a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Gets an `i32` value.
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(AttrValue::as_i32)
    }

    /// Gets a `u32` value.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(AttrValue::as_u32)
    }

    /// Gets an `f32` value.
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(AttrValue::as_f32)
    }

    /// Gets a boolean value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttrValue::as_bool)
    }

    /// Gets a window value.
    pub fn get_rect(&self, key: &str) -> Option<Rect> {
        self.get(key).and_then(AttrValue::as_rect)
    }

    /// Gets a string list value.
    pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(AttrValue::as_str_list)
    }

    /// Sets a string value only if it is not blank after trimming NULs and
    /// whitespace. Used for fixed-width header text fields.
    pub fn set_text(&mut self, key: impl Into<String>, text: &str) {
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        if !text.is_empty() {
            self.set(key, text);
        }
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        let mut attrs = Attrs::new();
        attrs.set("a", 5u32);
        attrs.set("b", -1i32);
        assert_eq!(attrs.get_i32("a"), Some(5));
        assert_eq!(attrs.get_u32("b"), None);
        assert_eq!(attrs.get_f32("b"), Some(-1.0));
        assert_eq!(attrs.get_bool("a"), Some(true));
    }

    #[test]
    fn test_str_list_from_single() {
        let attrs: Attrs = [("channels", "R")].into_iter().collect();
        assert_eq!(attrs.get_str_list("channels"), Some(vec!["R".to_string()]));
    }

    #[test]
    fn test_set_text_trims() {
        let mut attrs = Attrs::new();
        attrs.set_text("creator", "nuke\0\0\0");
        attrs.set_text("empty", "\0\0  ");
        assert_eq!(attrs.get_str("creator"), Some("nuke"));
        assert!(!attrs.contains("empty"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::from(Rect::new(0, 0, 1, 1)).to_string(), "[0, 0]-[1, 1]");
        assert_eq!(AttrValue::StrList(vec!["R".into(), "G".into()]).to_string(), "R,G");
        assert_eq!(AttrValue::Bool(true).type_name(), "bool");
    }
}
