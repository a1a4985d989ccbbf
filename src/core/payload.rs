//! Loosely-typed event payloads.
//!
//! A payload is a string-keyed map of [`PayloadValue`]s passed to every
//! listener of a triggered event. There is no schema: receivers look up the
//! keys they care about and treat missing or mistyped values as "no update".
//!
//! Values serialize untagged, so a plain JSON object such as
//! `{"position": 42.0, "live": false}` deserializes directly into a `Payload`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload value: the tagged union carried by [`Payload`] entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PayloadValue>),
    Map(Payload),
}

impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        PayloadValue::Bool(v)
    }
}

impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        PayloadValue::Int(v)
    }
}

impl From<i32> for PayloadValue {
    fn from(v: i32) -> Self {
        PayloadValue::Int(v as i64)
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}

impl From<f32> for PayloadValue {
    fn from(v: f32) -> Self {
        PayloadValue::Float(v as f64)
    }
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        PayloadValue::Str(v.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        PayloadValue::Str(v)
    }
}

impl From<Payload> for PayloadValue {
    fn from(v: Payload) -> Self {
        PayloadValue::Map(v)
    }
}

impl<T: Into<PayloadValue>> From<Vec<T>> for PayloadValue {
    fn from(v: Vec<T>) -> Self {
        PayloadValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Event payload container: string key → loosely-typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    map: HashMap<String, PayloadValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Builder-style insert, for inline construction at trigger sites:
    /// ```ignore
    /// emitter.trigger_with(Event::PositionUpdate, &Payload::new().with("position", 42.0));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(PayloadValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.map.get(key) {
            Some(PayloadValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Numeric lookup. Integers are widened, since JSON producers often
    /// drop the fractional part of whole numbers.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.map.get(key) {
            Some(PayloadValue::Float(v)) => Some(*v),
            Some(PayloadValue::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(PayloadValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_map(&self, key: &str) -> Option<&Payload> {
        match self.map.get(key) {
            Some(PayloadValue::Map(m)) => Some(m),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[PayloadValue]> {
        match self.map.get(key) {
            Some(PayloadValue::List(l)) => Some(l),
            _ => None,
        }
    }

    /// Get float value with custom default
    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        self.get_f64(key).unwrap_or(default)
    }

    /// Get bool value with custom default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Remove entry by key
    pub fn remove(&mut self, key: &str) -> Option<PayloadValue> {
        self.map.remove(key)
    }

    /// Iterate over all entries (key, value)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.map.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let p = Payload::new()
            .with("position", 42.0)
            .with("name", "clip")
            .with("live", true)
            .with("index", 3);

        assert_eq!(p.get_f64("position"), Some(42.0));
        assert_eq!(p.get_str("name"), Some("clip"));
        assert_eq!(p.get_bool("live"), Some(true));
        assert_eq!(p.get_i64("index"), Some(3));
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_mistyped_and_missing_keys_are_none() {
        let p = Payload::new().with("position", "not a number");

        assert_eq!(p.get_f64("position"), None);
        assert_eq!(p.get_f64("missing"), None);
        assert_eq!(p.get_f64_or("missing", 1.5), 1.5);
        assert!(!p.get_bool_or("live", false));
    }

    #[test]
    fn test_int_widens_to_float() {
        let p = Payload::new().with("end_position", 90);
        assert_eq!(p.get_f64("end_position"), Some(90.0));
        // ...but not the other way around
        let p = Payload::new().with("index", 1.5);
        assert_eq!(p.get_i64("index"), None);
    }

    #[test]
    fn test_nested_map_and_list() {
        let inner = Payload::new().with("code", 404);
        let p = Payload::new()
            .with("error", inner.clone())
            .with("tracks", vec!["en", "pt"]);

        assert_eq!(p.get_map("error"), Some(&inner));
        assert_eq!(p.get_map("error").and_then(|e| e.get_i64("code")), Some(404));
        assert_eq!(p.get_list("tracks").map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_plain_json_object_parses() {
        let p: Payload = serde_json::from_str(
            r#"{"position": 42.0, "end_position": 60, "live": false, "meta": {"title": "x"}}"#,
        )
        .unwrap();

        assert_eq!(p.get_f64("position"), Some(42.0));
        assert_eq!(p.get_i64("end_position"), Some(60));
        assert_eq!(p.get_bool("live"), Some(false));
        assert_eq!(p.get_map("meta").and_then(|m| m.get_str("title")), Some("x"));
    }

    #[test]
    fn test_collect_from_pairs() {
        let p: Payload = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(p.get_i64("b"), Some(2));
        assert!(Payload::default().is_empty());
    }
}
