//! Request options and API output mappings
//!
//! Both are open name/value maps. Option names follow the S3 API parameter
//! names (`Bucket`, `Key`, `ACL`, ...) so callers can pass anything the
//! underlying client understands.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Well-known option and result field names
pub mod names {
    pub const BUCKET: &str = "Bucket";
    pub const KEY: &str = "Key";
    pub const ACL: &str = "ACL";
    pub const COPY_SOURCE: &str = "CopySource";
    pub const BODY: &str = "Body";
    pub const DELETE: &str = "Delete";
    pub const OBJECTS: &str = "Objects";
    pub const QUIET: &str = "Quiet";
    pub const VERSION_ID: &str = "VersionId";
}

/// Canned ACL applied by default to copy, get and put requests
pub const DEFAULT_ACL: &str = "public-read";

/// Extra or overriding parameters for a single API call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    entries: BTreeMap<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fill in defaults for every name the caller did not supply
    ///
    /// Caller-supplied entries always win, even when a default exists for the
    /// same name.
    pub fn merge_defaults<K, V>(mut self, defaults: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in defaults {
            self.entries.entry(name.into()).or_insert_with(|| value.into());
        }
        self
    }

    /// Build options from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::invalid_option(
                "<options>",
                format!("expected a JSON object, got {other}"),
            )),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RequestOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for RequestOptions {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Fields returned by the underlying client for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiOutput {
    fields: BTreeMap<String, Value>,
}

impl ApiOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Insert only when a value is present
    pub fn insert_opt<V: Into<Value>>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Payload bytes of a get result, if any
    pub fn body(&self) -> Option<&[u8]> {
        self.get(names::BODY).and_then(Value::as_bytes)
    }

    /// Take the payload out of the result
    pub fn into_body(mut self) -> Result<Vec<u8>> {
        match self.fields.remove(names::BODY) {
            Some(Value::Bytes(bytes)) => Ok(bytes),
            Some(Value::String(text)) => Ok(text.into_bytes()),
            _ => Err(Error::MissingField(names::BODY.to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ApiOutput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fills_missing_defaults() {
        let options = RequestOptions::new().merge_defaults([
            (names::BUCKET, "bkt"),
            (names::ACL, DEFAULT_ACL),
        ]);

        assert_eq!(options.get_str(names::BUCKET), Some("bkt"));
        assert_eq!(options.get_str(names::ACL), Some("public-read"));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_merge_caller_wins() {
        let options = RequestOptions::new()
            .with(names::ACL, "private")
            .with("overwrote-options", true)
            .merge_defaults([(names::ACL, DEFAULT_ACL), (names::KEY, "k")]);

        assert_eq!(options.get_str(names::ACL), Some("private"));
        assert_eq!(options.get_str(names::KEY), Some("k"));
        assert_eq!(options.get("overwrote-options"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_from_json() {
        let options =
            RequestOptions::from_json(serde_json::json!({"ACL": "private", "Quiet": true}))
                .unwrap();
        assert_eq!(options.get_str("ACL"), Some("private"));
        assert_eq!(options.names().collect::<Vec<_>>(), vec!["ACL", "Quiet"]);

        let err = RequestOptions::from_json(serde_json::json!(["ACL"])).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
    }

    #[test]
    fn test_output_body() {
        let output = ApiOutput::new()
            .with(names::BODY, b"payload".to_vec())
            .with("ETag", "abc");
        assert_eq!(output.body(), Some(&b"payload"[..]));
        assert_eq!(output.into_body().unwrap(), b"payload".to_vec());
    }

    #[test]
    fn test_output_missing_body() {
        let output = ApiOutput::new().with("ETag", "abc");
        assert!(output.body().is_none());

        let err = output.into_body().unwrap_err();
        assert!(matches!(err, Error::MissingField(ref f) if f == "Body"));
    }

    #[test]
    fn test_insert_opt() {
        let mut output = ApiOutput::new();
        output.insert_opt("VersionId", None::<String>);
        output.insert_opt("ETag", Some("abc"));
        assert!(!output.contains("VersionId"));
        assert_eq!(output.get_str("ETag"), Some("abc"));
    }
}
