//! Option translation
//!
//! Pulls typed values out of a merged `RequestOptions` map for one SDK call.
//! Each accessor removes the entry it reads; whatever is left when the
//! request is sent was not understood by the operation and is logged as a
//! warning.

use std::collections::HashMap;

use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use objdal_core::{Error, RequestOptions, Result, Value, names};

pub(crate) struct Params {
    operation: &'static str,
    options: RequestOptions,
}

impl Params {
    pub(crate) fn new(operation: &'static str, options: RequestOptions) -> Self {
        Self { operation, options }
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        self.options.remove(name).filter(|value| !value.is_null())
    }

    pub(crate) fn string(&mut self, name: &str) -> Result<Option<String>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch(name, "a string", &other)),
        }
    }

    /// String option parsed into an SDK enum such as `ObjectCannedAcl`
    pub(crate) fn enumeration<T>(&mut self, name: &str) -> Result<Option<T>>
    where
        T: for<'a> From<&'a str>,
    {
        Ok(self.string(name)?.map(|s| T::from(s.as_str())))
    }

    pub(crate) fn integer(&mut self, name: &str) -> Result<Option<i32>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Integer(i)) => i32::try_from(i)
                .map(Some)
                .map_err(|_| Error::invalid_option(name, format!("{i} is out of range"))),
            Some(other) => Err(mismatch(name, "an integer", &other)),
        }
    }

    pub(crate) fn long(&mut self, name: &str) -> Result<Option<i64>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(i)),
            Some(other) => Err(mismatch(name, "an integer", &other)),
        }
    }

    pub(crate) fn bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(mismatch(name, "a bool", &other)),
        }
    }

    /// RFC 3339 string or whole seconds since the Unix epoch
    pub(crate) fn timestamp(&mut self, name: &str) -> Result<Option<DateTime>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Integer(secs)) => Ok(Some(DateTime::from_secs(secs))),
            Some(Value::String(s)) => s
                .parse::<jiff::Timestamp>()
                .map(|ts| Some(DateTime::from_secs(ts.as_second())))
                .map_err(|e| Error::invalid_option(name, e.to_string())),
            Some(other) => Err(mismatch(name, "a timestamp", &other)),
        }
    }

    /// Payload bytes; string values are sent as their UTF-8 bytes
    pub(crate) fn bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Bytes(b)) => Ok(Some(b)),
            Some(Value::String(s)) => Ok(Some(s.into_bytes())),
            Some(other) => Err(mismatch(name, "bytes", &other)),
        }
    }

    /// Map of string to string, as used by `Metadata`
    pub(crate) fn string_map(&mut self, name: &str) -> Result<Option<HashMap<String, String>>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Map(map)) => map
                .into_iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k, s)),
                    other => Err(mismatch(&format!("{name}.{k}"), "a string", &other)),
                })
                .collect::<Result<HashMap<_, _>>>()
                .map(Some),
            Some(other) => Err(mismatch(name, "a map", &other)),
        }
    }

    /// `Delete` option of DeleteObjects: `{Objects: [{Key, VersionId?}], Quiet?}`
    pub(crate) fn delete(&mut self) -> Result<Option<Delete>> {
        match self.take(names::DELETE) {
            None => Ok(None),
            Some(Value::Map(mut map)) => {
                let objects = match map.remove(names::OBJECTS) {
                    Some(Value::List(items)) => items
                        .into_iter()
                        .map(object_identifier)
                        .collect::<Result<Vec<_>>>()?,
                    Some(other) => return Err(mismatch("Delete.Objects", "a list", &other)),
                    None => Vec::new(),
                };
                let quiet = match map.remove(names::QUIET) {
                    None | Some(Value::Null) => None,
                    Some(Value::Bool(b)) => Some(b),
                    Some(other) => return Err(mismatch("Delete.Quiet", "a bool", &other)),
                };

                Delete::builder()
                    .set_objects(Some(objects))
                    .set_quiet(quiet)
                    .build()
                    .map(Some)
                    .map_err(|e| Error::invalid_option(names::DELETE, e.to_string()))
            }
            Some(other) => Err(mismatch(names::DELETE, "a map", &other)),
        }
    }

    /// Drop an option this operation has no parameter for
    pub(crate) fn skip(&mut self, name: &str) {
        if self.options.remove(name).is_some() {
            tracing::debug!(operation = self.operation, option = name, "Option not applicable");
        }
    }

    /// Warn about every option nothing consumed
    pub(crate) fn finish(self) {
        for name in self.options.names() {
            tracing::warn!(operation = self.operation, option = name, "Ignoring unknown option");
        }
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> Vec<&str> {
        self.options.names().collect()
    }
}

fn object_identifier(item: Value) -> Result<ObjectIdentifier> {
    let mut map = match item {
        Value::Map(map) => map,
        other => return Err(mismatch("Delete.Objects[]", "a map", &other)),
    };

    let key = match map.remove(names::KEY) {
        Some(Value::String(s)) => s,
        Some(other) => return Err(mismatch("Delete.Objects[].Key", "a string", &other)),
        None => return Err(Error::invalid_option("Delete.Objects[].Key", "is required")),
    };
    let version_id = match map.remove(names::VERSION_ID) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => return Err(mismatch("Delete.Objects[].VersionId", "a string", &other)),
    };

    ObjectIdentifier::builder()
        .key(key)
        .set_version_id(version_id)
        .build()
        .map_err(|e| Error::invalid_option("Delete.Objects[]", e.to_string()))
}

fn mismatch(name: &str, expected: &str, got: &Value) -> Error {
    Error::invalid_option(name, format!("expected {expected}, got {}", got.kind()))
}
