//! Request shaping
//!
//! Pure functions that turn keys, payloads and caller options into the final
//! parameter map for each API call. No I/O happens here; the connection only
//! hands the result to the client.

use crate::key::{copy_source, normalize_key};
use crate::options::{DEFAULT_ACL, RequestOptions, names};
use crate::value::Value;

/// Parameters for CopyObject
///
/// Defaults: `Bucket`, `Key` (destination), `CopySource` (`bucket/src`) and
/// `ACL=public-read`.
pub fn copy_object_request(
    bucket: &str,
    src_key: &str,
    dest_key: &str,
    options: RequestOptions,
) -> RequestOptions {
    options.merge_defaults([
        (names::BUCKET, Value::from(bucket)),
        (names::KEY, Value::from(normalize_key(dest_key))),
        (names::COPY_SOURCE, Value::from(copy_source(bucket, src_key))),
        (names::ACL, Value::from(DEFAULT_ACL)),
    ])
}

/// Parameters for DeleteObject
pub fn delete_object_request(bucket: &str, key: &str, options: RequestOptions) -> RequestOptions {
    bucket_and_key(bucket, key, options)
}

/// Parameters for DeleteObjects
///
/// `Delete.Objects` lists one `{Key}` map per input key, in input order.
pub fn delete_objects_request<S: AsRef<str>>(
    bucket: &str,
    keys: &[S],
    options: RequestOptions,
) -> RequestOptions {
    let objects: Vec<Value> = keys
        .iter()
        .map(|key| Value::map([(names::KEY, normalize_key(key.as_ref()))]))
        .collect();

    options.merge_defaults([
        (names::BUCKET, Value::from(bucket)),
        (names::DELETE, Value::map([(names::OBJECTS, objects)])),
    ])
}

/// Parameters for GetObject
pub fn get_object_request(bucket: &str, key: &str, options: RequestOptions) -> RequestOptions {
    bucket_and_key(bucket, key, options).merge_defaults([(names::ACL, DEFAULT_ACL)])
}

/// Parameters for HeadObject
pub fn head_object_request(bucket: &str, key: &str, options: RequestOptions) -> RequestOptions {
    bucket_and_key(bucket, key, options)
}

/// Parameters for PutObject
pub fn put_object_request(
    bucket: &str,
    key: &str,
    content: Vec<u8>,
    options: RequestOptions,
) -> RequestOptions {
    bucket_and_key(bucket, key, options).merge_defaults([
        (names::ACL, Value::from(DEFAULT_ACL)),
        (names::BODY, Value::Bytes(content)),
    ])
}

fn bucket_and_key(bucket: &str, key: &str, options: RequestOptions) -> RequestOptions {
    options.merge_defaults([(names::BUCKET, bucket), (names::KEY, normalize_key(key))])
}
