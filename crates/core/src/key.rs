//! Object key handling
//!
//! Keys are used verbatim apart from one rule: a single leading `/` is
//! dropped, so `/avatars/1.png` and `avatars/1.png` address the same object.

/// Path separator stripped from the front of object keys
pub const SEPARATOR: char = '/';

/// Normalize an object key by removing exactly one leading separator
pub fn normalize_key(key: &str) -> &str {
    key.strip_prefix(SEPARATOR).unwrap_or(key)
}

/// Build the `bucket/key` copy source for a server-side copy
pub fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}{SEPARATOR}{}", normalize_key(key))
}
