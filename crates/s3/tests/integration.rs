//! Integration tests for objdal-s3
//!
//! These tests require a running S3-compatible server and an existing bucket.
//!
//! Run with:
//! ```bash
//! # Start RustFS container
//! docker run -d --name rustfs -p 9000:9000 \
//!     -e RUSTFS_ACCESS_KEY=accesskey \
//!     -e RUSTFS_SECRET_KEY=secretkey \
//!     rustfs/rustfs:1.0.0-alpha.81
//!
//! # Run tests
//! OBJDAL_TEST_ENDPOINT=http://localhost:9000 \
//! OBJDAL_TEST_BUCKET=objdal-test \
//!     cargo test -p objdal-s3 --features integration
//! ```

#![cfg(feature = "integration")]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use objdal_core::{Error, RequestOptions, StorageConfig, Table};
use objdal_s3::connect;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn test_config() -> StorageConfig {
    StorageConfig::new(
        env_or("OBJDAL_TEST_ACCESS_KEY", "accesskey"),
        env_or("OBJDAL_TEST_SECRET_KEY", "secretkey"),
        env_or("OBJDAL_TEST_REGION", "us-east-1"),
        env_or("OBJDAL_TEST_BUCKET", "objdal-test"),
    )
    .with_endpoint(env_or("OBJDAL_TEST_ENDPOINT", "http://localhost:9000"))
    .with_force_path_style(true)
    .with_display_name("integration")
}

/// Unique key prefix so concurrent runs do not collide
fn prefix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("/objdal-it/{nanos}")
}

async fn table() -> Table {
    let connection = connect(test_config()).await.expect("Failed to connect");
    Table::with_connection(Arc::new(connection))
}

#[tokio::test]
async fn test_missing_bucket_fails_construction() {
    let mut config = test_config();
    config.bucket_name = "objdal-bucket-that-does-not-exist".to_string();

    let err = connect(config).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
}

#[tokio::test]
async fn test_put_get_head_delete() {
    let table = table().await;
    let key = format!("{}/hello.txt", prefix());

    let options = RequestOptions::new()
        .with("ContentType", "text/plain")
        // Many S3-compatible servers reject canned ACLs
        .with("ACL", "private");
    table.put_object(&key, "hello", options).await.unwrap();

    assert!(table.does_object_exist(&key, RequestOptions::new()).await.unwrap());

    let head = table.head_object(&key, RequestOptions::new()).await.unwrap();
    assert_eq!(head.get_str("ContentType"), Some("text/plain"));

    let content = table
        .get_object_content(&key, RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(content, b"hello");

    table.delete_object(&key, RequestOptions::new()).await.unwrap();
    assert!(!table.does_object_exist(&key, RequestOptions::new()).await.unwrap());
}

#[tokio::test]
async fn test_move_object() {
    let table = table().await;
    let base = prefix();
    let src = format!("{base}/src.txt");
    let dest = format!("{base}/dest.txt");
    let private = || RequestOptions::new().with("ACL", "private");

    table.put_object(&src, "moved", private()).await.unwrap();
    table.move_object(&src, &dest, private()).await.unwrap();

    assert!(!table.does_object_exist(&src, RequestOptions::new()).await.unwrap());
    let content = table
        .get_object_content(&dest, RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(content, b"moved");

    table.delete_object(&dest, RequestOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_delete_objects() {
    let table = table().await;
    let base = prefix();
    let keys: Vec<String> = (0..3).map(|i| format!("{base}/batch-{i}")).collect();

    for key in &keys {
        let options = RequestOptions::new().with("ACL", "private");
        table.put_object(key, "x", options).await.unwrap();
    }

    let result = table
        .delete_objects(&keys, RequestOptions::new())
        .await
        .unwrap();
    let deleted = result.get("Deleted").and_then(|v| v.as_list()).unwrap();
    assert_eq!(deleted.len(), 3);

    for key in &keys {
        assert!(!table.does_object_exist(key, RequestOptions::new()).await.unwrap());
    }
}

#[tokio::test]
async fn test_get_missing_object_is_upstream_error() {
    let table = table().await;
    let key = format!("{}/missing", prefix());

    let err = table
        .get_object(&key, RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_upstream());
}
