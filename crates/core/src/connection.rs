//! Bucket connection
//!
//! A `Connection` is the validated access point to one bucket. It normalizes
//! keys, merges default request parameters and hands the result to its
//! storage client. Client failures come back unchanged.

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::key::normalize_key;
use crate::options::{ApiOutput, RequestOptions};
use crate::request;
use crate::traits::{ClientFactory, Datasource, StorageClient};

/// Configured access point to one bucket
pub struct Connection {
    config: StorageConfig,
    client: Arc<dyn StorageClient>,
}

impl Connection {
    /// Validate `config`, build a client for it and check that the bucket exists
    ///
    /// No client is built when validation fails.
    pub async fn connect(config: StorageConfig, factory: &dyn ClientFactory) -> Result<Self> {
        config.validate()?;
        let client = factory.create(&config).await?;
        Self::check_bucket(config, client).await
    }

    /// Validate `config` and check the bucket using an existing client
    pub async fn with_client(
        config: StorageConfig,
        client: Arc<dyn StorageClient>,
    ) -> Result<Self> {
        config.validate()?;
        Self::check_bucket(config, client).await
    }

    async fn check_bucket(config: StorageConfig, client: Arc<dyn StorageClient>) -> Result<Self> {
        if !client.does_bucket_exist(&config.bucket_name).await? {
            return Err(Error::Config(format!(
                "Bucket '{}' is not found.",
                config.bucket_name
            )));
        }

        tracing::info!(
            bucket = %config.bucket_name,
            region = %config.region,
            name = config.config_name(),
            "Connected to bucket"
        );

        Ok(Self { config, client })
    }

    pub fn bucket_name(&self) -> &str {
        &self.config.bucket_name
    }

    /// Get the underlying storage client
    pub fn client(&self) -> &Arc<dyn StorageClient> {
        &self.client
    }

    /// Server-side copy of `src_key` to `dest_key` within the bucket
    pub async fn copy_object(
        &self,
        src_key: &str,
        dest_key: &str,
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        tracing::debug!(bucket = %self.bucket_name(), src_key, dest_key, "copy_object");
        let params = request::copy_object_request(self.bucket_name(), src_key, dest_key, options);
        self.client.copy_object(params).await
    }

    pub async fn delete_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        tracing::debug!(bucket = %self.bucket_name(), key, "delete_object");
        let params = request::delete_object_request(self.bucket_name(), key, options);
        self.client.delete_object(params).await
    }

    /// Delete several objects in one request
    pub async fn delete_objects<S: AsRef<str> + Sync>(
        &self,
        keys: &[S],
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        tracing::debug!(bucket = %self.bucket_name(), count = keys.len(), "delete_objects");
        let params = request::delete_objects_request(self.bucket_name(), keys, options);
        self.client.delete_objects(params).await
    }

    pub async fn does_object_exist(&self, key: &str, options: RequestOptions) -> Result<bool> {
        let key = normalize_key(key);
        tracing::debug!(bucket = %self.bucket_name(), key, "does_object_exist");
        self.client
            .does_object_exist(self.bucket_name(), key, options)
            .await
    }

    pub async fn get_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        tracing::debug!(bucket = %self.bucket_name(), key, "get_object");
        let params = request::get_object_request(self.bucket_name(), key, options);
        self.client.get_object(params).await
    }

    pub async fn head_object(&self, key: &str, options: RequestOptions) -> Result<ApiOutput> {
        tracing::debug!(bucket = %self.bucket_name(), key, "head_object");
        let params = request::head_object_request(self.bucket_name(), key, options);
        self.client.head_object(params).await
    }

    pub async fn put_object(
        &self,
        key: &str,
        content: impl Into<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<ApiOutput> {
        let content = content.into();
        tracing::debug!(bucket = %self.bucket_name(), key, size = content.len(), "put_object");
        let params = request::put_object_request(self.bucket_name(), key, content, options);
        self.client.put_object(params).await
    }
}

impl Datasource for Connection {
    fn config_name(&self) -> &str {
        self.config.config_name()
    }

    fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Object storage has no transactions; `transaction` is not invoked.
    fn transactional(&self, _transaction: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        Ok(())
    }

    /// Object storage has no constraints; `operation` is not invoked.
    fn disable_constraints(&self, _operation: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        Ok(())
    }

    /// There are no queries to log; always reports `false`.
    fn log_queries(&self, _enable: Option<bool>) -> bool {
        false
    }

    /// No query logger applies to object storage.
    fn logger(&self) -> Option<tracing::Dispatch> {
        None
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockClientFactory, MockStorageClient};
    use crate::value::Value;
    use mockall::predicate::eq;

    fn test_config() -> StorageConfig {
        StorageConfig::new("test-key", "test-secret", "test-region", "test-bucket")
    }

    /// Client mock that already answers the bucket-existence check
    fn client_mock() -> MockStorageClient {
        let mut mock = MockStorageClient::new();
        mock.expect_does_bucket_exist()
            .with(eq("test-bucket"))
            .times(1)
            .returning(|_| Ok(true));
        mock
    }

    async fn connection(mock: MockStorageClient) -> Connection {
        Connection::with_client(test_config(), Arc::new(mock))
            .await
            .unwrap()
    }

    fn params(entries: Vec<(&str, Value)>) -> RequestOptions {
        entries.into_iter().collect()
    }

    #[derive(Debug)]
    struct Denied;

    impl std::fmt::Display for Denied {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "AccessDenied")
        }
    }

    impl std::error::Error for Denied {}

    #[tokio::test]
    async fn test_new_instance_success() {
        let connection = connection(client_mock()).await;
        assert_eq!(connection.config().access_key, "test-key");
        assert_eq!(connection.bucket_name(), "test-bucket");
        assert_eq!(connection.config_name(), "");
    }

    #[tokio::test]
    async fn test_connect_uses_factory() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|_| Ok(Arc::new(client_mock()) as Arc<dyn StorageClient>));

        let config = test_config().with_display_name("assets");
        let connection = Connection::connect(config, &factory).await.unwrap();
        assert_eq!(connection.config_name(), "assets");
    }

    #[tokio::test]
    async fn test_connect_checks_bucket_of_built_client() {
        let mut factory = MockClientFactory::new();
        factory
            .expect_create()
            .withf(|config| config.bucket_name == "test-bucket")
            .times(1)
            .returning(|_| {
                let mut mock = MockStorageClient::new();
                mock.expect_does_bucket_exist()
                    .with(eq("test-bucket"))
                    .times(1)
                    .returning(|_| Ok(false));
                Ok(Arc::new(mock) as Arc<dyn StorageClient>)
            });

        let err = Connection::connect(test_config(), &factory)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Bucket 'test-bucket' is not found."));
    }

    #[tokio::test]
    async fn test_missing_arguments_never_builds_client() {
        let mut factory = MockClientFactory::new();
        factory.expect_create().never();

        let result = Connection::connect(StorageConfig::default(), &factory).await;
        assert!(matches!(result, Err(Error::Config(_))));

        let mut config = test_config();
        config.region.clear();
        let result = Connection::connect(config, &factory).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_arguments_skip_bucket_check() {
        let mut mock = MockStorageClient::new();
        mock.expect_does_bucket_exist().never();

        let mut config = test_config();
        config.bucket_name.clear();
        let result = Connection::with_client(config, Arc::new(mock)).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_bucket_not_found() {
        let mut mock = MockStorageClient::new();
        mock.expect_does_bucket_exist().returning(|_| Ok(false));

        let err = Connection::with_client(test_config(), Arc::new(mock))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Bucket 'test-bucket' is not found."));
    }

    #[tokio::test]
    async fn test_bucket_check_failure_propagates() {
        let mut mock = MockStorageClient::new();
        mock.expect_does_bucket_exist()
            .returning(|_| Err(Error::upstream(Denied)));

        let err = Connection::with_client(test_config(), Arc::new(mock))
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_copy_object() {
        let mut mock = client_mock();
        mock.expect_copy_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "test-dest-key".into()),
                ("CopySource", "test-bucket/test-src-key".into()),
                ("ACL", "public-read".into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        connection
            .copy_object("/test-src-key", "/test-dest-key", RequestOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_copy_object_overwrote_options() {
        let mut mock = client_mock();
        mock.expect_copy_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "test-dest-key".into()),
                ("CopySource", "test-bucket/test-src-key".into()),
                ("ACL", "overwrote".into()),
                ("overwrote-options", true.into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        let options = RequestOptions::new()
            .with("ACL", "overwrote")
            .with("overwrote-options", true);
        connection
            .copy_object("/test-src-key", "/test-dest-key", options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_object() {
        let mut mock = client_mock();
        mock.expect_delete_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "foo/bar".into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        connection
            .delete_object("/foo/bar", RequestOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_objects() {
        let mut mock = client_mock();
        mock.expect_delete_objects()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                (
                    "Delete",
                    Value::map([(
                        "Objects",
                        vec![
                            Value::map([("Key", "test-key1")]),
                            Value::map([("Key", "test-key2")]),
                            Value::map([("Key", "test-key3")]),
                        ],
                    )]),
                ),
                ("overwrote-options", true.into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        let options = RequestOptions::new().with("overwrote-options", true);
        connection
            .delete_objects(&["/test-key1", "/test-key2", "test-key3"], options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_does_object_exist() {
        let mut mock = client_mock();
        mock.expect_does_object_exist()
            .withf(|bucket, key, options| {
                bucket == "test-bucket"
                    && key == "test-key"
                    && options.get("overwrote-options") == Some(&Value::Bool(true))
                    && !options.contains("Bucket")
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let connection = connection(mock).await;
        let options = RequestOptions::new().with("overwrote-options", true);
        assert!(connection.does_object_exist("/test-key", options).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_object() {
        let mut mock = client_mock();
        mock.expect_get_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "test-key".into()),
                ("ACL", "public-read".into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new().with("Body", b"content".to_vec())));

        let connection = connection(mock).await;
        let output = connection
            .get_object("/test-key", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(output.body(), Some(&b"content"[..]));
    }

    #[tokio::test]
    async fn test_get_object_overwrote_acl() {
        let mut mock = client_mock();
        mock.expect_get_object()
            .withf(|params| params.get_str("ACL") == Some("private"))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        let options = RequestOptions::new().with("ACL", "private");
        connection.get_object("test-key", options).await.unwrap();
    }

    #[tokio::test]
    async fn test_head_object() {
        let mut mock = client_mock();
        mock.expect_head_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "test-key".into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new().with("ContentLength", 7)));

        let connection = connection(mock).await;
        let output = connection
            .head_object("/test-key", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(output.get("ContentLength"), Some(&Value::Integer(7)));
    }

    #[tokio::test]
    async fn test_put_object() {
        let mut mock = client_mock();
        mock.expect_put_object()
            .with(eq(params(vec![
                ("Bucket", "test-bucket".into()),
                ("Key", "test-key".into()),
                ("Body", Value::Bytes(b"test-body".to_vec())),
                ("ACL", "public-read".into()),
                ("overwrote-options", true.into()),
            ])))
            .times(1)
            .returning(|_| Ok(ApiOutput::new()));

        let connection = connection(mock).await;
        let options = RequestOptions::new().with("overwrote-options", true);
        connection
            .put_object("/test-key", "test-body", options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_wrapped() {
        let mut mock = client_mock();
        mock.expect_head_object()
            .returning(|_| Err(Error::upstream(Denied)));

        let connection = connection(mock).await;
        let err = connection
            .head_object("key", RequestOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "AccessDenied");
    }

    #[tokio::test]
    async fn test_unsupported_datasource_methods() {
        let connection = connection(client_mock()).await;

        let mut calls = 0;
        connection
            .transactional(&mut || {
                calls += 1;
                Ok(())
            })
            .unwrap();
        connection
            .disable_constraints(&mut || {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 0);

        assert!(!connection.log_queries(Some(true)));
        assert!(connection.logger().is_none());
    }
}
