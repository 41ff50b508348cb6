//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the StorageClient trait from objdal-core.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::operation::head_object::builders::HeadObjectFluentBuilder;
use aws_sdk_s3::primitives::ByteStream;

use objdal_core::{
    ApiOutput, ClientFactory, Connection, ConnectionRegistry, Error, RegistryConfig,
    RequestOptions, Result, StorageClient, StorageConfig, names,
};

use crate::output;
use crate::params::Params;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a connection configuration
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        // Build credentials provider
        let credentials = aws_credential_types::Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None, // session token
            None, // expiry
            "objdal-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self::from_client(aws_sdk_s3::Client::from_conf(s3_config)))
    }

    /// Wrap an already configured aws-sdk-s3 client
    pub fn from_client(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    fn head_request(&self, p: &mut Params) -> Result<HeadObjectFluentBuilder> {
        Ok(self
            .inner
            .head_object()
            .set_bucket(p.string(names::BUCKET)?)
            .set_key(p.string(names::KEY)?)
            .set_version_id(p.string(names::VERSION_ID)?)
            .set_range(p.string("Range")?)
            .set_if_match(p.string("IfMatch")?)
            .set_if_modified_since(p.timestamp("IfModifiedSince")?)
            .set_if_none_match(p.string("IfNoneMatch")?)
            .set_if_unmodified_since(p.timestamp("IfUnmodifiedSince")?)
            .set_part_number(p.integer("PartNumber")?)
            .set_response_cache_control(p.string("ResponseCacheControl")?)
            .set_response_content_disposition(p.string("ResponseContentDisposition")?)
            .set_response_content_encoding(p.string("ResponseContentEncoding")?)
            .set_response_content_language(p.string("ResponseContentLanguage")?)
            .set_response_content_type(p.string("ResponseContentType")?)
            .set_response_expires(p.timestamp("ResponseExpires")?)
            .set_sse_customer_algorithm(p.string("SSECustomerAlgorithm")?)
            .set_sse_customer_key(p.string("SSECustomerKey")?)
            .set_sse_customer_key_md5(p.string("SSECustomerKeyMD5")?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?)
            .set_checksum_mode(p.enumeration("ChecksumMode")?))
    }
}

#[async_trait]
impl StorageClient for S3Client {
    async fn does_bucket_exist(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            // Credentials without s3:ListBucket get 403 for a bucket that exists
            Err(e) if e.raw_response().is_some_and(|r| r.status().as_u16() == 403) => {
                tracing::debug!(bucket, "HeadBucket access denied, assuming bucket exists");
                Ok(true)
            }
            Err(e) => Err(Error::upstream(e)),
        }
    }

    async fn copy_object(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("CopyObject", params);
        let request = self
            .inner
            .copy_object()
            .set_bucket(p.string(names::BUCKET)?)
            .set_key(p.string(names::KEY)?)
            .set_copy_source(p.string(names::COPY_SOURCE)?)
            .set_acl(p.enumeration(names::ACL)?)
            .set_cache_control(p.string("CacheControl")?)
            .set_checksum_algorithm(p.enumeration("ChecksumAlgorithm")?)
            .set_content_disposition(p.string("ContentDisposition")?)
            .set_content_encoding(p.string("ContentEncoding")?)
            .set_content_language(p.string("ContentLanguage")?)
            .set_content_type(p.string("ContentType")?)
            .set_copy_source_if_match(p.string("CopySourceIfMatch")?)
            .set_copy_source_if_modified_since(p.timestamp("CopySourceIfModifiedSince")?)
            .set_copy_source_if_none_match(p.string("CopySourceIfNoneMatch")?)
            .set_copy_source_if_unmodified_since(p.timestamp("CopySourceIfUnmodifiedSince")?)
            .set_expires(p.timestamp("Expires")?)
            .set_grant_full_control(p.string("GrantFullControl")?)
            .set_grant_read(p.string("GrantRead")?)
            .set_grant_read_acp(p.string("GrantReadACP")?)
            .set_grant_write_acp(p.string("GrantWriteACP")?)
            .set_metadata(p.string_map("Metadata")?)
            .set_metadata_directive(p.enumeration("MetadataDirective")?)
            .set_tagging_directive(p.enumeration("TaggingDirective")?)
            .set_server_side_encryption(p.enumeration("ServerSideEncryption")?)
            .set_storage_class(p.enumeration("StorageClass")?)
            .set_website_redirect_location(p.string("WebsiteRedirectLocation")?)
            .set_sse_customer_algorithm(p.string("SSECustomerAlgorithm")?)
            .set_sse_customer_key(p.string("SSECustomerKey")?)
            .set_sse_customer_key_md5(p.string("SSECustomerKeyMD5")?)
            .set_ssekms_key_id(p.string("SSEKMSKeyId")?)
            .set_ssekms_encryption_context(p.string("SSEKMSEncryptionContext")?)
            .set_bucket_key_enabled(p.bool("BucketKeyEnabled")?)
            .set_copy_source_sse_customer_algorithm(p.string("CopySourceSSECustomerAlgorithm")?)
            .set_copy_source_sse_customer_key(p.string("CopySourceSSECustomerKey")?)
            .set_copy_source_sse_customer_key_md5(p.string("CopySourceSSECustomerKeyMD5")?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_tagging(p.string("Tagging")?)
            .set_object_lock_mode(p.enumeration("ObjectLockMode")?)
            .set_object_lock_retain_until_date(p.timestamp("ObjectLockRetainUntilDate")?)
            .set_object_lock_legal_hold_status(p.enumeration("ObjectLockLegalHoldStatus")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?)
            .set_expected_source_bucket_owner(p.string("ExpectedSourceBucketOwner")?);
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        Ok(output::copy_object(&response))
    }

    async fn delete_object(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("DeleteObject", params);
        let request = self
            .inner
            .delete_object()
            .set_bucket(p.string(names::BUCKET)?)
            .set_key(p.string(names::KEY)?)
            .set_mfa(p.string("MFA")?)
            .set_version_id(p.string(names::VERSION_ID)?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_bypass_governance_retention(p.bool("BypassGovernanceRetention")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?)
            .set_if_match(p.string("IfMatch")?)
            .set_if_match_last_modified_time(p.timestamp("IfMatchLastModifiedTime")?)
            .set_if_match_size(p.long("IfMatchSize")?);
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        Ok(output::delete_object(&response))
    }

    async fn delete_objects(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("DeleteObjects", params);
        let request = self
            .inner
            .delete_objects()
            .set_bucket(p.string(names::BUCKET)?)
            .set_delete(p.delete()?)
            .set_mfa(p.string("MFA")?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_bypass_governance_retention(p.bool("BypassGovernanceRetention")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?)
            .set_checksum_algorithm(p.enumeration("ChecksumAlgorithm")?);
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        Ok(output::delete_objects(&response))
    }

    async fn does_object_exist(
        &self,
        bucket: &str,
        key: &str,
        mut options: RequestOptions,
    ) -> Result<bool> {
        options.insert(names::BUCKET, bucket);
        options.insert(names::KEY, key);

        let mut p = Params::new("HeadObject", options);
        let request = self.head_request(&mut p)?;
        p.finish();

        match request.send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(Error::upstream(e)),
        }
    }

    async fn get_object(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("GetObject", params);
        // GetObject takes no canned ACL
        p.skip(names::ACL);
        let request = self
            .inner
            .get_object()
            .set_bucket(p.string(names::BUCKET)?)
            .set_key(p.string(names::KEY)?)
            .set_version_id(p.string(names::VERSION_ID)?)
            .set_range(p.string("Range")?)
            .set_if_match(p.string("IfMatch")?)
            .set_if_modified_since(p.timestamp("IfModifiedSince")?)
            .set_if_none_match(p.string("IfNoneMatch")?)
            .set_if_unmodified_since(p.timestamp("IfUnmodifiedSince")?)
            .set_part_number(p.integer("PartNumber")?)
            .set_response_cache_control(p.string("ResponseCacheControl")?)
            .set_response_content_disposition(p.string("ResponseContentDisposition")?)
            .set_response_content_encoding(p.string("ResponseContentEncoding")?)
            .set_response_content_language(p.string("ResponseContentLanguage")?)
            .set_response_content_type(p.string("ResponseContentType")?)
            .set_response_expires(p.timestamp("ResponseExpires")?)
            .set_sse_customer_algorithm(p.string("SSECustomerAlgorithm")?)
            .set_sse_customer_key(p.string("SSECustomerKey")?)
            .set_sse_customer_key_md5(p.string("SSECustomerKeyMD5")?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?)
            .set_checksum_mode(p.enumeration("ChecksumMode")?);
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        let mut result = output::get_object(&response);

        let body = response
            .body
            .collect()
            .await
            .map_err(Error::upstream)?
            .into_bytes()
            .to_vec();
        result.insert(names::BODY, body);

        Ok(result)
    }

    async fn head_object(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("HeadObject", params);
        let request = self.head_request(&mut p)?;
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        Ok(output::head_object(&response))
    }

    async fn put_object(&self, params: RequestOptions) -> Result<ApiOutput> {
        let mut p = Params::new("PutObject", params);
        let request = self
            .inner
            .put_object()
            .set_bucket(p.string(names::BUCKET)?)
            .set_key(p.string(names::KEY)?)
            .set_body(p.bytes(names::BODY)?.map(ByteStream::from))
            .set_acl(p.enumeration(names::ACL)?)
            .set_cache_control(p.string("CacheControl")?)
            .set_content_disposition(p.string("ContentDisposition")?)
            .set_content_encoding(p.string("ContentEncoding")?)
            .set_content_language(p.string("ContentLanguage")?)
            .set_content_length(p.long("ContentLength")?)
            .set_content_md5(p.string("ContentMD5")?)
            .set_content_type(p.string("ContentType")?)
            .set_checksum_algorithm(p.enumeration("ChecksumAlgorithm")?)
            .set_checksum_crc32(p.string("ChecksumCRC32")?)
            .set_checksum_crc32_c(p.string("ChecksumCRC32C")?)
            .set_checksum_crc64_nvme(p.string("ChecksumCRC64NVME")?)
            .set_checksum_sha1(p.string("ChecksumSHA1")?)
            .set_checksum_sha256(p.string("ChecksumSHA256")?)
            .set_expires(p.timestamp("Expires")?)
            .set_if_match(p.string("IfMatch")?)
            .set_if_none_match(p.string("IfNoneMatch")?)
            .set_grant_full_control(p.string("GrantFullControl")?)
            .set_grant_read(p.string("GrantRead")?)
            .set_grant_read_acp(p.string("GrantReadACP")?)
            .set_grant_write_acp(p.string("GrantWriteACP")?)
            .set_write_offset_bytes(p.long("WriteOffsetBytes")?)
            .set_metadata(p.string_map("Metadata")?)
            .set_server_side_encryption(p.enumeration("ServerSideEncryption")?)
            .set_storage_class(p.enumeration("StorageClass")?)
            .set_website_redirect_location(p.string("WebsiteRedirectLocation")?)
            .set_sse_customer_algorithm(p.string("SSECustomerAlgorithm")?)
            .set_sse_customer_key(p.string("SSECustomerKey")?)
            .set_sse_customer_key_md5(p.string("SSECustomerKeyMD5")?)
            .set_ssekms_key_id(p.string("SSEKMSKeyId")?)
            .set_ssekms_encryption_context(p.string("SSEKMSEncryptionContext")?)
            .set_bucket_key_enabled(p.bool("BucketKeyEnabled")?)
            .set_request_payer(p.enumeration("RequestPayer")?)
            .set_tagging(p.string("Tagging")?)
            .set_object_lock_mode(p.enumeration("ObjectLockMode")?)
            .set_object_lock_retain_until_date(p.timestamp("ObjectLockRetainUntilDate")?)
            .set_object_lock_legal_hold_status(p.enumeration("ObjectLockLegalHoldStatus")?)
            .set_expected_bucket_owner(p.string("ExpectedBucketOwner")?);
        p.finish();

        let response = request.send().await.map_err(Error::upstream)?;
        Ok(output::put_object(&response))
    }
}

/// Builds `S3Client`s for the connection registry
#[derive(Debug, Default, Clone, Copy)]
pub struct S3ClientFactory;

#[async_trait]
impl ClientFactory for S3ClientFactory {
    async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn StorageClient>> {
        Ok(Arc::new(S3Client::new(config).await?))
    }
}

/// Open a connection to the bucket described by `config`
///
/// Fails with a configuration error when required fields are missing or the
/// bucket does not exist.
pub async fn connect(config: StorageConfig) -> Result<Connection> {
    Connection::connect(config, &S3ClientFactory).await
}

/// Create a registry whose connections are backed by `S3Client`
pub fn registry(config: RegistryConfig) -> ConnectionRegistry {
    ConnectionRegistry::from_config(Arc::new(S3ClientFactory), config)
}
