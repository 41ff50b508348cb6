//! SDK output conversion
//!
//! Copies the fields of each SDK response into an `ApiOutput`, keyed by the
//! S3 API field names.

use std::collections::HashMap;

use aws_sdk_s3::operation::copy_object::CopyObjectOutput;
use aws_sdk_s3::operation::delete_object::DeleteObjectOutput;
use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use objdal_core::{ApiOutput, Value};

pub(crate) fn copy_object(response: &CopyObjectOutput) -> ApiOutput {
    let mut output = ApiOutput::new();

    if let Some(result) = response.copy_object_result() {
        let mut fields = ApiOutput::new();
        fields.insert_opt("ETag", result.e_tag());
        fields.insert_opt("LastModified", result.last_modified().and_then(timestamp));
        output.insert("CopyObjectResult", to_map(&fields));
    }

    output.insert_opt("VersionId", response.version_id());
    output.insert_opt("CopySourceVersionId", response.copy_source_version_id());
    output
}

pub(crate) fn delete_object(response: &DeleteObjectOutput) -> ApiOutput {
    let mut output = ApiOutput::new();
    output.insert_opt("DeleteMarker", response.delete_marker());
    output.insert_opt("VersionId", response.version_id());
    output
}

pub(crate) fn delete_objects(response: &DeleteObjectsOutput) -> ApiOutput {
    let deleted: Vec<Value> = response
        .deleted()
        .iter()
        .map(|d| {
            let mut item = ApiOutput::new();
            item.insert_opt("Key", d.key());
            item.insert_opt("VersionId", d.version_id());
            item.insert_opt("DeleteMarker", d.delete_marker());
            to_map(&item)
        })
        .collect();

    let errors: Vec<Value> = response
        .errors()
        .iter()
        .map(|e| {
            let mut item = ApiOutput::new();
            item.insert_opt("Key", e.key());
            item.insert_opt("VersionId", e.version_id());
            item.insert_opt("Code", e.code());
            item.insert_opt("Message", e.message());
            to_map(&item)
        })
        .collect();

    if !errors.is_empty() {
        tracing::warn!(count = errors.len(), "Failed to delete some objects");
    }

    ApiOutput::new()
        .with("Deleted", deleted)
        .with("Errors", errors)
}

/// Metadata fields of a GetObject response; the body is read separately
pub(crate) fn get_object(response: &GetObjectOutput) -> ApiOutput {
    let mut output = ApiOutput::new();
    output.insert_opt("ContentLength", response.content_length());
    output.insert_opt("ContentType", response.content_type());
    output.insert_opt("ETag", response.e_tag());
    output.insert_opt("LastModified", response.last_modified().and_then(timestamp));
    output.insert_opt("VersionId", response.version_id());
    output.insert_opt("CacheControl", response.cache_control());
    output.insert_opt("ContentEncoding", response.content_encoding());
    output.insert_opt("StorageClass", response.storage_class().map(|s| s.as_str()));
    output.insert_opt("Metadata", response.metadata().map(metadata));
    output
}

pub(crate) fn head_object(response: &HeadObjectOutput) -> ApiOutput {
    let mut output = ApiOutput::new();
    output.insert_opt("ContentLength", response.content_length());
    output.insert_opt("ContentType", response.content_type());
    output.insert_opt("ETag", response.e_tag());
    output.insert_opt("LastModified", response.last_modified().and_then(timestamp));
    output.insert_opt("VersionId", response.version_id());
    output.insert_opt("CacheControl", response.cache_control());
    output.insert_opt("ContentEncoding", response.content_encoding());
    output.insert_opt("StorageClass", response.storage_class().map(|s| s.as_str()));
    output.insert_opt("Metadata", response.metadata().map(metadata));
    output
}

pub(crate) fn put_object(response: &PutObjectOutput) -> ApiOutput {
    let mut output = ApiOutput::new();
    output.insert_opt("ETag", response.e_tag());
    output.insert_opt("VersionId", response.version_id());
    output
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<String> {
    jiff::Timestamp::from_second(dt.secs())
        .ok()
        .map(|t| t.to_string())
}

fn metadata(map: &HashMap<String, String>) -> Value {
    Value::map(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn to_map(output: &ApiOutput) -> Value {
    Value::map(output.iter().map(|(k, v)| (k, v.clone())))
}
