//! S3-compatible storage client
//!
//! Thin wrapper over `aws-sdk-s3` holding the bucket handle. Retry and
//! connection pooling are the SDK runtime's concern; errors surface here
//! with the failing operation named.

use crate::config::Target;
use crate::error::{Error, Result};
use crate::progress::TransferProgress;
use crate::storage::{CompletedPart, ObjectInfo};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_smithy_types::byte_stream::Length;
use aws_sdk_s3::types::{
    AccelerateConfiguration, BucketAccelerateStatus, CompletedMultipartUpload,
    CompletedPart as AwsCompletedPart,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// S3 client plus bucket handle for one named target
#[derive(Clone)]
pub struct S3Store {
    /// SDK client
    client: Client,
    /// Bucket name
    bucket: String,
}

impl S3Store {
    /// Connect to the target's endpoint.
    ///
    /// Credentials come from the target record when present, otherwise from
    /// the SDK default chain (environment, profile, instance metadata).
    pub async fn connect(target: &Target, internal: bool) -> Result<Self> {
        let endpoint = target.endpoint_for(internal)?;
        let region = Region::new(target.region.clone().unwrap_or_else(|| "auto".to_string()));

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base)
            .endpoint_url(endpoint)
            .force_path_style(true);

        if let (Some(id), Some(secret)) = (&target.access_key_id, &target.secret_access_key) {
            builder = builder
                .credentials_provider(Credentials::new(id, secret, None, None, "bucketeer-config"));
        }

        let store = Self {
            client: Client::from_conf(builder.build()),
            bucket: target.bucket.clone(),
        };

        if target.accelerate {
            store.enable_transfer_acceleration().await?;
            tracing::info!(bucket = %target.bucket, "Transfer acceleration enabled");
        }

        Ok(store)
    }

    /// The bucket this store talks to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Enable transfer acceleration on the bucket
    pub async fn enable_transfer_acceleration(&self) -> Result<()> {
        self.client
            .put_bucket_accelerate_configuration()
            .bucket(&self.bucket)
            .accelerate_configuration(
                AccelerateConfiguration::builder()
                    .status(BucketAccelerateStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| aws_err("enabling transfer acceleration", e))?;
        Ok(())
    }

    /// Get object metadata, `None` when the key does not exist
    pub async fn head(&self, key: &str) -> Result<Option<ObjectInfo>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectInfo {
                key: key.to_string(),
                size: output.content_length().unwrap_or(0) as u64,
                etag: output.e_tag().map(|s| s.trim_matches('"').to_string()),
            })),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(Error::storage(format!(
                        "heading {}: {}",
                        key, service_err
                    )))
                }
            }
        }
    }

    /// Check if an object exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.head(key).await?.is_some())
    }

    /// List all object keys in the bucket
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let mut paginator = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let output = page.map_err(|e| aws_err("listing objects", e))?;
            for obj in output.contents() {
                if let Some(key) = obj.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }

    /// Upload a file with a single PUT request
    pub async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = AwsByteStream::from_path(path)
            .await
            .map_err(|e| Error::storage(format!("reading {}: {}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| aws_err("uploading object", e))?;

        Ok(())
    }

    /// Download an object to a file with a single GET request, streaming
    /// chunks through the progress display
    pub async fn get_to_file(
        &self,
        key: &str,
        path: &Path,
        progress: &TransferProgress,
    ) -> Result<()> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| aws_err("downloading object", e))?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| Error::io("creating destination file", e))?;

        let mut stream = ReaderStream::new(output.body.into_async_read());
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::storage(format!("reading download stream: {}", e)))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io("writing destination file", e))?;
            progress.inc(chunk.len() as u64);
        }

        file.flush()
            .await
            .map_err(|e| Error::io("flushing destination file", e))?;

        Ok(())
    }

    /// Read a byte range of an object (inclusive bounds)
    pub async fn get_range(&self, key: &str, start: u64, end: u64) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={}-{}", start, end))
            .send()
            .await
            .map_err(|e| aws_err("downloading object range", e))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| Error::storage(format!("collecting object range: {}", e)))?
            .into_bytes();

        Ok(bytes)
    }

    /// Start a multipart upload, returns the upload ID
    pub async fn create_multipart_upload(&self, key: &str) -> Result<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| aws_err("starting multipart upload", e))?;

        output
            .upload_id()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::MultipartUpload {
                message: "no upload ID returned".to_string(),
            })
    }

    /// Upload one part of an ongoing multipart upload, streaming the body
    /// from a byte range of the local file so the part is never held in
    /// memory as a whole
    pub async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        path: &Path,
        offset: u64,
        length: u64,
    ) -> Result<CompletedPart> {
        let body = AwsByteStream::read_from()
            .path(path)
            .offset(offset)
            .length(Length::Exact(length))
            .build()
            .await
            .map_err(|e| Error::storage(format!("reading {}: {}", path.display(), e)))?;

        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(body)
            .send()
            .await
            .map_err(|e| aws_err("uploading part", e))?;

        let etag = output
            .e_tag()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::MultipartUpload {
                message: format!("no ETag returned for part (upload {})", upload_id),
            })?;

        Ok(CompletedPart { part_number, etag })
    }

    /// Complete a multipart upload
    pub async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        let aws_parts: Vec<AwsCompletedPart> = parts
            .into_iter()
            .map(|p| {
                AwsCompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(p.etag)
                    .build()
            })
            .collect();

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(aws_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| aws_err("completing multipart upload", e))?;

        Ok(())
    }

    /// Abort a multipart upload
    pub async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| aws_err("aborting multipart upload", e))?;

        Ok(())
    }
}

/// Map an SDK error into a storage error with the operation named
fn aws_err(op: &str, e: impl std::fmt::Display) -> Error {
    Error::storage(format!("{}: {}", op, e))
}
