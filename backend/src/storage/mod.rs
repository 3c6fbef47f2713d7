//! Object-storage client used by the upload worker.

use crate::config::StorageConfig;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, defaults};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Region},
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

/// Binary object writes, keyed by bucket and object key.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> ServiceResult<()>;
}

/// S3-compatible storage (AWS S3 or a MinIO-style endpoint).
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                config.access_key_id.clone(),
                config.secret_access_key.clone(),
                None,
                None,
                "static",
            ));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> ServiceResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket, key, "s3 put_object failed");
                ServiceError::internal_error("object storage write failed")
            })?;
        Ok(())
    }
}
