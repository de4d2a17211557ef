//! S3 snapshot storage
//!
//! Works with AWS S3 and S3-compatible providers (custom endpoint, path-style
//! addressing). Objects use the one-zone infrequent-access storage class.

use super::ObjectStore;
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::StorageClass;
use aws_sdk_s3::Client;
use sheetkeeper_common::config::StorageConfig;
use sheetkeeper_common::{Error, Result};
use tracing::debug;

/// S3 object store for snapshots
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Region and credentials fall back to the AWS default provider chain
    /// (environment, profile, instance metadata) when not configured.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| Error::Config("storage.bucket is not set".to_string()))?;

        let shared = aws_config::load_from_env().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "sheetkeeper-config",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        debug!(bucket = %self.bucket, key = %key, "Uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .storage_class(StorageClass::OnezoneIa)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Upload of {} failed: {}", key, DisplayErrorContext(&e))))?;

        Ok(())
    }
}
