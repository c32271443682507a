// rdsadmin/src/restore/s3_check.rs
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3 as s3;
use s3::error::DisplayErrorContext;
use tracing::debug;

use crate::errors::{AppError, Result};

/// Existence checks for backup archives in object storage.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn archive_exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

pub struct S3ArchiveStore {
    client: s3::Client,
}

impl S3ArchiveStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        S3ArchiveStore {
            client: s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ArchiveStore for S3ArchiveStore {
    /// Issues a HEAD request on the object. A 404 is `Ok(false)`; anything
    /// else that fails (permissions, unknown bucket) is an error.
    async fn archive_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        debug!("Checking s3://{}/{}", bucket, key);
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AppError::ObjectStorage(format!(
                "Failed to check s3://{}/{}: {}",
                bucket,
                key,
                DisplayErrorContext(&e)
            ))),
        }
    }
}
