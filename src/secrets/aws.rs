// rdsadmin/src/secrets/aws.rs
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager as secretsmanager;
use secretsmanager::error::DisplayErrorContext;
use tracing::debug;

use super::SecretStore;
use crate::errors::{AppError, Result};

/// Secret store backed by AWS Secrets Manager.
pub struct AwsSecretStore {
    client: secretsmanager::Client,
}

impl AwsSecretStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        AwsSecretStore {
            client: secretsmanager::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret_value(&self, secret_name: &str) -> Result<Option<String>> {
        debug!(secret = secret_name, "Fetching secret from Secrets Manager");
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|e| AppError::SecretRetrievalFailure {
                name: secret_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(output.secret_string().map(str::to_string))
    }
}
