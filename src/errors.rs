// rdsadmin/src/errors.rs
use thiserror::Error;
use tracing::error;

use crate::response::InvocationResult;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Secret retrieval failed for '{name}': {message}")]
    SecretRetrievalFailure { name: String, message: String },

    #[error("Secret format error: {0}")]
    SecretFormat(String),

    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Server rejected statement: {0}")]
    ServerRejected(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Object storage error: {0}")]
    ObjectStorage(String),
}

impl AppError {
    /// Short name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigurationMissing(_) => "configuration_missing",
            AppError::SecretRetrievalFailure { .. } => "secret_retrieval_failure",
            AppError::SecretFormat(_) => "secret_format",
            AppError::ConnectionFailure(_) => "connection_failure",
            AppError::ServerRejected(_) => "server_rejected",
            AppError::InvalidIdentifier(_) => "invalid_identifier",
            AppError::ObjectStorage(_) => "object_storage",
        }
    }

    /// Whether this error is reported to the invoker as a 500 response.
    ///
    /// Configuration and secret errors happen before an operation starts and
    /// abort the invocation instead.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            AppError::ConnectionFailure(_)
                | AppError::ServerRejected(_)
                | AppError::InvalidIdentifier(_)
                | AppError::ObjectStorage(_)
        )
    }

    /// Converts an operation failure into a 500 response, handing every
    /// other error back to the caller unchanged.
    pub fn into_invocation_result(self) -> Result<InvocationResult> {
        self.into_invocation_result_with(|e| e.to_string())
    }

    /// Like [`AppError::into_invocation_result`], with a caller-chosen body.
    pub fn into_invocation_result_with<F>(self, body: F) -> Result<InvocationResult>
    where
        F: FnOnce(&AppError) -> String,
    {
        if !self.is_invocation_failure() {
            return Err(self);
        }
        error!(kind = self.kind(), error = %self, "❌ Operation failed");
        Ok(InvocationResult::server_error(body(&self)))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
