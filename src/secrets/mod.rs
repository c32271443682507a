// rdsadmin/src/secrets/mod.rs
pub(crate) mod aws;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{AppError, Result};

pub use aws::AwsSecretStore;

/// Read access to a store of named, string-encoded secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the secret's string payload, or `None` when the secret exists
    /// but carries no string payload (binary secrets).
    async fn get_secret_value(&self, secret_name: &str) -> Result<Option<String>>;
}

/// A secret decoded as a JSON object of field name to value.
#[derive(Clone)]
pub struct SecretBundle {
    name: String,
    fields: Map<String, Value>,
}

impl SecretBundle {
    pub fn parse(name: &str, payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload).map_err(|e| {
            AppError::SecretFormat(format!("secret '{}' is not valid JSON: {}", name, e))
        })?;
        match value {
            Value::Object(fields) => Ok(SecretBundle {
                name: name.to_string(),
                fields,
            }),
            _ => Err(AppError::SecretFormat(format!(
                "secret '{}' is not a JSON object",
                name
            ))),
        }
    }

    pub fn field(&self, key: &str) -> Result<&str> {
        match self.fields.get(key) {
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(AppError::SecretFormat(format!(
                "field '{}' of secret '{}' is not a string",
                key, self.name
            ))),
            None => Err(AppError::SecretFormat(format!(
                "secret '{}' has no '{}' field",
                self.name, key
            ))),
        }
    }
}

// Values never reach the logs, only the field names.
impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBundle")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Fetches a secret and decodes it as a JSON object.
///
/// A response without a string payload is a [`AppError::SecretFormat`].
pub async fn resolve_secret<S>(store: &S, secret_name: &str) -> Result<SecretBundle>
where
    S: SecretStore + ?Sized,
{
    let payload = store.get_secret_value(secret_name).await?.ok_or_else(|| {
        AppError::SecretFormat(format!(
            "Secrets Manager response for '{}' did not contain SecretString",
            secret_name
        ))
    })?;
    SecretBundle::parse(secret_name, &payload)
}

/// SQL login credential taken from the `username` and `password` fields of a secret.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn from_bundle(bundle: &SecretBundle) -> Result<Self> {
        Ok(Credential {
            username: bundle.field("username")?.to_string(),
            password: bundle.field("password")?.to_string(),
        })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
