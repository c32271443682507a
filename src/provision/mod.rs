mod logic;

use std::fmt;
use tracing::info;

use crate::config::ProvisionConfig;
use crate::db::Connector;
use crate::errors::Result;
use crate::response::InvocationResult;
use crate::secrets::{Credential, SecretBundle, SecretStore, resolve_secret};

pub const PROVISION_SUCCESS_BODY: &str = "New database, user, and permissions created successfully";

/// The database, login and password described by the target secret.
#[derive(Clone)]
pub struct ProvisioningTarget {
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ProvisioningTarget {
    pub fn from_bundle(bundle: &SecretBundle) -> Result<Self> {
        Ok(ProvisioningTarget {
            database: bundle.field("database")?.to_string(),
            username: bundle.field("username")?.to_string(),
            password: bundle.field("password")?.to_string(),
        })
    }
}

impl fmt::Debug for ProvisioningTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningTarget")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public entry point for provisioning.
///
/// Both secrets are resolved before any connection is made; a problem with
/// either aborts the invocation.
pub async fn run_provision_flow<S, C>(
    config: &ProvisionConfig,
    secrets: &S,
    connector: &C,
) -> Result<InvocationResult>
where
    S: SecretStore + ?Sized,
    C: Connector,
{
    let admin_secret = resolve_secret(secrets, &config.server.admin_secret_name).await?;
    let target_secret = resolve_secret(secrets, &config.target_secret_name).await?;
    let admin = Credential::from_bundle(&admin_secret)?;
    let target = ProvisioningTarget::from_bundle(&target_secret)?;

    info!(
        database = %target.database,
        login = %target.username,
        "🚀 Starting provisioning"
    );
    match logic::ensure_provisioned(&admin, &target, connector).await {
        Ok(outcome) => {
            info!(
                database_created = outcome.database_created,
                login_created = outcome.login_created,
                user_created = outcome.user_created,
                "✅ Provisioning finished"
            );
            Ok(InvocationResult::ok(PROVISION_SUCCESS_BODY))
        }
        Err(e) => e.into_invocation_result(),
    }
}
