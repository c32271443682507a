mod logic;
pub(crate) mod s3_check;

use tracing::info;

use crate::config::RestoreConfig;
use crate::db::Connector;
use crate::errors::Result;
use crate::response::InvocationResult;
use crate::secrets::{Credential, SecretStore, resolve_secret};

pub use s3_check::{ArchiveStore, S3ArchiveStore};

pub const RESTORE_SUCCESS_BODY: &str = "Database restore initiated successfully";

/// Public entry point for the restore operation.
///
/// Secret errors abort the invocation; database failures come back as a 500.
pub async fn run_restore_flow<S, C, A>(
    config: &RestoreConfig,
    secrets: &S,
    connector: &C,
    archives: &A,
) -> Result<InvocationResult>
where
    S: SecretStore + ?Sized,
    C: Connector,
    A: ArchiveStore + ?Sized,
{
    let admin_secret = resolve_secret(secrets, &config.server.admin_secret_name).await?;
    let credential = Credential::from_bundle(&admin_secret)?;

    info!(
        database = %config.db_name,
        bucket = %config.s3_bucket,
        key = %config.s3_key,
        "🔄 Starting restore"
    );
    match logic::submit_restore(config, &credential, connector, archives).await {
        Ok(()) => Ok(InvocationResult::ok(RESTORE_SUCCESS_BODY)),
        Err(e) => e.into_invocation_result(),
    }
}
