mod logic;

use tracing::info;

use crate::config::InspectConfig;
use crate::db::Connector;
use crate::errors::Result;
use crate::response::InvocationResult;
use crate::secrets::{Credential, SecretStore, resolve_secret};

pub use logic::DatabaseSize;

pub const INSPECT_SUCCESS_BODY: &str = "Successfully retrieved database sizes";

/// Public entry point for the database size report.
///
/// Sizes are written to the log only. The response body is the same fixed
/// message however many databases were found.
pub async fn run_inspect_flow<S, C>(
    config: &InspectConfig,
    secrets: &S,
    connector: &C,
) -> Result<InvocationResult>
where
    S: SecretStore + ?Sized,
    C: Connector,
{
    let admin_secret = resolve_secret(secrets, &config.server.admin_secret_name).await?;
    let credential = Credential::from_bundle(&admin_secret)?;

    match logic::collect_database_sizes(&credential, connector).await {
        Ok(sizes) => {
            log_sizes(&sizes);
            Ok(InvocationResult::ok(INSPECT_SUCCESS_BODY))
        }
        Err(e) => e.into_invocation_result_with(|e| format!("Error retrieving database sizes: {}", e)),
    }
}

fn log_sizes(sizes: &[DatabaseSize]) {
    info!(count = sizes.len(), "📊 Retrieved database sizes");
    for size in sizes {
        info!(
            database = %size.name,
            size_mb = %size.size_mb,
            "Database: {}, Size: {:.2} GB",
            size.name,
            size.size_gb()
        );
    }
}
