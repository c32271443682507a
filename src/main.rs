//! RDS SQL Server administration tool
//!
//! Restores databases from S3 backups, reports database sizes and provisions
//! databases with a dedicated login. Each run performs one operation and
//! prints its status object as JSON on stdout.

// rdsadmin/src/main.rs
mod config;
mod db;
mod errors;
mod inspect;
mod provision;
mod response;
mod restore;
mod secrets;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::Parser;
use config::{Cli, InspectConfig, Operation, ProvisionConfig, RestoreConfig};
use db::MssqlConnector;
use response::InvocationResult;
use restore::S3ArchiveStore;
use secrets::AwsSecretStore;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries the
/// invocation result only.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Exit codes: 0 for a 200 result, 1 for a 500 result, 2 when the invocation
/// aborted before producing a result.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let outcome = run_app(cli).await;
    if let Err(e) = &outcome {
        eprintln!("❌ Error: {:?}", e);
    }
    ExitCode::from(exit_status(&outcome))
}

fn exit_status(outcome: &Result<InvocationResult>) -> u8 {
    match outcome {
        Ok(result) if result.is_success() => 0,
        Ok(_) => 1,
        Err(_) => 2,
    }
}

async fn run_app(cli: Cli) -> Result<InvocationResult> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let secrets = AwsSecretStore::new(&sdk_config);

    let result = match cli.operation {
        Operation::Restore(args) => {
            let restore_config = RestoreConfig::from_args(args)
                .context("Failed to load restore configuration")?;
            let connector = MssqlConnector::new(&restore_config.server);
            let archives = S3ArchiveStore::new(&sdk_config);
            restore::run_restore_flow(&restore_config, &secrets, &connector, &archives)
                .await
                .context("Restore operation aborted")?
        }
        Operation::Inspect(args) => {
            let inspect_config = InspectConfig::from_args(args)
                .context("Failed to load inspect configuration")?;
            let connector = MssqlConnector::new(&inspect_config.server);
            inspect::run_inspect_flow(&inspect_config, &secrets, &connector)
                .await
                .context("Inspect operation aborted")?
        }
        Operation::Provision(args) => {
            let provision_config = ProvisionConfig::from_args(args)
                .context("Failed to load provision configuration")?;
            let connector = MssqlConnector::new(&provision_config.server);
            provision::run_provision_flow(&provision_config, &secrets, &connector)
                .await
                .context("Provision operation aborted")?
        }
    };

    let json = serde_json::to_string(&result).context("Failed to serialize invocation result")?;
    println!("{}", json);
    Ok(result)
}
