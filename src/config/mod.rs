// rdsadmin/src/config/mod.rs
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fmt;
use url::Url;

use crate::errors::{AppError, Result};

pub const DEFAULT_SQLSERVER_PORT: u16 = 1433;

// Command line / environment surface. Every field is optional here so that a
// missing variable surfaces as a typed configuration error instead of a usage
// message.
#[derive(Debug, Parser)]
#[command(
    name = "rdsadmin",
    version,
    about = "Administrative operations for an RDS SQL Server instance"
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value_t = false, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub operation: Operation,
}

#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Submit a native restore of a database from an S3 backup archive
    Restore(RestoreArgs),
    /// Report the data file size of every database on the server
    Inspect(InspectArgs),
    /// Ensure a database, login, user and schema grants exist
    Provision(ProvisionArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Server endpoint as host, host:port or host,port
    #[arg(long = "db-endpoint", env = "DB_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Secrets Manager name of the admin credential
    #[arg(long = "rds-secrets", env = "RDS_SECRETS")]
    pub rds_secrets: Option<String>,

    /// Accept the server certificate without validating its chain
    #[arg(
        long,
        env = "DB_TRUST_SERVER_CERT",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub trust_server_cert: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Name of the database to restore into
    #[arg(long = "db-name", env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Bucket holding the backup archive
    #[arg(long = "s3-bucket", env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Object key of the backup archive
    #[arg(long = "s3-keys", env = "S3_KEYS")]
    pub s3_keys: Option<String>,

    /// Check that the archive exists before submitting the restore
    #[arg(long, env = "VERIFY_ARCHIVE", default_value_t = false, action = ArgAction::Set)]
    pub verify_archive: bool,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Secrets Manager name describing the database, login and password to create
    #[arg(long = "db-secrets", env = "DB_SECRETS")]
    pub db_secrets: Option<String>,
}

// Application's internal configuration structs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    /// Parses `host`, `host:port` or `host,port` (the SQL Server client convention).
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::ConfigurationMissing(
                "DB_ENDPOINT must not be empty".to_string(),
            ));
        }

        let normalized = trimmed.replacen(',', ":", 1);
        let parsed = Url::parse(&format!("mssql://{}", normalized)).map_err(|e| {
            AppError::ConfigurationMissing(format!(
                "DB_ENDPOINT '{}' is not a valid host[:port]: {}",
                trimmed, e
            ))
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                AppError::ConfigurationMissing(format!("DB_ENDPOINT '{}' has no host", trimmed))
            })?;

        Ok(ServerEndpoint {
            host: host.to_string(),
            port: parsed.port().unwrap_or(DEFAULT_SQLSERVER_PORT),
        })
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub endpoint: ServerEndpoint,
    pub admin_secret_name: String,
    pub trust_server_cert: bool,
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub server: ServerConfig,
    pub db_name: String,
    pub s3_bucket: String,
    pub s3_key: String,
    pub verify_archive: bool,
}

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub server: ServerConfig,
    pub target_secret_name: String,
}

impl ServerConfig {
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        let endpoint = required(args.endpoint, "DB_ENDPOINT")?;
        Ok(ServerConfig {
            endpoint: ServerEndpoint::parse(&endpoint)?,
            admin_secret_name: required(args.rds_secrets, "RDS_SECRETS")?,
            trust_server_cert: args.trust_server_cert,
        })
    }
}

impl RestoreConfig {
    pub fn from_args(args: RestoreArgs) -> Result<Self> {
        Ok(RestoreConfig {
            server: ServerConfig::from_args(args.server)?,
            db_name: required(args.db_name, "DB_NAME")?,
            s3_bucket: required(args.s3_bucket, "S3_BUCKET")?,
            s3_key: required(args.s3_keys, "S3_KEYS")?,
            verify_archive: args.verify_archive,
        })
    }
}

impl InspectConfig {
    pub fn from_args(args: InspectArgs) -> Result<Self> {
        Ok(InspectConfig {
            server: ServerConfig::from_args(args.server)?,
        })
    }
}

impl ProvisionConfig {
    pub fn from_args(args: ProvisionArgs) -> Result<Self> {
        Ok(ProvisionConfig {
            server: ServerConfig::from_args(args.server)?,
            target_secret_name: required(args.db_secrets, "DB_SECRETS")?,
        })
    }
}

fn required(value: Option<String>, variable: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ConfigurationMissing(format!("{} must be set", variable)))
}
