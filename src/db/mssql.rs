// rdsadmin/src/db/mssql.rs
use async_trait::async_trait;
use rust_decimal::Decimal;
use tiberius::{AuthMethod, Client, Config, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

use super::statements::{self, Statement};
use super::{ADMIN_DATABASE, AdminSession, Connector};
use crate::config::{ServerConfig, ServerEndpoint};
use crate::errors::{AppError, Result};
use crate::secrets::Credential;

const APPLICATION_NAME: &str = "rdsadmin";

/// Connects to SQL Server over TDS.
pub struct MssqlConnector {
    endpoint: ServerEndpoint,
    trust_server_cert: bool,
}

impl MssqlConnector {
    pub fn new(server: &ServerConfig) -> Self {
        MssqlConnector {
            endpoint: server.endpoint.clone(),
            trust_server_cert: server.trust_server_cert,
        }
    }

    fn client_config(&self, login: &Credential, database: Option<&str>) -> Config {
        let mut config = Config::new();
        config.host(&self.endpoint.host);
        config.port(self.endpoint.port);
        config.authentication(AuthMethod::sql_server(&login.username, &login.password));
        config.application_name(APPLICATION_NAME);
        if let Some(database) = database {
            config.database(database);
        }
        if self.trust_server_cert {
            config.trust_cert();
        }
        config
    }
}

pub struct MssqlSession {
    client: Client<Compat<TcpStream>>,
    database: String,
}

#[async_trait]
impl Connector for MssqlConnector {
    type Session = MssqlSession;

    async fn connect(&self, login: &Credential, database: Option<&str>) -> Result<MssqlSession> {
        let config = self.client_config(login, database);
        let catalog = database.unwrap_or(ADMIN_DATABASE).to_string();

        let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
            AppError::ConnectionFailure(format!("Failed to reach {}: {}", self.endpoint, e))
        })?;
        tcp.set_nodelay(true).map_err(|e| {
            AppError::ConnectionFailure(format!("Failed to configure socket to {}: {}", self.endpoint, e))
        })?;

        // Login failures arrive as server errors but still mean the connection failed.
        let client = Client::connect(config, tcp.compat_write()).await.map_err(|e| {
            AppError::ConnectionFailure(format!(
                "Failed to log in to {} as '{}': {}",
                self.endpoint, login.username, e
            ))
        })?;

        info!(endpoint = %self.endpoint, database = %catalog, "✅ Connected to SQL Server");
        Ok(MssqlSession {
            client,
            database: catalog,
        })
    }
}

impl MssqlSession {
    fn log_statement(&self, statement: &Statement) {
        debug!(database = %self.database, sql = %statement.log_text(), "Executing statement");
    }
}

fn bound_params(statement: &Statement) -> Vec<&dyn ToSql> {
    statement.params.iter().map(|p| p as &dyn ToSql).collect()
}

fn size_row(name: Option<&str>, size_mb: Option<Decimal>) -> (String, Decimal) {
    if name.is_none() || size_mb.is_none() {
        warn!(
            name = ?name,
            size_mb = ?size_mb,
            "Size row has NULL columns, reporting placeholders"
        );
    }
    (
        name.unwrap_or("<unknown>").to_string(),
        size_mb.unwrap_or_default(),
    )
}

fn statement_error(err: tiberius::error::Error) -> AppError {
    use tiberius::error::Error;
    match err {
        Error::Io { .. } | Error::Tls(_) | Error::Routing { .. } => {
            AppError::ConnectionFailure(err.to_string())
        }
        other => AppError::ServerRejected(other.to_string()),
    }
}

#[async_trait]
impl AdminSession for MssqlSession {
    async fn query_exists(&mut self, statement: &Statement) -> Result<bool> {
        self.log_statement(statement);
        let params = bound_params(statement);
        let row = self
            .client
            .query(statement.sql.as_str(), &params)
            .await
            .map_err(statement_error)?
            .into_row()
            .await
            .map_err(statement_error)?;
        Ok(row.is_some())
    }

    async fn query_name_sizes(&mut self, statement: &Statement) -> Result<Vec<(String, Decimal)>> {
        self.log_statement(statement);
        let params = bound_params(statement);
        let rows = self
            .client
            .query(statement.sql.as_str(), &params)
            .await
            .map_err(statement_error)?
            .into_first_result()
            .await
            .map_err(statement_error)?;

        rows.into_iter()
            .map(|row| -> Result<(String, Decimal)> {
                let name: Option<&str> = row.try_get(0).map_err(statement_error)?;
                let size_mb: Option<Decimal> = row.try_get(1).map_err(statement_error)?;
                Ok(size_row(name, size_mb))
            })
            .collect()
    }

    async fn execute(&mut self, statement: &Statement) -> Result<()> {
        self.log_statement(statement);
        if statement.params.is_empty() {
            // DDL such as CREATE DATABASE / CREATE SCHEMA must be its own batch.
            self.client
                .simple_query(statement.sql.as_str())
                .await
                .map_err(statement_error)?
                .into_results()
                .await
                .map_err(statement_error)?;
        } else {
            let params = bound_params(statement);
            self.client
                .execute(statement.sql.as_str(), &params)
                .await
                .map_err(statement_error)?;
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute(&statements::commit_open_transaction()).await
    }

    async fn close(self) -> Result<()> {
        debug!(database = %self.database, "Closing connection");
        self.client
            .close()
            .await
            .map_err(|e| AppError::ConnectionFailure(e.to_string()))
    }
}
