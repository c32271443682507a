// rdsadmin/src/db/mod.rs
pub(crate) mod identifiers;
pub(crate) mod mssql;
pub(crate) mod statements;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::secrets::Credential;
use statements::Statement;

pub use identifiers::Identifier;
pub use mssql::MssqlConnector;

/// The server's administrative database.
pub const ADMIN_DATABASE: &str = "master";

/// Opens sessions against one database server.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: AdminSession;

    /// Logs in with `login`. `database` selects the initial catalog; `None`
    /// keeps the login's default database.
    async fn connect(&self, login: &Credential, database: Option<&str>) -> Result<Self::Session>;
}

/// A single auto-committing connection.
///
/// Dropping a session releases the underlying connection, so an early return
/// with `?` never leaks it. [`AdminSession::close`] is the orderly shutdown.
#[async_trait]
pub trait AdminSession: Send {
    /// Runs a query and reports whether it produced at least one row.
    async fn query_exists(&mut self, statement: &Statement) -> Result<bool>;

    /// Runs a query whose rows are `(name, size in megabytes)`.
    async fn query_name_sizes(&mut self, statement: &Statement) -> Result<Vec<(String, Decimal)>>;

    async fn execute(&mut self, statement: &Statement) -> Result<()>;

    /// Commits any transaction the session left open.
    async fn commit(&mut self) -> Result<()>;

    async fn close(self) -> Result<()>;
}
