// rdsadmin/src/inspect/logic.rs
use rust_decimal::Decimal;

use crate::db::statements;
use crate::db::{AdminSession, Connector};
use crate::errors::Result;
use crate::secrets::Credential;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSize {
    pub name: String,
    pub size_mb: Decimal,
}

impl DatabaseSize {
    pub fn size_gb(&self) -> Decimal {
        self.size_mb / Decimal::from(1024)
    }
}

/// Reads the total data file size of every database on the server.
///
/// Connects with the login's default database, like any ad-hoc client would.
pub(super) async fn collect_database_sizes<C: Connector>(
    credential: &Credential,
    connector: &C,
) -> Result<Vec<DatabaseSize>> {
    let mut session = connector.connect(credential, None).await?;
    let rows = session
        .query_name_sizes(&statements::database_sizes())
        .await?;
    session.close().await?;

    Ok(rows
        .into_iter()
        .map(|(name, size_mb)| DatabaseSize { name, size_mb })
        .collect())
}
