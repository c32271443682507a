// rdsadmin/src/provision/logic.rs
use tracing::info;

use super::ProvisioningTarget;
use crate::db::statements;
use crate::db::{ADMIN_DATABASE, AdminSession, Connector, Identifier};
use crate::errors::Result;
use crate::secrets::Credential;

pub const AUXILIARY_SCHEMA: &str = "new_user_schema";

/// What a provisioning run actually created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisioningOutcome {
    pub database_created: bool,
    pub login_created: bool,
    pub user_created: bool,
}

/// Ensures the target database, server login and database user exist.
///
/// Each object is created only when its existence check finds nothing. Grants
/// and the auxiliary schema are applied only together with a newly created
/// user; an existing user is left as it is.
///
/// Steps commit independently. A failure part way through leaves the earlier
/// objects in place, and the next run skips them.
pub(super) async fn ensure_provisioned<C: Connector>(
    admin: &Credential,
    target: &ProvisioningTarget,
    connector: &C,
) -> Result<ProvisioningOutcome> {
    let database = Identifier::parse("database", &target.database)?;
    let login = Identifier::parse("login", &target.username)?;
    let schema = Identifier::parse("schema", AUXILIARY_SCHEMA)?;
    let mut outcome = ProvisioningOutcome::default();

    let mut master = connector.connect(admin, Some(ADMIN_DATABASE)).await?;
    if master
        .query_exists(&statements::database_exists(&database))
        .await?
    {
        info!("Database '{}' already exists.", database);
    } else {
        // CREATE DATABASE runs on a fresh connection, outside any transaction
        // context left by the lookup.
        master.close().await?;
        master = connector.connect(admin, Some(ADMIN_DATABASE)).await?;
        master
            .execute(&statements::create_database(&database))
            .await?;
        info!(
            "✓ Database '{}' created successfully with collation {}.",
            database,
            statements::CREATE_DATABASE_COLLATION
        );
        outcome.database_created = true;
    }
    master.close().await?;

    let mut session = connector.connect(admin, Some(database.as_str())).await?;

    if session
        .query_exists(&statements::login_exists(&login))
        .await?
    {
        info!("Login '{}' already exists.", login);
    } else {
        session
            .execute(&statements::create_login(&login, &target.password))
            .await?;
        info!("✓ Login '{}' created successfully.", login);
        outcome.login_created = true;
    }

    if session
        .query_exists(&statements::user_exists(&login))
        .await?
    {
        info!("User '{}' already exists in the database.", login);
    } else {
        session
            .execute(&statements::create_user_for_login(&login))
            .await?;
        info!("✓ User '{}' created successfully.", login);

        session
            .execute(&statements::grant_crud_on_default_schema(&login))
            .await?;
        info!(
            "✓ Permissions granted to user '{}' on schema {}.",
            login,
            statements::DEFAULT_SCHEMA
        );

        session.execute(&statements::create_schema(&schema)).await?;
        session
            .execute(&statements::grant_crud_on_schema(&schema, &login))
            .await?;
        info!(
            "✓ Schema '{}' created and permissions granted to user '{}'.",
            schema, login
        );

        session.commit().await?;
        outcome.user_created = true;
    }

    session.close().await?;
    Ok(outcome)
}
