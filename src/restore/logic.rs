// rdsadmin/src/restore/logic.rs
use tracing::info;

use super::s3_check::ArchiveStore;
use crate::config::RestoreConfig;
use crate::db::statements;
use crate::db::{ADMIN_DATABASE, AdminSession, Connector, Identifier};
use crate::errors::{AppError, Result};
use crate::secrets::Credential;

/// Submits a native restore of `config.db_name` from the configured S3 archive.
///
/// Returns once the server has accepted the restore task. The restore itself
/// runs asynchronously on the server and is not awaited here.
pub(super) async fn submit_restore<C, A>(
    config: &RestoreConfig,
    credential: &Credential,
    connector: &C,
    archives: &A,
) -> Result<()>
where
    C: Connector,
    A: ArchiveStore + ?Sized,
{
    let db_name = Identifier::parse("database", &config.db_name)?;
    let arn = statements::s3_arn(&config.s3_bucket, &config.s3_key);

    if config.verify_archive {
        if !archives
            .archive_exists(&config.s3_bucket, &config.s3_key)
            .await?
        {
            return Err(AppError::ObjectStorage(format!(
                "Backup archive s3://{}/{} does not exist",
                config.s3_bucket, config.s3_key
            )));
        }
        info!("✓ Backup archive s3://{}/{} found", config.s3_bucket, config.s3_key);
    }

    let mut session = connector.connect(credential, Some(ADMIN_DATABASE)).await?;
    session
        .execute(&statements::restore_database(&db_name, &arn))
        .await?;
    session.commit().await?;
    session.close().await?;

    info!("✓ Restore of database '{}' submitted from {}", db_name, arn);
    Ok(())
}
