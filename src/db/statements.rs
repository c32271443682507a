// rdsadmin/src/db/statements.rs
//! T-SQL issued by the operations.
//!
//! The statement text is the contract with the server. Names that end up as
//! identifiers are [`Identifier`]s; values go in as bound `@P` parameters
//! wherever the statement kind allows it.

use std::borrow::Cow;
use std::fmt;

use super::identifiers::{Identifier, quote_nliteral};

pub const CREATE_DATABASE_COLLATION: &str = "SQL_Latin1_General_CP1_CS_AS";
pub const DEFAULT_SCHEMA: &str = "dbo";

pub const DATABASE_SIZES_SQL: &str = r#"
            SELECT
                DB_NAME(database_id) AS DatabaseName,
                SUM(size * 8.0 / 1024) AS SizeMB
            FROM
                sys.master_files
            WHERE
                type = 0  -- 0 = Rows Data File, 1 = Log File
            GROUP BY
                database_id
        "#;

#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
    // Log form of statements that carry a secret literal.
    redacted: Option<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
            redacted: None,
        }
    }

    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    fn redacted_as(mut self, log_text: String) -> Self {
        self.redacted = Some(log_text);
        self
    }

    /// Text that is safe to write to the logs.
    pub fn log_text(&self) -> Cow<'_, str> {
        match &self.redacted {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Borrowed(self.sql.trim()),
        }
    }
}

// Secret literals stay out of debug output too.
impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.log_text())
            .field("params", &self.params)
            .finish()
    }
}

pub fn s3_arn(bucket: &str, key: &str) -> String {
    format!("arn:aws:s3:::{}/{}", bucket, key)
}

pub fn restore_database(db_name: &Identifier, s3_arn: &str) -> Statement {
    Statement::new(
        r#"
        exec msdb.dbo.rds_restore_database
            @restore_db_name=@P1,
            @s3_arn_to_restore_from=@P2;
        "#,
    )
    .bind(db_name.as_str())
    .bind(s3_arn)
}

pub fn database_sizes() -> Statement {
    Statement::new(DATABASE_SIZES_SQL)
}

pub fn database_exists(name: &Identifier) -> Statement {
    Statement::new("SELECT name FROM sys.databases WHERE name = @P1").bind(name.as_str())
}

pub fn create_database(name: &Identifier) -> Statement {
    Statement::new(format!(
        "CREATE DATABASE {} COLLATE {};",
        name, CREATE_DATABASE_COLLATION
    ))
}

pub fn login_exists(login: &Identifier) -> Statement {
    Statement::new("SELECT name FROM sys.server_principals WHERE name = @P1").bind(login.as_str())
}

pub fn create_login(login: &Identifier, password: &str) -> Statement {
    let template = |password: &str| {
        format!(
            "CREATE LOGIN {} WITH PASSWORD = {}, CHECK_POLICY = OFF;",
            login, password
        )
    };
    Statement::new(template(&quote_nliteral(password))).redacted_as(template("N'***'"))
}

pub fn user_exists(user: &Identifier) -> Statement {
    Statement::new("SELECT name FROM sys.database_principals WHERE name = @P1").bind(user.as_str())
}

pub fn create_user_for_login(user: &Identifier) -> Statement {
    Statement::new(format!(
        "CREATE USER {} FOR LOGIN {};",
        user.bracketed(),
        user.bracketed()
    ))
}

pub fn grant_crud_on_default_schema(user: &Identifier) -> Statement {
    Statement::new(format!(
        "GRANT SELECT, INSERT, UPDATE, DELETE ON SCHEMA::{} TO {};",
        DEFAULT_SCHEMA,
        user.bracketed()
    ))
}

pub fn create_schema(schema: &Identifier) -> Statement {
    Statement::new(format!("CREATE SCHEMA {};", schema.bracketed()))
}

pub fn grant_crud_on_schema(schema: &Identifier, user: &Identifier) -> Statement {
    Statement::new(format!(
        "GRANT SELECT, INSERT, UPDATE, DELETE ON SCHEMA::{} TO {};",
        schema.bracketed(),
        user.bracketed()
    ))
}

pub fn commit_open_transaction() -> Statement {
    Statement::new("IF @@TRANCOUNT > 0 COMMIT TRANSACTION;")
}
