// rdsadmin/src/testing.rs
//! In-memory stand-ins for the secret store, object storage and SQL Server.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{ServerConfig, ServerEndpoint};
use crate::db::statements::Statement;
use crate::db::{ADMIN_DATABASE, AdminSession, Connector};
use crate::errors::{AppError, Result};
use crate::restore::ArchiveStore;
use crate::secrets::{Credential, SecretStore};

pub fn server_config() -> ServerConfig {
    ServerConfig {
        endpoint: ServerEndpoint {
            host: "db.test".to_string(),
            port: 1433,
        },
        admin_secret_name: "rds/admin".to_string(),
        trust_server_cert: true,
    }
}

#[derive(Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Option<String>>,
}

impl StaticSecretStore {
    pub fn with_json(mut self, name: &str, value: serde_json::Value) -> Self {
        self.secrets.insert(name.to_string(), Some(value.to_string()));
        self
    }

    pub fn with_binary_only(mut self, name: &str) -> Self {
        self.secrets.insert(name.to_string(), None);
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret_value(&self, secret_name: &str) -> Result<Option<String>> {
        self.secrets
            .get(secret_name)
            .cloned()
            .ok_or_else(|| AppError::SecretRetrievalFailure {
                name: secret_name.to_string(),
                message: "ResourceNotFoundException".to_string(),
            })
    }
}

#[derive(Default)]
pub struct StaticArchiveStore {
    objects: HashSet<(String, String)>,
    pub probes: Mutex<usize>,
}

impl StaticArchiveStore {
    pub fn with_object(mut self, bucket: &str, key: &str) -> Self {
        self.objects.insert((bucket.to_string(), key.to_string()));
        self
    }
}

#[async_trait]
impl ArchiveStore for StaticArchiveStore {
    async fn archive_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        *self.probes.lock().unwrap() += 1;
        Ok(self.objects.contains(&(bucket.to_string(), key.to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub database: String,
    pub sql: String,
    pub params: Vec<String>,
}

pub type ServerObjects = (
    BTreeSet<String>,
    BTreeMap<String, String>,
    BTreeSet<(String, String)>,
    BTreeSet<(String, String)>,
    BTreeSet<(String, String, String)>,
);

/// Objects a SQL Server would hold, plus a journal of every statement run.
#[derive(Debug, Default)]
pub struct ServerState {
    pub databases: BTreeSet<String>,
    pub logins: BTreeMap<String, String>,
    // (database, name)
    pub users: BTreeSet<(String, String)>,
    pub schemas: BTreeSet<(String, String)>,
    // (database, schema, user)
    pub grants: BTreeSet<(String, String, String)>,
    pub restores: Vec<(String, String)>,
    pub sizes: Vec<(String, Decimal)>,
    pub journal: Vec<JournalEntry>,
    pub commits: usize,
    pub unreachable: bool,
    pub reject_containing: Option<String>,
    pub sessions_opened: usize,
    pub sessions_released: usize,
}

impl ServerState {
    /// Objects only, so two states can be compared after repeated runs.
    pub fn objects(&self) -> ServerObjects {
        (
            self.databases.clone(),
            self.logins.clone(),
            self.users.clone(),
            self.schemas.clone(),
            self.grants.clone(),
        )
    }

    pub fn statements_matching(&self, prefix: &str) -> Vec<&JournalEntry> {
        self.journal
            .iter()
            .filter(|entry| entry.sql.trim_start().starts_with(prefix))
            .collect()
    }

    fn apply(&mut self, database: &str, statement: &Statement) -> Result<()> {
        let sql = statement.sql.trim();
        if let Some(rest) = sql.strip_prefix("CREATE DATABASE ") {
            let name = first_token(rest);
            if !self.databases.insert(name.clone()) {
                return Err(AppError::ServerRejected(format!(
                    "Database '{}' already exists. Choose a different database name.",
                    name
                )));
            }
        } else if let Some(rest) = sql.strip_prefix("CREATE LOGIN ") {
            let name = first_token(rest);
            let password = between(sql, "PASSWORD = N'", "', CHECK_POLICY")
                .unwrap_or_default()
                .replace("''", "'");
            if self.logins.insert(name.clone(), password).is_some() {
                return Err(AppError::ServerRejected(format!(
                    "The server principal '{}' already exists.",
                    name
                )));
            }
        } else if sql.starts_with("CREATE USER [") {
            let name = between(sql, "CREATE USER [", "]").unwrap_or_default();
            if !self.users.insert((database.to_string(), name.clone())) {
                return Err(AppError::ServerRejected(format!(
                    "User, group, or role '{}' already exists in the current database.",
                    name
                )));
            }
        } else if sql.starts_with("CREATE SCHEMA [") {
            let name = between(sql, "CREATE SCHEMA [", "]").unwrap_or_default();
            if !self.schemas.insert((database.to_string(), name.clone())) {
                return Err(AppError::ServerRejected(format!(
                    "There is already an object named '{}' in the database.",
                    name
                )));
            }
        } else if sql.starts_with("GRANT ") {
            let schema = between(sql, "SCHEMA::", " TO").unwrap_or_default();
            let user = between(sql, "TO [", "]").unwrap_or_default();
            self.grants.insert((
                database.to_string(),
                schema.trim_matches(['[', ']']).to_string(),
                user,
            ));
        } else if sql.starts_with("exec msdb.dbo.rds_restore_database") {
            let name = statement.params.first().cloned().unwrap_or_default();
            let arn = statement.params.get(1).cloned().unwrap_or_default();
            self.restores.push((name, arn));
        } else if sql.contains("COMMIT") {
            self.commits += 1;
        }
        Ok(())
    }

    fn exists(&self, database: &str, statement: &Statement) -> bool {
        let name = statement.params.first().map(String::as_str).unwrap_or_default();
        if statement.sql.contains("sys.databases") {
            self.databases.contains(name)
        } else if statement.sql.contains("sys.server_principals") {
            self.logins.contains_key(name)
        } else if statement.sql.contains("sys.database_principals") {
            self.users.contains(&(database.to_string(), name.to_string()))
        } else {
            false
        }
    }
}

fn first_token(rest: &str) -> String {
    rest.split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(';')
        .to_string()
}

fn between(haystack: &str, start: &str, end: &str) -> Option<String> {
    let from = haystack.find(start)? + start.len();
    let to = haystack[from..].find(end)? + from;
    Some(haystack[from..to].to_string())
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<ServerState>>,
}

impl FakeConnector {
    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }
}

pub struct FakeSession {
    state: Arc<Mutex<ServerState>>,
    database: String,
}

impl FakeSession {
    fn run(&mut self, statement: &Statement) -> Result<MutexGuard<'_, ServerState>> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(JournalEntry {
            database: self.database.clone(),
            sql: statement.sql.clone(),
            params: statement.params.clone(),
        });
        if let Some(needle) = &state.reject_containing {
            if statement.sql.contains(needle.as_str()) {
                return Err(AppError::ServerRejected(format!(
                    "Permission denied executing '{}'",
                    needle
                )));
            }
        }
        Ok(state)
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.sessions_released += 1;
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _login: &Credential, database: Option<&str>) -> Result<FakeSession> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(AppError::ConnectionFailure(
                "Failed to reach db.test:1433: Connection refused (os error 111)".to_string(),
            ));
        }
        let database = database.unwrap_or(ADMIN_DATABASE).to_string();
        if database != ADMIN_DATABASE && !state.databases.contains(&database) {
            return Err(AppError::ConnectionFailure(format!(
                "Cannot open database \"{}\" requested by the login.",
                database
            )));
        }
        state.sessions_opened += 1;
        Ok(FakeSession {
            state: self.state.clone(),
            database,
        })
    }
}

#[async_trait]
impl AdminSession for FakeSession {
    async fn query_exists(&mut self, statement: &Statement) -> Result<bool> {
        let database = self.database.clone();
        let state = self.run(statement)?;
        Ok(state.exists(&database, statement))
    }

    async fn query_name_sizes(&mut self, statement: &Statement) -> Result<Vec<(String, Decimal)>> {
        let state = self.run(statement)?;
        Ok(state.sizes.clone())
    }

    async fn execute(&mut self, statement: &Statement) -> Result<()> {
        let database = self.database.clone();
        let mut state = self.run(statement)?;
        state.apply(&database, statement)
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute(&crate::db::statements::commit_open_transaction()).await
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
