use super::ledger::{Ledger, Row, SqlValue};
use crate::errors::LedgerError;
use rusqlite::types::{ToSql, Value};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Internal table holding registered principals. Never listed.
const PRINCIPALS_TABLE: &str = "ledger_principals";

/// Address, credentials and namespace for one session.
#[derive(Clone)]
pub struct SessionOptions {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Root under which ledger instances keep their files.
    pub data_dir: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3322,
            username: "immudb".to_string(),
            password: "immudb".to_string(),
            database: "defaultdb".to_string(),
            data_dir: PathBuf::from(".junit-ledger"),
        }
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl SessionOptions {
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// `<data_dir>/<hostname>-<port>/<database>.db`
    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}-{}", self.hostname, self.port))
            .join(format!("{}.db", self.database))
    }
}

/// SQLite-backed ledger. One connection per session, used from one thread.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens the namespace named by `opts` and logs in.
    pub fn connect(opts: &SessionOptions) -> Result<Self, LedgerError> {
        let connect_err = |message: String| LedgerError::Connect {
            address: opts.address(),
            message,
        };

        if opts.hostname.trim().is_empty() {
            return Err(connect_err("hostname is empty".into()));
        }
        if opts.port == 0 {
            return Err(connect_err("port must be non-zero".into()));
        }
        if opts.database.is_empty()
            || !opts
                .database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(connect_err(format!(
                "invalid database name {:?}",
                opts.database
            )));
        }

        let path = opts.database_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| connect_err(format!("{}: {}", dir.display(), e)))?;
        }
        let conn = Connection::open(&path)
            .map_err(|e| connect_err(format!("{}: {}", path.display(), e)))?;

        let ledger = Self { conn };
        ledger.login(&opts.username, &opts.password)?;
        tracing::info!(
            event = "session_opened",
            address = %opts.address(),
            database = %opts.database,
            username = %opts.username,
            path = %path.display()
        );
        Ok(ledger)
    }

    pub fn in_memory(username: &str, password: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|e| LedgerError::Connect {
            address: ":memory:".into(),
            message: e.to_string(),
        })?;
        let ledger = Self { conn };
        ledger.login(username, password)?;
        Ok(ledger)
    }

    /// The first principal to log into a namespace registers it; later
    /// sessions must match a registered principal.
    fn login(&self, username: &str, password: &str) -> Result<(), LedgerError> {
        let auth_err = |message: String| LedgerError::Auth {
            username: username.to_string(),
            message,
        };

        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {PRINCIPALS_TABLE} (
                        username TEXT PRIMARY KEY,
                        password_sha256 TEXT NOT NULL,
                        created_at TEXT NOT NULL
                    )"
                ),
                [],
            )
            .map_err(|e| auth_err(e.to_string()))?;

        let digest = password_digest(password);
        let stored: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT password_sha256 FROM {PRINCIPALS_TABLE} WHERE username = ?1"),
                params![username],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| auth_err(e.to_string()))?;

        match stored {
            Some(expected) if expected == digest => Ok(()),
            Some(_) => Err(auth_err("invalid credentials".into())),
            None => {
                let registered: i64 = self
                    .conn
                    .query_row(&format!("SELECT COUNT(*) FROM {PRINCIPALS_TABLE}"), [], |r| {
                        r.get(0)
                    })
                    .map_err(|e| auth_err(e.to_string()))?;
                if registered > 0 {
                    return Err(auth_err("unknown user".into()));
                }
                self.conn
                    .execute(
                        &format!(
                            "INSERT INTO {PRINCIPALS_TABLE} (username, password_sha256, created_at) VALUES (?1, ?2, ?3)"
                        ),
                        params![username, digest, chrono::Utc::now().to_rfc3339()],
                    )
                    .map_err(|e| auth_err(e.to_string()))?;
                tracing::info!(event = "principal_registered", username = %username);
                Ok(())
            }
        }
    }
}

fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// `@name` keys kept alive alongside the borrowed values.
fn bind_names(params: &[(&str, SqlValue)]) -> Vec<String> {
    params.iter().map(|(k, _)| format!("@{}", k)).collect()
}

impl Ledger for SqliteLedger {
    fn execute(&self, sql: &str, params: &[(&str, SqlValue)]) -> Result<usize, LedgerError> {
        let names = bind_names(params);
        let bound: Vec<(&str, &dyn ToSql)> = names
            .iter()
            .zip(params)
            .map(|(k, (_, v))| (k.as_str(), v as &dyn ToSql))
            .collect();

        tracing::trace!(event = "sql_exec", sql = %sql);
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.execute(bound.as_slice())?)
    }

    fn query(&self, sql: &str, params: &[(&str, SqlValue)]) -> Result<Vec<Row>, LedgerError> {
        let names = bind_names(params);
        let bound: Vec<(&str, &dyn ToSql)> = names
            .iter()
            .zip(params)
            .map(|(k, (_, v))| (k.as_str(), v as &dyn ToSql))
            .collect();

        tracing::trace!(event = "sql_query", sql = %sql);
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(bound.as_slice())?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let mut row = Row::default();
            for (i, name) in columns.iter().enumerate() {
                let v: Value = r.get(i)?;
                row.columns.push((name.clone(), v.into()));
            }
            out.push(row);
        }
        Ok(out)
    }

    fn list_tables(&self) -> Result<Vec<String>, LedgerError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND substr(name, 1, 7) != 'sqlite_' AND name != ?1",
        )?;
        let names = stmt
            .query_map(params![PRINCIPALS_TABLE], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
