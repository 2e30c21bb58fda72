//! Error types for ingestion and read-back.

/// Failures of a single ingest or read run. Every variant is fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Input file missing, unreadable or not JUnit XML.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// Ledger address or namespace could not be opened.
    #[error("failed to connect to {address}: {message}")]
    Connect { address: String, message: String },

    /// Credentials rejected by the ledger.
    #[error("failed to login as {username}: {message}")]
    Auth { username: String, message: String },

    /// Raw statement failure reported by the ledger collaborator.
    #[error("statement failed: {message}")]
    Statement { message: String },

    #[error("failed to create table {table}")]
    Schema {
        table: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("failed to resolve table name for suite {suite:?}")]
    Resolve {
        suite: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("failed to encode {field} for {owner}")]
    Encode {
        field: &'static str,
        owner: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to insert into {table}")]
    Write {
        table: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("failed to read table {table}")]
    Read {
        table: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("failed to decode column {column} of row {row} in {table}")]
    Decode {
        table: String,
        column: String,
        row: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl LedgerError {
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    pub fn schema(table: impl Into<String>, source: LedgerError) -> Self {
        Self::Schema {
            table: table.into(),
            source: Box::new(source),
        }
    }

    pub fn resolve(suite: impl Into<String>, source: LedgerError) -> Self {
        Self::Resolve {
            suite: suite.into(),
            source: Box::new(source),
        }
    }

    pub fn write(table: impl Into<String>, source: LedgerError) -> Self {
        Self::Write {
            table: table.into(),
            source: Box::new(source),
        }
    }

    pub fn read(table: impl Into<String>, source: LedgerError) -> Self {
        Self::Read {
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse { .. } => 3,
            _ => 4,
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::statement(e.to_string())
    }
}

/// Invalid configuration file or flag combination.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
