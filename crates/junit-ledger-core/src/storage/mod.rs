pub mod ledger;
pub mod schema;
pub mod sqlite;

pub use ledger::{quote_ident, Ledger, Row, SqlValue};
pub use schema::{SchemaEnsurer, ALIAS_TABLE};
pub use sqlite::{SessionOptions, SqliteLedger};
