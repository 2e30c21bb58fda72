use super::ledger::{quote_ident, Ledger};
use crate::errors::LedgerError;

/// Original suite name → sanitized table name.
pub const ALIAS_TABLE: &str = "suite_name_aliases";

pub fn alias_table_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (og_name TEXT NOT NULL, modified_name TEXT NOT NULL, PRIMARY KEY (og_name))",
        quote_ident(ALIAS_TABLE)
    )
}

pub fn case_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT,
  classname TEXT,
  duration BLOB,
  status BLOB,
  message TEXT,
  error BLOB,
  properties BLOB,
  systemout TEXT,
  systemerr TEXT
)",
        quote_ident(table)
    )
}

pub fn summary_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT,
  package BLOB,
  properties BLOB,
  tests BLOB,
  suites BLOB,
  systemout TEXT,
  systemerr TEXT,
  totals BLOB
)",
        quote_ident(table)
    )
}

/// Creates missing tables; existing tables are left untouched.
pub struct SchemaEnsurer<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> SchemaEnsurer<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    pub fn ensure_alias_table(&self) -> Result<(), LedgerError> {
        self.create(ALIAS_TABLE, &alias_table_ddl())
    }

    /// Per-suite case table plus the shared summary table.
    pub fn ensure_suite_tables(&self, case_table: &str, summary_table: &str) -> Result<(), LedgerError> {
        self.create(case_table, &case_table_ddl(case_table))?;
        self.create(summary_table, &summary_table_ddl(summary_table))
    }

    pub fn ensure_all(&self, case_table: &str, summary_table: &str) -> Result<(), LedgerError> {
        self.ensure_alias_table()?;
        self.ensure_suite_tables(case_table, summary_table)
    }

    fn create(&self, table: &str, ddl: &str) -> Result<(), LedgerError> {
        tracing::debug!(event = "ensure_table", table = %table);
        self.ledger
            .execute(ddl, &[])
            .map(|_| ())
            .map_err(|e| LedgerError::schema(table, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::SqliteLedger;

    fn schema_snapshot(ledger: &SqliteLedger) -> Vec<String> {
        let mut tables = ledger.list_tables().unwrap();
        tables.sort();
        tables
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let ledger = SqliteLedger::in_memory("u", "p").unwrap();
        let ensurer = SchemaEnsurer::new(&ledger);

        ensurer.ensure_all("LoginTests", "junit_suite_summary").unwrap();
        let first = schema_snapshot(&ledger);
        let ddl_before = ledger
            .query("SELECT name, sql FROM sqlite_master ORDER BY name", &[])
            .unwrap();

        ensurer.ensure_all("LoginTests", "junit_suite_summary").unwrap();
        let ddl_after = ledger
            .query("SELECT name, sql FROM sqlite_master ORDER BY name", &[])
            .unwrap();

        assert_eq!(first, vec!["LoginTests", "junit_suite_summary", ALIAS_TABLE]);
        assert_eq!(first, schema_snapshot(&ledger));
        assert_eq!(ddl_before, ddl_after);
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let ledger = SqliteLedger::in_memory("u", "p").unwrap();
        SchemaEnsurer::new(&ledger)
            .ensure_suite_tables("123abc", "summary table")
            .unwrap();
        let tables = schema_snapshot(&ledger);
        assert!(tables.contains(&"123abc".to_string()));
        assert!(tables.contains(&"summary table".to_string()));
    }

    #[test]
    fn test_failure_names_the_table() {
        let ledger = SqliteLedger::in_memory("u", "p").unwrap();
        // An index already owns the name, which IF NOT EXISTS does not cover.
        ledger.execute("CREATE TABLE other (x TEXT)", &[]).unwrap();
        ledger.execute("CREATE INDEX clash ON other(x)", &[]).unwrap();
        let err = SchemaEnsurer::new(&ledger)
            .ensure_suite_tables("clash", "junit_suite_summary")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Schema { ref table, .. } if table == "clash"));
    }
}
