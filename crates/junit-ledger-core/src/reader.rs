use crate::errors::LedgerError;
use crate::storage::{quote_ident, Ledger, Row, SqlValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Columns holding JSON blobs.
pub const ENCODED_COLUMNS: &[&str] = &[
    "properties",
    "package",
    "tests",
    "suites",
    "totals",
    "status",
    "duration",
    "error",
];

/// Columns stored as plain text.
pub const TEXT_COLUMNS: &[&str] = &["name", "systemout", "systemerr", "classname", "message"];

/// A decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Text(String),
    Json(serde_json::Value),
    /// Column without a known decoding, passed through as stored.
    Raw(SqlValue),
}

impl Cell {
    /// Deserializes a JSON cell into its model type. `None` for non-JSON cells.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        match self {
            Cell::Json(v) => Some(serde_json::from_value(v.clone())),
            _ => None,
        }
    }
}

pub type DecodedRow = BTreeMap<String, Cell>;

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub summary_table: String,
    pub prefix: String,
    /// Select the summary table by exact name instead of by prefix.
    pub summary: bool,
}

/// Picks the first listed table matching the selection mode, falling back to
/// the prefix itself as a literal table name.
pub fn select_table(tables: &[String], opts: &ReadOptions) -> String {
    for listed in tables {
        let name = listed.replace('"', "");
        tracing::debug!(event = "table_found", table = %name);
        let hit = if opts.summary {
            name == opts.summary_table
        } else {
            name.contains(&opts.prefix)
        };
        if hit {
            tracing::info!(event = "table_selected", table = %name, summary = opts.summary);
            return name;
        }
    }
    tracing::warn!(
        event = "table_not_found",
        prefix = %opts.prefix,
        summary = opts.summary,
        "no table matched, using prefix as table name"
    );
    opts.prefix.clone()
}

pub struct ResultReader<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
}

impl<'a, L: Ledger + ?Sized> ResultReader<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Lists tables, selects one and scans it. Returns the table name used.
    pub fn read(&self, opts: &ReadOptions) -> Result<(String, Vec<DecodedRow>), LedgerError> {
        let tables = self
            .ledger
            .list_tables()
            .map_err(|e| LedgerError::read("system tables", e))?;
        let table = select_table(&tables, opts);
        let rows = self.scan(&table)?;
        Ok((table, rows))
    }

    /// Full, unfiltered scan of `table`, every row decoded.
    pub fn scan(&self, table: &str) -> Result<Vec<DecodedRow>, LedgerError> {
        let rows = self
            .ledger
            .query(&format!("SELECT * FROM {}", quote_ident(table)), &[])
            .map_err(|e| LedgerError::read(table, e))?;
        tracing::debug!(event = "table_scanned", table = %table, rows = rows.len());

        rows.iter()
            .enumerate()
            .map(|(i, row)| decode_row(table, i, row))
            .collect()
    }
}

pub fn decode_row(table: &str, index: usize, row: &Row) -> Result<DecodedRow, LedgerError> {
    let mut out = DecodedRow::new();
    for (column, value) in &row.columns {
        let cell = decode_cell(column, value).map_err(|source| LedgerError::Decode {
            table: table.to_string(),
            column: column.clone(),
            row: index,
            source,
        })?;
        out.insert(column.clone(), cell);
    }
    Ok(out)
}

/// Name-based dispatch: JSON columns are parsed, text columns read as text,
/// `id` as an integer, anything else passed through.
pub fn decode_cell(column: &str, value: &SqlValue) -> Result<Cell, serde_json::Error> {
    if value.is_null() {
        return Ok(Cell::Null);
    }
    if ENCODED_COLUMNS.contains(&column) {
        return match value.as_bytes() {
            Some(bytes) => serde_json::from_slice(bytes).map(Cell::Json),
            None => Ok(Cell::Raw(value.clone())),
        };
    }
    if TEXT_COLUMNS.contains(&column) {
        return Ok(match value {
            SqlValue::Text(s) => Cell::Text(s.clone()),
            SqlValue::Blob(b) => Cell::Text(String::from_utf8_lossy(b).into_owned()),
            other => Cell::Raw(other.clone()),
        });
    }
    if column == "id" {
        if let Some(id) = value.as_integer() {
            return Ok(Cell::Integer(id));
        }
    }
    Ok(Cell::Raw(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(summary: bool) -> ReadOptions {
        ReadOptions {
            summary_table: "junit_suite_summary".into(),
            prefix: "junit_".into(),
            summary,
        }
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_summary_by_exact_name() {
        let tables = names(&["junit_other", "\"junit_suite_summary\"", "LoginTests"]);
        assert_eq!(select_table(&tables, &opts(true)), "junit_suite_summary");
    }

    #[test]
    fn test_select_by_prefix_takes_first_listed() {
        let tables = names(&["LoginTests", "my_junit_cases", "junit_suite_summary"]);
        assert_eq!(select_table(&tables, &opts(false)), "my_junit_cases");
    }

    #[test]
    fn test_select_falls_back_to_prefix_literal() {
        let tables = names(&["LoginTests"]);
        assert_eq!(select_table(&tables, &opts(true)), "junit_");
        assert_eq!(select_table(&[], &opts(false)), "junit_");
    }

    #[test]
    fn test_decode_dispatch() {
        assert_eq!(
            decode_cell("status", &SqlValue::Blob(b"\"failed\"".to_vec())).unwrap(),
            Cell::Json(json!("failed"))
        );
        assert_eq!(
            decode_cell("properties", &SqlValue::Blob(br#"{"k":"v"}"#.to_vec())).unwrap(),
            Cell::Json(json!({"k": "v"}))
        );
        assert_eq!(
            decode_cell("name", &SqlValue::Text("n".into())).unwrap(),
            Cell::Text("n".into())
        );
        assert_eq!(decode_cell("id", &SqlValue::Integer(7)).unwrap(), Cell::Integer(7));
        assert_eq!(decode_cell("error", &SqlValue::Null).unwrap(), Cell::Null);
        assert_eq!(
            decode_cell("extra", &SqlValue::Real(1.5)).unwrap(),
            Cell::Raw(SqlValue::Real(1.5))
        );
    }

    #[test]
    fn test_decode_failure_is_error() {
        assert!(decode_cell("totals", &SqlValue::Blob(b"{not json".to_vec())).is_err());

        let row = Row {
            columns: vec![("totals".into(), SqlValue::Blob(b"{".to_vec()))],
        };
        let err = decode_row("junit_suite_summary", 3, &row).unwrap_err();
        assert!(matches!(err, LedgerError::Decode { row: 3, ref column, .. } if column == "totals"));
    }
}
