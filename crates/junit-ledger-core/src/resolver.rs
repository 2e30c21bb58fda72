//! Suite name → table name resolution.
//!
//! A suite's table name is derived once, on the first ingestion of its
//! original name, and recorded in the alias table. Later ingestions of the
//! same original name reuse the recorded table name verbatim.

use crate::errors::LedgerError;
use crate::storage::{quote_ident, Ledger, SqlValue, ALIAS_TABLE};

/// Stands in for an empty suite name.
pub const FALLBACK_SUITE_NAME: &str = "generic_testsuite";

/// Keeps ASCII letters and digits only. Many-to-one.
pub fn sanitize(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Read back from the alias table.
    Alias,
    /// Derived and registered during this call.
    Derived,
}

/// The table name is already taken, either by another original name or by
/// one of the ledger's own tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict {
    pub table: String,
    pub original: String,
    /// The other suite name, or the reserved table's name.
    pub existing: String,
    /// `table` is the alias or summary table; suite rows cannot go there.
    pub reserved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Lookup key; the fallback literal when the suite name was empty.
    pub original: String,
    pub table: String,
    pub origin: Origin,
    pub conflict: Option<NameConflict>,
}

pub struct NameResolver<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    reserved: Vec<String>,
}

impl<'a, L: Ledger + ?Sized> NameResolver<'a, L> {
    /// The alias table must already exist.
    pub fn new(ledger: &'a L) -> Self {
        Self {
            ledger,
            reserved: vec![ALIAS_TABLE.to_string()],
        }
    }

    /// Marks `table` as unusable for suite rows.
    pub fn reserve(mut self, table: &str) -> Self {
        self.reserved.push(table.to_string());
        self
    }

    pub fn resolve(&self, suite_name: &str) -> Result<Resolution, LedgerError> {
        let original = if suite_name.is_empty() {
            FALLBACK_SUITE_NAME
        } else {
            suite_name
        };
        self.resolve_original(original)
            .map_err(|e| LedgerError::resolve(original, e))
    }

    fn resolve_original(&self, original: &str) -> Result<Resolution, LedgerError> {
        if let Some(table) = self.lookup(original)? {
            tracing::debug!(event = "alias_hit", suite = %original, table = %table);
            let conflict = self.reserved_conflict(original, &table);
            return Ok(Resolution {
                original: original.to_string(),
                table,
                origin: Origin::Alias,
                conflict,
            });
        }

        let mut table = sanitize(original);
        if table.is_empty() {
            table = sanitize(FALLBACK_SUITE_NAME);
        }

        // Reserved names are never registered as aliases.
        if let Some(conflict) = self.reserved_conflict(original, &table) {
            return Ok(Resolution {
                original: original.to_string(),
                table,
                origin: Origin::Derived,
                conflict: Some(conflict),
            });
        }

        let conflict = self.owner_of(&table)?.map(|existing| NameConflict {
            table: table.clone(),
            original: original.to_string(),
            existing,
            reserved: false,
        });
        if let Some(c) = &conflict {
            tracing::warn!(
                event = "table_name_conflict",
                suite = %c.original,
                existing_suite = %c.existing,
                table = %c.table,
                "suites sanitize to the same table name and will share it"
            );
        }

        self.ledger.execute(
            &format!(
                "INSERT INTO {} (og_name, modified_name) VALUES (@og_name, @modified_name)",
                quote_ident(ALIAS_TABLE)
            ),
            &[
                ("og_name", original.into()),
                ("modified_name", table.as_str().into()),
            ],
        )?;
        tracing::info!(event = "alias_registered", suite = %original, table = %table);

        Ok(Resolution {
            original: original.to_string(),
            table,
            origin: Origin::Derived,
            conflict,
        })
    }

    /// Table names compare case-insensitively, as SQL identifiers do.
    fn reserved_conflict(&self, original: &str, table: &str) -> Option<NameConflict> {
        let existing = self
            .reserved
            .iter()
            .find(|r| r.eq_ignore_ascii_case(table))?;
        tracing::warn!(
            event = "table_name_reserved",
            suite = %original,
            table = %table,
            reserved = %existing
        );
        Some(NameConflict {
            table: table.to_string(),
            original: original.to_string(),
            existing: existing.clone(),
            reserved: true,
        })
    }

    fn lookup(&self, original: &str) -> Result<Option<String>, LedgerError> {
        let rows = self.ledger.query(
            &format!(
                "SELECT modified_name FROM {} WHERE og_name = @og_name",
                quote_ident(ALIAS_TABLE)
            ),
            &[("og_name", original.into())],
        )?;
        Ok(first_text(&rows, "modified_name"))
    }

    fn owner_of(&self, table: &str) -> Result<Option<String>, LedgerError> {
        let rows = self.ledger.query(
            &format!(
                "SELECT og_name FROM {} WHERE modified_name = @modified_name COLLATE NOCASE LIMIT 1",
                quote_ident(ALIAS_TABLE)
            ),
            &[("modified_name", SqlValue::from(table))],
        )?;
        Ok(first_text(&rows, "og_name"))
    }
}

fn first_text(rows: &[crate::storage::Row], column: &str) -> Option<String> {
    rows.first()
        .and_then(|r| r.get(column))
        .and_then(SqlValue::as_text)
        .map(str::to_string)
}
