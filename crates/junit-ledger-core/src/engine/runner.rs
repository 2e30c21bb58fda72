use crate::errors::LedgerError;
use crate::model::Suite;
use crate::reader::{DecodedRow, ReadOptions, ResultReader};
use crate::resolver::{NameConflict, NameResolver};
use crate::storage::{Ledger, SchemaEnsurer};
use crate::writer::RecordWriter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub suites: usize,
    pub cases: usize,
    /// Table per ingested suite, in input order.
    pub tables: Vec<String>,
    pub conflicts: Vec<NameConflict>,
}

/// Writes `suites` one at a time: resolve the table, ensure the schema, then
/// insert the summary row and the case rows. Stops at the first error,
/// including a suite whose table would be the summary or alias table.
pub fn run_ingest<L: Ledger + ?Sized>(
    ledger: &L,
    summary_table: &str,
    suites: &[Suite],
) -> Result<IngestReport, LedgerError> {
    let schema = SchemaEnsurer::new(ledger);
    let resolver = NameResolver::new(ledger).reserve(summary_table);
    let writer = RecordWriter::new(ledger, summary_table);

    schema.ensure_alias_table()?;

    let mut report = IngestReport::default();
    for suite in suites {
        tracing::info!(event = "suite_processing", suite = %suite.name, cases = suite.tests.len());

        let resolution = resolver.resolve(&suite.name)?;
        if let Some(c) = resolution.conflict.as_ref().filter(|c| c.reserved) {
            return Err(LedgerError::resolve(
                &c.original,
                LedgerError::statement(format!(
                    "table {} is reserved for {}",
                    c.table, c.existing
                )),
            ));
        }
        schema.ensure_suite_tables(&resolution.table, summary_table)?;
        let stats = writer.write_suite(&resolution.table, suite)?;

        tracing::info!(
            event = "suite_written",
            suite = %resolution.original,
            table = %resolution.table,
            cases = stats.case_rows
        );

        report.suites += stats.summary_rows;
        report.cases += stats.case_rows;
        report.tables.push(resolution.table);
        if let Some(conflict) = resolution.conflict {
            report.conflicts.push(conflict);
        }
    }
    Ok(report)
}

/// Selects a table per `opts` and returns its decoded rows.
pub fn run_read<L: Ledger + ?Sized>(
    ledger: &L,
    opts: &ReadOptions,
) -> Result<(String, Vec<DecodedRow>), LedgerError> {
    tracing::info!(
        event = "read_start",
        summary = opts.summary,
        summary_table = %opts.summary_table,
        prefix = %opts.prefix
    );
    ResultReader::new(ledger).read(opts)
}
