use super::exit_codes;
use anyhow::Result;
use junit_ledger_core::config::LedgerConfig;
use junit_ledger_core::engine::runner::run_ingest;
use junit_ledger_core::junit::parse_files;
use junit_ledger_core::storage::SqliteLedger;

pub fn cmd_write(cfg: &LedgerConfig) -> Result<i32> {
    // Input problems abort before the ledger is touched.
    let suites = parse_files(&cfg.files)?;
    tracing::info!(event = "files_parsed", files = cfg.files.len(), suites = suites.len());

    let ledger = SqliteLedger::connect(&cfg.session)?;
    let report = run_ingest(&ledger, &cfg.summary_table, &suites)?;

    for conflict in &report.conflicts {
        tracing::warn!(
            event = "table_shared",
            table = %conflict.table,
            suite = %conflict.original,
            existing = %conflict.existing
        );
    }
    tracing::info!(
        event = "ingest_complete",
        suites = report.suites,
        cases = report.cases,
        conflicts = report.conflicts.len()
    );
    Ok(exit_codes::OK)
}
