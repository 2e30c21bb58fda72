use super::exit_codes;
use anyhow::Result;
use junit_ledger_core::config::LedgerConfig;
use junit_ledger_core::engine::runner::run_read;
use junit_ledger_core::report::console::print_results;
use junit_ledger_core::storage::SqliteLedger;

pub fn cmd_read(cfg: &LedgerConfig) -> Result<i32> {
    let ledger = SqliteLedger::connect(&cfg.session)?;
    tracing::debug!(event = "limit_not_applied", limit = cfg.limit);

    let (table, rows) = run_read(&ledger, &cfg.read_options())?;
    tracing::info!(event = "read_complete", table = %table, rows = rows.len());

    print_results(&rows);
    Ok(exit_codes::OK)
}
