use super::args::Cli;
use anyhow::Context;
use junit_ledger_core::config::{load_config, ConfigLayer, LedgerConfig, Mode};
use junit_ledger_core::errors::{ConfigError, LedgerError};

pub mod read;
pub mod write;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
    pub const INPUT_ERROR: i32 = 3;
    pub const LEDGER_ERROR: i32 = 4;
}

/// Builds the run configuration, starts logging and runs the selected mode.
pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let (file_layer, ignored_keys) = match &cli.config {
        Some(path) => {
            let loaded = load_config(path)?;
            (loaded.layer, loaded.ignored_keys)
        }
        None => (ConfigLayer::default(), Vec::new()),
    };

    let cfg = LedgerConfig::from_layer(cli.layer().over(file_layer), cli.mode())
        .context("invalid configuration")?;

    crate::init_logging(&cfg.log_level, cli.log_format);
    for key in &ignored_keys {
        tracing::warn!(event = "config_key_ignored", key = %key);
    }
    tracing::info!(
        event = "run_start",
        mode = ?cfg.mode,
        session = ?cfg.session,
        summary_table = %cfg.summary_table
    );

    match cfg.mode {
        Mode::Write => write::cmd_write(&cfg),
        Mode::Read { .. } => read::cmd_read(&cfg),
    }
}

pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<LedgerError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.exit_code()
    } else {
        exit_codes::CONFIG_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let parse = anyhow::Error::new(LedgerError::Parse {
            path: "junit.xml".into(),
            message: "missing".into(),
        });
        assert_eq!(exit_code_for(&parse), exit_codes::INPUT_ERROR);

        let read = anyhow::Error::new(LedgerError::read("junit_", LedgerError::statement("no such table")));
        assert_eq!(exit_code_for(&read), exit_codes::LEDGER_ERROR);

        let config = anyhow::Error::new(ConfigError("bad".into())).context("invalid configuration");
        assert_eq!(exit_code_for(&config), exit_codes::CONFIG_ERROR);
    }
}
