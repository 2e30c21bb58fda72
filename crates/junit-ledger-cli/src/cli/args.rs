use clap::{Parser, ValueEnum};
use junit_ledger_core::config::{ConfigLayer, Mode};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "junit-ledger",
    version,
    about = "Store JUnit XML test reports in a ledger database and read them back"
)]
pub struct Cli {
    /// YAML config file; flags and environment override its values
    #[arg(long, env = "JUNIT_LEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hostname or IP address of the ledger [default: localhost]
    #[arg(long, env = "JUNIT_LEDGER_HOSTNAME")]
    pub hostname: Option<String>,

    /// Port number of the ledger [default: 3322]
    #[arg(long, env = "JUNIT_LEDGER_PORT")]
    pub port: Option<u16>,

    /// Username for authenticating to the ledger [default: immudb]
    #[arg(long, env = "JUNIT_LEDGER_USERNAME")]
    pub username: Option<String>,

    /// Password for authenticating to the ledger [default: immudb]
    #[arg(long, env = "JUNIT_LEDGER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Name of the database to use [default: defaultdb]
    #[arg(long, env = "JUNIT_LEDGER_DATABASE")]
    pub database: Option<String>,

    /// Directory holding ledger data files [default: .junit-ledger]
    #[arg(long, env = "JUNIT_LEDGER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JUnit XML file(s), comma separated or repeated [default: junit.xml]
    #[arg(long, value_delimiter = ',')]
    pub filename: Vec<PathBuf>,

    /// Table used for test suite summaries, created if missing [default: junit_suite_summary]
    #[arg(long = "summary_tbl_name")]
    pub summary_tbl_name: Option<String>,

    /// Read results from the ledger; write related flags are ignored
    #[arg(long = "read-results")]
    pub read_results: bool,

    /// Read only the summary table; prefix matching is skipped
    #[arg(long)]
    pub summary: bool,

    /// Table name substring selecting which results are read [default: junit_]
    #[arg(long = "suite-prefix")]
    pub suite_prefix: Option<String>,

    /// Maximum number of test executions to display (accepted, not applied) [default: 10]
    #[arg(long)]
    pub limit: Option<usize>,

    /// Log filter, e.g. info or junit_ledger_core=debug [default: info]
    #[arg(long, env = "JUNIT_LEDGER_LOG")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Values given on the command line or through the environment.
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            hostname: self.hostname.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            data_dir: self.data_dir.clone(),
            files: (!self.filename.is_empty()).then(|| self.filename.clone()),
            summary_table: self.summary_tbl_name.clone(),
            suite_prefix: self.suite_prefix.clone(),
            limit: self.limit,
            log_level: self.log_level.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.read_results {
            Mode::Read {
                summary: self.summary,
            }
        } else {
            Mode::Write
        }
    }
}
