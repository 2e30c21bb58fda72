use crate::errors::LedgerError;
use crate::model::{duration_nanos, Case, Suite};
use crate::storage::{quote_ident, Ledger, SqlValue};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub summary_rows: usize,
    pub case_rows: usize,
}

/// Inserts suite summary rows and per-case rows. Nested fields are stored
/// as JSON blobs; text fields as-is.
pub struct RecordWriter<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    summary_table: &'a str,
}

impl<'a, L: Ledger + ?Sized> RecordWriter<'a, L> {
    pub fn new(ledger: &'a L, summary_table: &'a str) -> Self {
        Self {
            ledger,
            summary_table,
        }
    }

    /// One summary row, then one row per case in input order. Rows written
    /// before a failure stay written.
    pub fn write_suite(&self, case_table: &str, suite: &Suite) -> Result<WriteStats, LedgerError> {
        self.write_summary(suite)?;
        for case in &suite.tests {
            self.write_case(case_table, case)?;
        }
        Ok(WriteStats {
            summary_rows: 1,
            case_rows: suite.tests.len(),
        })
    }

    pub fn write_summary(&self, suite: &Suite) -> Result<(), LedgerError> {
        let owner = format!("suite {:?}", suite.name);
        let params = [
            ("name", SqlValue::from(suite.name.as_str())),
            ("package", encode("package", &owner, &suite.package)?),
            ("properties", encode("properties", &owner, &suite.properties)?),
            ("tests", encode("tests", &owner, &suite.tests)?),
            ("suites", encode("suites", &owner, &suite.suites)?),
            ("systemout", suite.system_out.as_str().into()),
            ("systemerr", suite.system_err.as_str().into()),
            ("totals", encode("totals", &owner, &suite.totals)?),
        ];
        let sql = format!(
            "INSERT INTO {} (name, package, properties, tests, suites, systemout, systemerr, totals)
             VALUES (@name, @package, @properties, @tests, @suites, @systemout, @systemerr, @totals)",
            quote_ident(self.summary_table)
        );
        self.ledger
            .execute(&sql, &params)
            .map_err(|e| LedgerError::write(self.summary_table, e))?;
        Ok(())
    }

    pub fn write_case(&self, case_table: &str, case: &Case) -> Result<(), LedgerError> {
        let owner = format!("test case {:?}", case.name);
        let error = match &case.error {
            Some(err) => encode("error", &owner, err)?,
            None => SqlValue::Null,
        };
        let params = [
            ("name", SqlValue::from(case.name.as_str())),
            ("classname", case.classname.as_str().into()),
            (
                "duration",
                encode("duration", &owner, &duration_nanos::to_nanos(case.duration))?,
            ),
            ("status", encode("status", &owner, &case.status)?),
            ("message", case.message.as_str().into()),
            ("error", error),
            ("properties", encode("properties", &owner, &case.properties)?),
            ("systemout", case.system_out.as_str().into()),
            ("systemerr", case.system_err.as_str().into()),
        ];
        let sql = format!(
            "INSERT INTO {} (name, classname, duration, status, message, error, properties, systemout, systemerr)
             VALUES (@name, @classname, @duration, @status, @message, @error, @properties, @systemout, @systemerr)",
            quote_ident(case_table)
        );
        self.ledger
            .execute(&sql, &params)
            .map_err(|e| LedgerError::write(case_table, e))?;
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(
    field: &'static str,
    owner: &str,
    value: &T,
) -> Result<SqlValue, LedgerError> {
    serde_json::to_vec(value)
        .map(SqlValue::Blob)
        .map_err(|source| LedgerError::Encode {
            field,
            owner: owner.to_string(),
            source,
        })
}
