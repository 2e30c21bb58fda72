use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub type Properties = BTreeMap<String, String>;

/// A named group of test case results from one test run unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub tests: Vec<Case>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<Suite>,
    #[serde(default)]
    pub system_out: String,
    #[serde(default)]
    pub system_err: String,
    #[serde(default)]
    pub totals: Totals,
}

impl Suite {
    /// Recomputes `totals` from the suite's own cases.
    pub fn aggregate(&mut self) {
        let mut totals = Totals::default();
        for t in &self.tests {
            totals.tests += 1;
            totals.duration = totals.duration.saturating_add(t.duration);
            match t.status {
                Status::Passed => totals.passed += 1,
                Status::Skipped => totals.skipped += 1,
                Status::Failed => totals.failed += 1,
                Status::Error => totals.error += 1,
            }
        }
        self.totals = totals;
    }
}

/// A single test's recorded outcome within a suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    #[serde(default)]
    pub classname: String,
    #[serde(default, with = "duration_nanos")]
    pub duration: Duration,
    pub status: Status,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CaseError>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub system_out: String,
    #[serde(default)]
    pub system_err: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Passed,
    Skipped,
    Failed,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Skipped => "skipped",
            Status::Failed => "failed",
            Status::Error => "error",
        }
    }

    /// Failed and errored cases carry error detail.
    pub fn has_error(&self) -> bool {
        matches!(self, Status::Failed | Status::Error)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail of a `<failure>` or `<error>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub tests: u32,
    pub passed: u32,
    pub skipped: u32,
    pub failed: u32,
    pub error: u32,
    #[serde(default, with = "duration_nanos")]
    pub duration: Duration,
}

/// Durations travel as integer nanoseconds.
pub mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Saturates at `u64::MAX` (about 584 years).
    pub fn to_nanos(d: Duration) -> u64 {
        u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(to_nanos(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_nanos(u64::deserialize(d)?))
    }
}
