use junit_ledger_core::engine::runner::{run_ingest, run_read};
use junit_ledger_core::errors::LedgerError;
use junit_ledger_core::junit::parse_file;
use junit_ledger_core::model::{CaseError, Properties, Status};
use junit_ledger_core::reader::{Cell, ReadOptions, ResultReader};
use junit_ledger_core::report::console::render_table;
use junit_ledger_core::storage::SqliteLedger;
use std::path::Path;
use std::time::Duration;

fn ingested_ledger() -> SqliteLedger {
    let ledger = SqliteLedger::in_memory("immudb", "immudb").unwrap();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/login.xml");
    let suites = parse_file(&path).unwrap();
    run_ingest(&ledger, "junit_suite_summary", &suites).unwrap();
    ledger
}

fn opts(summary: bool, prefix: &str) -> ReadOptions {
    ReadOptions {
        summary_table: "junit_suite_summary".into(),
        prefix: prefix.into(),
        summary,
    }
}

#[test]
fn test_case_fields_round_trip_through_reader() {
    let ledger = ingested_ledger();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/login.xml");
    let original = &parse_file(&path).unwrap()[0];

    let rows = ResultReader::new(&ledger).scan("LoginTests").unwrap();
    assert_eq!(rows.len(), original.tests.len());

    for (row, case) in rows.iter().zip(&original.tests) {
        let status: Status = row["status"].to_typed().unwrap().unwrap();
        assert_eq!(status, case.status);

        let nanos: u64 = row["duration"].to_typed().unwrap().unwrap();
        assert_eq!(Duration::from_nanos(nanos), case.duration);

        let props: Properties = row["properties"].to_typed().unwrap().unwrap();
        assert_eq!(props, case.properties);

        let error: Option<CaseError> = match &row["error"] {
            Cell::Null => None,
            cell => Some(cell.to_typed().unwrap().unwrap()),
        };
        assert_eq!(error, case.error);

        assert_eq!(row["name"], Cell::Text(case.name.clone()));
        assert_eq!(row["classname"], Cell::Text(case.classname.clone()));
        assert!(matches!(row["id"], Cell::Integer(_)));
    }
}

#[test]
fn test_summary_mode_reads_summary_table() {
    let ledger = ingested_ledger();
    let (table, rows) = run_read(&ledger, &opts(true, "junit_")).unwrap();
    assert_eq!(table, "junit_suite_summary");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], Cell::Text("Login Tests!!".into()));

    let totals = match &rows[0]["totals"] {
        Cell::Json(v) => v.clone(),
        other => panic!("totals not decoded: {:?}", other),
    };
    assert_eq!(totals["tests"], 2);
    assert_eq!(totals["failed"], 1);

    let out = render_table(&rows);
    assert!(out.contains("Login Tests!!"));
}

#[test]
fn test_prefix_mode_matches_by_substring() {
    let ledger = ingested_ledger();
    let (table, rows) = run_read(&ledger, &opts(false, "Login")).unwrap();
    assert_eq!(table, "LoginTests");
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_summary_mode_without_table_fails_to_read() {
    let ledger = SqliteLedger::in_memory("immudb", "immudb").unwrap();
    let err = run_read(&ledger, &opts(true, "junit_")).unwrap_err();
    assert!(matches!(err, LedgerError::Read { ref table, .. } if table == "junit_"));
    assert!(err.to_string().contains("failed to read table junit_"));
}

#[test]
fn test_corrupt_blob_fails_whole_read() {
    let ledger = ingested_ledger();
    use junit_ledger_core::storage::Ledger;
    ledger
        .execute(
            "UPDATE \"LoginTests\" SET properties = @p WHERE id = 2",
            &[("p", b"{broken".to_vec().into())],
        )
        .unwrap();

    let err = ResultReader::new(&ledger).scan("LoginTests").unwrap_err();
    assert!(matches!(err, LedgerError::Decode { row: 1, ref column, .. } if column == "properties"));
}

#[test]
fn test_suite_named_like_sqlite_reads_by_prefix() {
    let ledger = SqliteLedger::in_memory("immudb", "immudb").unwrap();
    let suites = junit_ledger_core::junit::parse_str(
        r#"<testsuite name="SQLite Tests"><testcase name="opens"/></testsuite>"#,
        "sqlite.xml",
    )
    .unwrap();
    let report = run_ingest(&ledger, "junit_suite_summary", &suites).unwrap();
    assert_eq!(report.tables, vec!["SQLiteTests"]);

    let (table, rows) = run_read(&ledger, &opts(false, "SQLite")).unwrap();
    assert_eq!(table, "SQLiteTests");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], Cell::Text("opens".into()));
}
