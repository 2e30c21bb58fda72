use junit_ledger_core::engine::runner::run_ingest;
use junit_ledger_core::junit::parse_file;
use junit_ledger_core::storage::{SessionOptions, SqliteLedger};
use std::path::Path;
use tempfile::tempdir;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_ingest_login_suite_lifecycle() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let opts = SessionOptions {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    // 1. Parse before touching the ledger
    let suites = parse_file(&fixture("login.xml"))?;
    assert_eq!(suites.len(), 1);

    // 2. Open session and ingest
    let ledger = SqliteLedger::connect(&opts)?;
    let report = run_ingest(&ledger, "junit_suite_summary", &suites)?;
    assert_eq!(report.tables, vec!["LoginTests"]);
    assert_eq!(report.cases, 2);
    drop(ledger);

    // 3. Verify via raw SQL
    let conn = rusqlite::Connection::open(opts.database_path())?;

    let alias: String = conn.query_row(
        "SELECT modified_name FROM suite_name_aliases WHERE og_name = ?1",
        ["Login Tests!!"],
        |r| r.get(0),
    )?;
    assert_eq!(alias, "LoginTests");

    let summary: Vec<String> = conn
        .prepare("SELECT name FROM junit_suite_summary")?
        .query_map([], |r| r.get(0))?
        .collect::<Result<_, _>>()?;
    assert_eq!(summary, vec!["Login Tests!!".to_string()]);

    let mut stmt = conn.prepare("SELECT status, error, message FROM \"LoginTests\" ORDER BY id")?;
    let rows: Vec<(Vec<u8>, Option<Vec<u8>>, String)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].0, b"\"passed\"");
    assert!(rows[0].1.is_none());
    assert_eq!(rows[0].2, "");

    assert_eq!(rows[1].0, b"\"failed\"");
    let error: serde_json::Value = serde_json::from_slice(rows[1].1.as_deref().unwrap())?;
    assert_eq!(error["type"], "java.lang.AssertionError");
    assert_eq!(rows[1].2, "expected status 401 but was 200");

    Ok(())
}

#[test]
fn test_alias_survives_sessions() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let opts = SessionOptions {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let suites = parse_file(&fixture("login.xml"))?;

    let first = {
        let ledger = SqliteLedger::connect(&opts)?;
        run_ingest(&ledger, "junit_suite_summary", &suites)?
    };

    // Rewrite the alias as if an older naming rule had produced it.
    {
        let conn = rusqlite::Connection::open(opts.database_path())?;
        conn.execute(
            "UPDATE suite_name_aliases SET modified_name = 'legacy_login' WHERE og_name = 'Login Tests!!'",
            [],
        )?;
    }

    let second = {
        let ledger = SqliteLedger::connect(&opts)?;
        run_ingest(&ledger, "junit_suite_summary", &suites)?
    };
    assert_eq!(first.tables, vec!["LoginTests"]);
    assert_eq!(second.tables, vec!["legacy_login"]);

    let conn = rusqlite::Connection::open(opts.database_path())?;
    let summaries: i64 = conn.query_row("SELECT COUNT(*) FROM junit_suite_summary", [], |r| r.get(0))?;
    assert_eq!(summaries, 2);
    Ok(())
}

#[test]
fn test_rerun_against_existing_ledger_is_stable() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let opts = SessionOptions {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let suites = parse_file(&fixture("login.xml"))?;

    for _ in 0..2 {
        let ledger = SqliteLedger::connect(&opts)?;
        let report = run_ingest(&ledger, "junit_suite_summary", &suites)?;
        assert_eq!(report.tables, vec!["LoginTests"]);
    }

    let conn = rusqlite::Connection::open(opts.database_path())?;
    let cases: i64 = conn.query_row("SELECT COUNT(*) FROM \"LoginTests\"", [], |r| r.get(0))?;
    assert_eq!(cases, 4);
    let aliases: i64 = conn.query_row("SELECT COUNT(*) FROM suite_name_aliases", [], |r| r.get(0))?;
    assert_eq!(aliases, 1);
    Ok(())
}
