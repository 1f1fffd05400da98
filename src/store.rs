use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::report::ValidationResultRow;

pub const LEDGER_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: String,
    pub mode: String,
    pub dataset_path: String,
    pub results_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOverview {
    pub run_id: String,
    pub started_at: String,
    pub mode: String,
    pub row_count: i64,
    pub error_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCounts {
    pub runs: i64,
    pub results: i64,
    pub errors: i64,
}

pub fn open_ledger(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        crate::util::ensure_directory(parent)?;
    }
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open run ledger: {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn open_ledger_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open run ledger read-only: {}", db_path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS validation_runs (
          run_id TEXT PRIMARY KEY,
          started_at TEXT NOT NULL,
          mode TEXT NOT NULL,
          dataset_path TEXT NOT NULL,
          results_path TEXT
        );

        CREATE TABLE IF NOT EXISTS validation_results (
          run_id TEXT NOT NULL,
          row_index INTEGER NOT NULL,
          gold_standard TEXT NOT NULL,
          generated TEXT NOT NULL,
          avg_cosine REAL,
          max_cosine REAL,
          avg_jaccard REAL,
          cosine_heatmap TEXT,
          jaccard_heatmap TEXT,
          llm_analysis TEXT,
          error TEXT,
          PRIMARY KEY (run_id, row_index),
          FOREIGN KEY(run_id) REFERENCES validation_runs(run_id)
        );

        CREATE INDEX IF NOT EXISTS idx_validation_results_run ON validation_results(run_id);
        ",
        )
        .context("failed to create run ledger schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LEDGER_SCHEMA_VERSION],
        )
        .context("failed to record ledger schema version")?;
    Ok(())
}

pub fn record_run(
    connection: &mut Connection,
    run: &RunRecord,
    rows: &[ValidationResultRow],
) -> Result<()> {
    let tx = connection
        .transaction()
        .context("failed to start ledger transaction")?;

    tx.execute(
        "INSERT OR REPLACE INTO validation_runs(run_id, started_at, mode, dataset_path, results_path)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            run.run_id,
            run.started_at,
            run.mode,
            run.dataset_path,
            run.results_path
        ],
    )
    .with_context(|| format!("failed to insert run {}", run.run_id))?;

    {
        let mut statement = tx.prepare(
            "INSERT OR REPLACE INTO validation_results(
               run_id, row_index, gold_standard, generated, avg_cosine, max_cosine, avg_jaccard,
               cosine_heatmap, jaccard_heatmap, llm_analysis, error
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for (index, row) in rows.iter().enumerate() {
            statement
                .execute(params![
                    run.run_id,
                    index as i64,
                    row.gold_standard,
                    row.generated,
                    row.average_cosine_similarity,
                    row.max_cosine_similarity,
                    row.average_jaccard_similarity,
                    row.cosine_heatmap,
                    row.jaccard_heatmap,
                    row.llm_analysis,
                    row.error
                ])
                .with_context(|| format!("failed to insert result row {index} of {}", run.run_id))?;
        }
    }

    tx.commit().context("failed to commit ledger transaction")?;
    Ok(())
}

pub fn ledger_counts(connection: &Connection) -> Result<LedgerCounts> {
    Ok(LedgerCounts {
        runs: query_count(connection, "SELECT COUNT(*) FROM validation_runs")?,
        results: query_count(connection, "SELECT COUNT(*) FROM validation_results")?,
        errors: query_count(
            connection,
            "SELECT COUNT(*) FROM validation_results WHERE error IS NOT NULL",
        )?,
    })
}

pub fn recent_runs(connection: &Connection, limit: usize) -> Result<Vec<RunOverview>> {
    let mut statement = connection.prepare(
        "
        SELECT
          r.run_id,
          r.started_at,
          r.mode,
          COUNT(v.row_index),
          SUM(CASE WHEN v.error IS NOT NULL THEN 1 ELSE 0 END)
        FROM validation_runs r
        LEFT JOIN validation_results v ON v.run_id = r.run_id
        GROUP BY r.run_id, r.started_at, r.mode
        ORDER BY r.started_at DESC, r.run_id DESC
        LIMIT ?1
        ",
    )?;

    let rows = statement.query_map(params![limit as i64], |row| {
        Ok(RunOverview {
            run_id: row.get(0)?,
            started_at: row.get(1)?,
            mode: row.get(2)?,
            row_count: row.get(3)?,
            error_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("failed to read run overview row")?);
    }
    Ok(out)
}

/// Schema version recorded in the ledger file, if any.
pub fn stored_schema_version(connection: &Connection) -> Result<Option<String>> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read ledger schema version")
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{
        RunRecord, ledger_counts, open_ledger, open_ledger_read_only, recent_runs, record_run,
        stored_schema_version,
    };
    use crate::report::ValidationResultRow;

    fn run(run_id: &str, started_at: &str) -> RunRecord {
        RunRecord {
            run_id: run_id.to_string(),
            started_at: started_at.to_string(),
            mode: "all".to_string(),
            dataset_path: "benchmarkdataset.csv".to_string(),
            results_path: None,
        }
    }

    #[test]
    fn records_runs_and_reports_counts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("ledger.sqlite");
        let mut connection = open_ledger(&db_path).expect("ledger should open");

        let ok_row = ValidationResultRow {
            gold_standard: "What is X?".to_string(),
            generated: "What is X?".to_string(),
            average_cosine_similarity: Some(1.0),
            ..ValidationResultRow::default()
        };
        let failed_row = ValidationResultRow::failed("", "x?", "invalid input".to_string());

        record_run(
            &mut connection,
            &run("run-20260101T000000Z", "2026-01-01T00:00:00Z"),
            &[ok_row.clone(), failed_row],
        )
        .expect("first run recorded");
        record_run(
            &mut connection,
            &run("run-20260102T000000Z", "2026-01-02T00:00:00Z"),
            &[ok_row],
        )
        .expect("second run recorded");
        drop(connection);

        let reader = open_ledger_read_only(&db_path).expect("read-only open");
        let counts = ledger_counts(&reader).expect("counts");
        assert_eq!((counts.runs, counts.results, counts.errors), (2, 3, 1));

        let recent = recent_runs(&reader, 5).expect("recent runs");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].run_id, "run-20260102T000000Z");
        assert_eq!(recent[1].row_count, 2);
        assert_eq!(recent[1].error_count, 1);
    }

    #[test]
    fn reopening_keeps_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("ledger.sqlite");
        drop(open_ledger(&db_path).expect("first open"));
        let connection = open_ledger(&db_path).expect("second open");
        let version = stored_schema_version(&connection).expect("schema version");
        assert_eq!(version.as_deref(), Some(super::LEDGER_SCHEMA_VERSION));
    }

    #[test]
    fn schema_version_reflects_the_file_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("ledger.sqlite");
        let connection = open_ledger(&db_path).expect("ledger should open");
        connection
            .execute(
                "UPDATE metadata SET value = '0.0.9' WHERE key = 'schema_version'",
                [],
            )
            .expect("downgrade version");
        drop(connection);

        let reader = open_ledger_read_only(&db_path).expect("read-only open");
        let version = stored_schema_version(&reader).expect("schema version");
        assert_eq!(version.as_deref(), Some("0.0.9"));

        let empty = rusqlite::Connection::open_in_memory().expect("in-memory db");
        empty
            .execute_batch("CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)")
            .expect("metadata table");
        assert_eq!(stored_schema_version(&empty).expect("no version row"), None);
    }
}
