//! Integration tests for exporting a table against a live MySQL server.
//!
//! These tests verify end-to-end functionality including:
//! - Whole-table and paged exports producing the same file contents
//! - Base64 values decoding to the stored bytes
//! - Exporting an empty table
//!
//! To run these tests, you need a MySQL 8 server reachable at `DATABASE_URL`.
//!
//! Run with: `DATABASE_URL=mysql://root@localhost:3306 cargo test -p exporter`
//!
//! Note: every test creates its own uniquely named database and drops it at the
//! end, so they can safely run against a development server.

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use arrow::array::StringArray;
use exporter::{Database, EncodedRow, ExportConfig, export_table, verify};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::tempdir;

const TABLE: &str = "delivs_2024_10";

/// Get a database handle, skipping tests if DATABASE_URL is not set.
async fn get_test_database() -> Option<(Database, String)> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    match Database::connect(&database_url).await {
        Ok(db) => Some((db, database_url)),
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            None
        }
    }
}

fn unique_database(test_id: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    format!("exporter_it_{test_id}_{nanos}")
}

/// Creates the binary table and fills it with `rows` deterministic rows.
async fn create_test_table(
    db: &mut Database,
    database: &str,
    rows: usize,
) -> Vec<(Vec<u8>, Vec<u8>)> {
    for stmt in [
        format!("CREATE DATABASE `{database}`"),
        format!(
            "CREATE TABLE `{database}`.`{TABLE}` (\
             `uuid` VARBINARY(192) NOT NULL, \
             `data` VARBINARY(60000) NOT NULL, \
             PRIMARY KEY (`uuid`))"
        ),
    ] {
        sqlx::raw_sql(&stmt)
            .execute(db.connection())
            .await
            .expect("Failed to create test table");
    }

    let mut inserted = Vec::new();
    for i in 0..rows {
        let key: Vec<u8> = (0..16u8)
            .map(|b| b.wrapping_mul(31).wrapping_add(i as u8))
            .collect();
        // Long enough that TO_BASE64 wraps the value over several lines
        let data: Vec<u8> = (0..(200 + i * 37)).map(|b| (b * 7 + i) as u8).collect();
        sqlx::query(&format!(
            "INSERT INTO `{database}`.`{TABLE}` (`uuid`, `data`) VALUES (?, ?)"
        ))
        .bind(key.as_slice())
        .bind(data.as_slice())
        .execute(db.connection())
        .await
        .expect("Failed to insert test row");
        inserted.push((key, data));
    }
    inserted
}

/// Cleanup helper to remove test data.
async fn cleanup_database(db: &mut Database, database: &str) {
    let _ = sqlx::raw_sql(&format!("DROP DATABASE IF EXISTS `{database}`"))
        .execute(db.connection())
        .await;
}

fn read_file(path: &Path) -> Vec<EncodedRow> {
    let file = File::open(path).expect("Failed to open export");
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .expect("Failed to read parquet metadata")
        .build()
        .expect("Failed to build reader");

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.expect("Failed to read batch");
        let uuids = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("uuid column should be Utf8");
        let data = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("data column should be Utf8");
        for i in 0..batch.num_rows() {
            rows.push(EncodedRow {
                uuid: uuids.value(i).to_string(),
                data: data.value(i).to_string(),
            });
        }
    }
    rows
}

fn config_for(
    database_url: &str,
    database: &str,
    output: &Path,
    page_size: Option<usize>,
) -> ExportConfig {
    ExportConfig {
        database_url: database_url.to_string(),
        database: database.to_string(),
        table: TABLE.to_string(),
        output: output.to_path_buf(),
        page_size,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_export_round_trips_bytes() {
    let Some((mut db, url)) = get_test_database().await else {
        return;
    };
    let database = unique_database("roundtrip");
    let inserted = create_test_table(&mut db, &database, 25).await;
    let dir = tempdir().expect("Failed to create temp dir");

    for page_size in [None, Some(4), Some(25)] {
        let output = dir.path().join("results.parquet");
        let config = config_for(&url, &database, &output, page_size);

        let stats = export_table(&mut db, &config).await.expect("Export failed");
        assert_eq!(stats.rows_exported, inserted.len());

        let report = verify(&output, 3).expect("Verify failed");
        assert_eq!(report.num_rows, inserted.len());
        assert_eq!(report.column_names(), vec!["uuid", "data"]);

        let expected: HashMap<Vec<u8>, Vec<u8>> = inserted.iter().cloned().collect();
        let rows = read_file(&output);
        assert_eq!(rows.len(), expected.len());
        for row in rows {
            assert!(!row.data.contains('\n'));
            let decoded = row.decode().expect("Exported value is not valid base64");
            assert_eq!(expected.get(&decoded.uuid), Some(&decoded.data));
        }
    }

    cleanup_database(&mut db, &database).await;
    db.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_export_empty_table() {
    let Some((mut db, url)) = get_test_database().await else {
        return;
    };
    let database = unique_database("empty");
    create_test_table(&mut db, &database, 0).await;
    let dir = tempdir().expect("Failed to create temp dir");

    for page_size in [None, Some(10)] {
        let output = dir.path().join("empty.parquet");
        let config = config_for(&url, &database, &output, page_size);

        let stats = export_table(&mut db, &config).await.expect("Export failed");
        assert_eq!(stats.rows_exported, 0);

        let report = verify(&output, 3).expect("Verify failed");
        assert_eq!(report.num_rows, 0);
        assert_eq!(report.column_names(), vec!["uuid", "data"]);
    }

    cleanup_database(&mut db, &database).await;
    db.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_count_and_list() {
    let Some((mut db, _)) = get_test_database().await else {
        return;
    };
    let database = unique_database("count");
    create_test_table(&mut db, &database, 3).await;

    let count = db.count_rows(&database, TABLE).await.expect("Count failed");
    assert_eq!(count, 3);

    let pattern = format!("^{database}$");
    let found = db
        .list_databases(Some(pattern.as_str()))
        .await
        .expect("List failed");
    assert_eq!(found, vec![database.clone()]);

    let all = db.list_databases(None).await.expect("List failed");
    assert!(all.contains(&database));
    assert!(all.iter().any(|name| name == "information_schema"));

    cleanup_database(&mut db, &database).await;
    db.close().await.expect("Failed to close");
}

#[tokio::test]
async fn test_missing_table_keeps_previous_export() {
    let Some((mut db, url)) = get_test_database().await else {
        return;
    };
    let database = unique_database("previous");
    create_test_table(&mut db, &database, 5).await;
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("results.parquet");

    let good = config_for(&url, &database, &output, None);
    export_table(&mut db, &good).await.expect("Export failed");

    let missing = unique_database("missing");
    for page_size in [None, Some(2)] {
        let config = config_for(&url, &missing, &output, page_size);
        assert!(export_table(&mut db, &config).await.is_err());

        let report = verify(&output, 3).expect("Previous export was damaged");
        assert_eq!(report.num_rows, 5);
    }

    let entries = std::fs::read_dir(dir.path())
        .expect("Failed to list temp dir")
        .count();
    assert_eq!(entries, 1);

    cleanup_database(&mut db, &database).await;
    db.close().await.expect("Failed to close");
}
