//! Database provisioning: reset databases and seed them with random rows.

use std::time::Instant;

use rand::Rng;
use regex::Regex;
use serde::Serialize;
use sqlx::{Connection, mysql::MySqlConnection};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::statements;
use crate::config::{ConfigError, ProvisionConfig};
use crate::generators::{RowGenConfig, RowGenerator};
use crate::registry::SchemaRegistry;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid database pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Summary of a provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub databases: usize,
    pub tables: usize,
    pub rows: usize,
    pub elapsed_ms: u64,
}

/// Resets databases and fills them with load-test rows over one connection.
pub struct Provisioner {
    conn: MySqlConnection,
    generator: RowGenerator,
    batch_size: usize,
    batches: usize,
}

impl Provisioner {
    /// Creates a provisioner using the batch and payload settings of `config`.
    pub fn new(conn: MySqlConnection, config: &ProvisionConfig) -> Self {
        Self {
            conn,
            generator: RowGenerator::with_config(RowGenConfig::from(config)),
            batch_size: config.batch_size,
            batches: config.batches,
        }
    }

    /// Validates `config` and opens the connection at `url`.
    pub async fn connect(url: &str, config: &ProvisionConfig) -> Result<Self, ProvisionError> {
        config.validate()?;
        let conn = MySqlConnection::connect(url).await?;
        Ok(Self::new(conn, config))
    }

    /// Sets the number of batches inserted into each table.
    pub fn with_batches(mut self, batches: usize) -> Self {
        self.batches = batches;
        self
    }

    /// Drops the database if it exists and creates it empty.
    ///
    /// **WARNING**: all prior contents of `database` are lost.
    pub async fn drop_and_create_database(
        &mut self,
        database: &str,
    ) -> Result<(), ProvisionError> {
        self.execute_all(&[
            statements::drop_database(database),
            statements::create_database(database),
        ])
        .await?;

        debug!("Recreated database {database}");
        Ok(())
    }

    /// Selects `database`, drops `table` if present and recreates it.
    pub async fn drop_and_create_table(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<(), ProvisionError> {
        self.execute_all(&[
            statements::use_database(database),
            statements::drop_table(table),
            statements::create_table(table),
        ])
        .await?;

        debug!("Recreated table {database}.{table}");
        Ok(())
    }

    /// Runs statements in order over the text protocol.
    ///
    /// DDL commits implicitly in MySQL, so no transaction is opened here.
    async fn execute_all(&mut self, stmts: &[String]) -> Result<(), ProvisionError> {
        for stmt in stmts {
            sqlx::raw_sql(stmt).execute(&mut self.conn).await?;
        }
        Ok(())
    }

    /// Inserts `batches` batches of freshly generated rows, committing after each.
    ///
    /// Returns the number of rows inserted.
    pub async fn insert_batches(
        &mut self,
        database: &str,
        table: &str,
        rng: &mut impl Rng,
    ) -> Result<usize, ProvisionError> {
        let mut inserted = 0;

        for batch in 0..self.batches {
            let rows = self.generator.generate_batch(self.batch_size, rng);
            if rows.is_empty() {
                continue;
            }

            let mut tx = self.conn.begin().await?;
            statements::insert_rows(database, table, &rows)
                .build()
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            inserted += rows.len();
            debug!(
                "  Inserted batch {}/{} into {database}.{table}",
                batch + 1,
                self.batches
            );
        }

        Ok(inserted)
    }

    /// Lists every database visible to the connection.
    pub async fn list_databases(&mut self) -> Result<Vec<String>, ProvisionError> {
        // The name column carries a binary collation, so it only decodes as bytes.
        let raw = sqlx::query_scalar::<_, Vec<u8>>(statements::SHOW_DATABASES)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(database_names(raw))
    }

    /// Lists the visible databases whose name matches `pattern`.
    pub async fn list_databases_matching(
        &mut self,
        pattern: &str,
    ) -> Result<Vec<String>, ProvisionError> {
        let pattern = Regex::new(pattern)?;
        let names = self.list_databases().await?;
        Ok(names.into_iter().filter(|n| pattern.is_match(n)).collect())
    }

    /// Counts the rows of `database.table`.
    pub async fn count_rows(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<i64, ProvisionError> {
        let sql = statements::count_rows(database, table);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count)
    }

    /// Resets and seeds every database and table in `registry`.
    ///
    /// Stops at the first failing statement; work already committed stays.
    pub async fn provision(
        &mut self,
        registry: &SchemaRegistry,
        rng: &mut impl Rng,
    ) -> Result<ProvisionReport, ProvisionError> {
        let started_at = OffsetDateTime::now_utc();
        let start = Instant::now();
        info!(
            "Provisioning {} databases ({} tables)...",
            registry.len(),
            registry.table_count()
        );

        let mut tables = 0;
        let mut rows = 0;
        for (i, schema) in registry.iter().enumerate() {
            self.drop_and_create_database(&schema.name).await?;

            for table in &schema.tables {
                self.drop_and_create_table(&schema.name, table).await?;
                rows += self.insert_batches(&schema.name, table, rng).await?;
                tables += 1;
            }

            info!(
                "  Provisioned {}/{} databases ({})",
                i + 1,
                registry.len(),
                schema.name
            );
        }

        let report = ProvisionReport {
            started_at,
            databases: registry.len(),
            tables,
            rows,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Provisioned {} databases, {} tables, {} rows in {}ms",
            report.databases, report.tables, report.rows, report.elapsed_ms
        );
        Ok(report)
    }

    /// Closes the connection, waiting for the server to acknowledge.
    pub async fn close(self) -> Result<(), ProvisionError> {
        self.conn.close().await?;
        Ok(())
    }

    /// Returns the connection for advanced usage.
    pub fn connection(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }
}

fn database_names(raw: Vec<Vec<u8>>) -> Vec<String> {
    raw.into_iter()
        .map(|name| String::from_utf8_lossy(&name).into_owned())
        .collect()
}
