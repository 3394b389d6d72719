use regex::Regex;
use sqlx::{Connection, FromRow, mysql::MySqlConnection};
use tracing::debug;

use crate::errors::ExportError;
use crate::frame::{EncodedFrame, EncodedRow};

/// One row of the encoding query.
#[derive(Debug, FromRow)]
struct EncodedRecord {
    uuid: String,
    data: String,
}

/// One row of a keyset page; `raw_key` is the unencoded key to resume after.
#[derive(Debug, FromRow)]
struct KeyedEncodedRecord {
    raw_key: Vec<u8>,
    uuid: String,
    data: String,
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(database), quote_ident(table))
}

fn select_encoded(database: &str, table: &str) -> String {
    format!(
        "SELECT TO_BASE64(`uuid`) AS uuid, TO_BASE64(`data`) AS data FROM {}",
        qualified(database, table)
    )
}

fn select_encoded_page(database: &str, table: &str, resume: bool) -> String {
    let filter = if resume { "WHERE `uuid` > ? " } else { "" };
    format!(
        "SELECT `uuid` AS raw_key, TO_BASE64(`uuid`) AS uuid, TO_BASE64(`data`) AS data \
         FROM {} {filter}ORDER BY `uuid` LIMIT ?",
        qualified(database, table)
    )
}

fn database_names(raw: Vec<Vec<u8>>) -> Vec<String> {
    raw.into_iter()
        .map(|name| String::from_utf8_lossy(&name).into_owned())
        .collect()
}

/// Owns the single connection an export uses.
pub struct Database {
    conn: MySqlConnection,
}

impl Database {
    pub fn new(conn: MySqlConnection) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self, ExportError> {
        let conn = MySqlConnection::connect(url).await?;
        Ok(Self::new(conn))
    }

    /// Reads the whole table with both binary columns base64-encoded.
    pub async fn query_encoded(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<EncodedFrame, ExportError> {
        let sql = select_encoded(database, table);
        let records: Vec<EncodedRecord> = sqlx::query_as(&sql).fetch_all(&mut self.conn).await?;

        let rows = records
            .iter()
            .map(|r| EncodedRow::new(&r.uuid, &r.data))
            .collect();
        Ok(EncodedFrame::new(rows))
    }

    /// Reads the table in key order, `page_size` rows at a time, handing each
    /// page to `sink`.
    ///
    /// Each page resumes after the last raw key of the previous one; a short
    /// page ends the scan. Returns the total number of rows read.
    pub async fn query_encoded_batched<F>(
        &mut self,
        database: &str,
        table: &str,
        page_size: usize,
        mut sink: F,
    ) -> Result<usize, ExportError>
    where
        F: FnMut(Vec<EncodedRow>) -> Result<(), ExportError>,
    {
        if page_size == 0 {
            return Err(ExportError::InvalidConfig(
                "page size must be at least 1".to_string(),
            ));
        }

        let first_page = select_encoded_page(database, table, false);
        let next_page = select_encoded_page(database, table, true);
        let mut last_key: Option<Vec<u8>> = None;
        let mut total = 0;

        loop {
            let records: Vec<KeyedEncodedRecord> = match &last_key {
                None => {
                    sqlx::query_as(&first_page)
                        .bind(page_size as u64)
                        .fetch_all(&mut self.conn)
                        .await?
                }
                Some(key) => {
                    sqlx::query_as(&next_page)
                        .bind(key.as_slice())
                        .bind(page_size as u64)
                        .fetch_all(&mut self.conn)
                        .await?
                }
            };

            let fetched = records.len();
            if let Some(last) = records.last() {
                last_key = Some(last.raw_key.clone());
            }
            if fetched > 0 {
                let rows = records
                    .iter()
                    .map(|r| EncodedRow::new(&r.uuid, &r.data))
                    .collect();
                sink(rows)?;
            }

            total += fetched;
            debug!("Read page of {fetched} rows from {database}.{table} ({total} total)");

            if fetched < page_size {
                break;
            }
        }

        Ok(total)
    }

    /// Lists visible databases, optionally keeping only names matching `pattern`.
    pub async fn list_databases(
        &mut self,
        pattern: Option<&str>,
    ) -> Result<Vec<String>, ExportError> {
        // `Database` is a `_bin` collated column and arrives flagged as binary.
        let raw = sqlx::query_scalar::<_, Vec<u8>>("SHOW DATABASES")
            .fetch_all(&mut self.conn)
            .await?;
        let names = database_names(raw);

        match pattern {
            Some(pattern) => {
                let pattern = Regex::new(pattern)?;
                Ok(names.into_iter().filter(|n| pattern.is_match(n)).collect())
            }
            None => Ok(names),
        }
    }

    pub async fn count_rows(&mut self, database: &str, table: &str) -> Result<i64, ExportError> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified(database, table));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count)
    }

    /// Closes the connection, waiting for the server to acknowledge.
    pub async fn close(self) -> Result<(), ExportError> {
        self.conn.close().await?;
        Ok(())
    }

    /// Returns the connection for advanced usage.
    pub fn connection(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }
}
