//! Export settings.
//!
//! Defaults are the values the export job has always used; a handful of
//! environment variables can override them for ad hoc runs.

use std::path::PathBuf;

use crate::errors::ExportError;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub database_url: String,
    pub database: String,
    pub table: String,
    /// Destination file, overwritten on every run.
    pub output: PathBuf,
    /// Rows printed by the verification step.
    pub preview_rows: usize,
    /// Read the table in keyset pages of this many rows instead of one query.
    pub page_size: Option<usize>,
    /// ZSTD compression level (1-22).
    pub compression_level: i32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            database_url: "mysql://root@localhost:3306".to_string(),
            database: "production_env4".to_string(),
            table: "delivs_2024_10".to_string(),
            output: PathBuf::from("results.parquet"),
            preview_rows: 3,
            page_size: None,
            compression_level: 3,
        }
    }
}

impl ExportConfig {
    /// Defaults overridden by `DATABASE_URL`, `EXPORT_DATABASE`, `EXPORT_TABLE`,
    /// `EXPORT_OUTPUT` and `EXPORT_PAGE_SIZE` when set.
    pub fn from_env() -> Result<Self, ExportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ExportError> {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(database) = lookup("EXPORT_DATABASE") {
            config.database = database;
        }
        if let Some(table) = lookup("EXPORT_TABLE") {
            config.table = table;
        }
        if let Some(output) = lookup("EXPORT_OUTPUT") {
            config.output = PathBuf::from(output);
        }
        if let Some(page_size) = lookup("EXPORT_PAGE_SIZE") {
            let page_size = page_size.parse::<usize>().map_err(|e| {
                ExportError::InvalidConfig(format!("EXPORT_PAGE_SIZE '{page_size}': {e}"))
            })?;
            if page_size == 0 {
                return Err(ExportError::InvalidConfig(
                    "EXPORT_PAGE_SIZE must be at least 1".to_string(),
                ));
            }
            config.page_size = Some(page_size);
        }

        Ok(config)
    }
}
