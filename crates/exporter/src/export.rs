//! Table-to-file export.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::columnar::{ParquetSink, materialize};
use crate::config::ExportConfig;
use crate::database::Database;
use crate::errors::ExportError;

/// Statistics from an export operation.
#[derive(Debug, Clone)]
pub struct ExportStats {
    pub database: String,
    pub table: String,
    pub output: PathBuf,
    pub rows_exported: usize,
    pub bytes_written: u64,
    pub elapsed_ms: u64,
}

/// Exports `config.table` to `config.output`.
///
/// Without a page size the whole table is staged in memory and written in one
/// go; with one, pages are streamed into the file as they arrive.
pub async fn export_table(
    db: &mut Database,
    config: &ExportConfig,
) -> Result<ExportStats, ExportError> {
    let start = Instant::now();
    info!(
        "Exporting {}.{} to {}",
        config.database,
        config.table,
        config.output.display()
    );

    let stats = match config.page_size {
        None => {
            let frame = db.query_encoded(&config.database, &config.table).await?;
            info!("Fetched {} rows", frame.len());
            materialize(&frame, &config.output, config.compression_level)?
        }
        Some(page_size) => {
            let mut sink = ParquetSink::create(&config.output, config.compression_level)?;
            db.query_encoded_batched(&config.database, &config.table, page_size, |rows| {
                sink.write_rows(&rows)
            })
            .await?;
            sink.finish()?
        }
    };

    Ok(ExportStats {
        database: config.database.clone(),
        table: config.table.clone(),
        output: stats.path,
        rows_exported: stats.rows_written,
        bytes_written: stats.bytes_written,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
