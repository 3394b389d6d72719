//! Parquet output and read-back verification.
//!
//! Files are written with ZSTD compression and read back with the Arrow
//! reader, which recovers the Arrow schema stored in the file metadata.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::ExportError;
use crate::frame::{EncodedFrame, EncodedRow, encoded_schema_ref, to_record_batch};

/// Statistics from writing one file.
#[derive(Debug, Clone)]
pub struct WriteStats {
    pub path: PathBuf,
    pub rows_written: usize,
    pub bytes_written: u64,
}

/// Streaming writer for encoded rows.
///
/// Rows go to a temporary file next to the destination. `finish` renames it
/// over the destination; dropping the sink unfinished leaves the destination
/// untouched.
pub struct ParquetSink {
    path: PathBuf,
    writer: ArrowWriter<NamedTempFile>,
    rows_written: usize,
}

impl ParquetSink {
    pub fn create(path: impl AsRef<Path>, compression_level: i32) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();
        let properties = writer_properties(compression_level)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = NamedTempFile::new_in(dir)?;
        let writer = ArrowWriter::try_new(staging, encoded_schema_ref(), Some(properties))?;

        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// Appends rows; an empty slice is a no-op.
    pub fn write_rows(&mut self, rows: &[EncodedRow]) -> Result<(), ExportError> {
        if rows.is_empty() {
            return Ok(());
        }
        let batch = to_record_batch(rows)?;
        self.writer.write(&batch)?;
        self.rows_written += rows.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Writes the footer and moves the file into place, replacing any old one.
    pub fn finish(self) -> Result<WriteStats, ExportError> {
        let staging = self.writer.into_inner()?;
        staging
            .persist(&self.path)
            .map_err(|e| ExportError::Io(e.error))?;
        let bytes_written = fs::metadata(&self.path)?.len();

        info!(
            "Wrote {} rows to {} ({} bytes)",
            self.rows_written,
            self.path.display(),
            bytes_written
        );
        Ok(WriteStats {
            path: self.path,
            rows_written: self.rows_written,
            bytes_written,
        })
    }
}

/// Build Parquet writer properties with ZSTD compression.
fn writer_properties(compression_level: i32) -> Result<WriterProperties, ExportError> {
    let zstd_level = ZstdLevel::try_new(compression_level)?;
    Ok(WriterProperties::builder()
        .set_compression(Compression::ZSTD(zstd_level))
        .build())
}

/// Writes a staged frame to `path`, overwriting any existing file.
pub fn materialize(
    frame: &EncodedFrame,
    path: impl AsRef<Path>,
    compression_level: i32,
) -> Result<WriteStats, ExportError> {
    let mut sink = ParquetSink::create(path, compression_level)?;
    sink.write_rows(frame.rows())?;
    sink.finish()
}

/// What the verification step found in a written file.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub schema: SchemaRef,
    pub num_rows: usize,
    /// Pretty-printed table of the first rows.
    pub preview: String,
}

impl VerifyReport {
    pub fn column_names(&self) -> Vec<&str> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema:")?;
        for field in self.schema.fields() {
            writeln!(f, "  {}: {}", field.name(), field.data_type())?;
        }
        writeln!(f, "Rows: {}", self.num_rows)?;
        write!(f, "{}", self.preview)
    }
}

/// Reopens a written file and reads its schema, row count and first rows.
pub fn verify(path: impl AsRef<Path>, preview_rows: usize) -> Result<VerifyReport, ExportError> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let num_rows = builder.metadata().file_metadata().num_rows() as usize;

    let mut reader = builder.with_batch_size(preview_rows.max(1)).build()?;
    let head = match reader.next().transpose()? {
        Some(batch) => batch.slice(0, preview_rows.min(batch.num_rows())),
        None => RecordBatch::new_empty(schema.clone()),
    };
    let preview = pretty_format_batches(&[head])?.to_string();

    Ok(VerifyReport {
        schema,
        num_rows,
        preview,
    })
}
