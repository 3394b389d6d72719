//! In-memory staging of base64-encoded rows.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::errors::ExportError;

pub const UUID_COLUMN: &str = "uuid";
pub const DATA_COLUMN: &str = "data";

/// Schema of the exported file: both columns are non-null base64 text.
pub fn encoded_schema() -> Schema {
    Schema::new(vec![
        Field::new(UUID_COLUMN, DataType::Utf8, false),
        Field::new(DATA_COLUMN, DataType::Utf8, false),
    ])
}

/// Get the schema wrapped in an Arc (for Arrow writer APIs).
pub fn encoded_schema_ref() -> SchemaRef {
    Arc::new(encoded_schema())
}

/// Removes the line breaks MySQL's `TO_BASE64` inserts every 76 characters.
pub fn strip_line_breaks(encoded: &str) -> String {
    encoded.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// One row as returned by the encoding query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    pub uuid: String,
    pub data: String,
}

/// A row decoded back to raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    pub uuid: Vec<u8>,
    pub data: Vec<u8>,
}

impl EncodedRow {
    /// Builds a row from server output, normalizing each value to one line.
    pub fn new(uuid: &str, data: &str) -> Self {
        Self {
            uuid: strip_line_breaks(uuid),
            data: strip_line_breaks(data),
        }
    }

    /// Encodes raw bytes the way the server would (minus line breaks).
    pub fn encode(uuid: &[u8], data: &[u8]) -> Self {
        Self {
            uuid: STANDARD.encode(uuid),
            data: STANDARD.encode(data),
        }
    }

    pub fn decode(&self) -> Result<DecodedRow, ExportError> {
        Ok(DecodedRow {
            uuid: STANDARD.decode(&self.uuid)?,
            data: STANDARD.decode(&self.data)?,
        })
    }
}

/// Rows staged in memory, converted to Arrow only when materialized.
#[derive(Debug, Clone, Default)]
pub struct EncodedFrame {
    rows: Vec<EncodedRow>,
}

impl EncodedFrame {
    pub fn new(rows: Vec<EncodedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EncodedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema(&self) -> SchemaRef {
        encoded_schema_ref()
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, ExportError> {
        to_record_batch(&self.rows)
    }
}

/// Converts rows into one Arrow batch with the encoded schema.
pub fn to_record_batch(rows: &[EncodedRow]) -> Result<RecordBatch, ExportError> {
    let bytes: usize = rows.iter().map(|r| r.uuid.len() + r.data.len()).sum();
    let mut b_uuid = StringBuilder::with_capacity(rows.len(), bytes);
    let mut b_data = StringBuilder::with_capacity(rows.len(), bytes);

    for row in rows {
        b_uuid.append_value(&row.uuid);
        b_data.append_value(&row.data);
    }

    let columns: Vec<ArrayRef> = vec![Arc::new(b_uuid.finish()), Arc::new(b_data.finish())];
    Ok(RecordBatch::try_new(encoded_schema_ref(), columns)?)
}
