//! Export one MySQL table to a Parquet file with base64 text columns.
//!
//! The binary columns are encoded by the server (`TO_BASE64`) so every value
//! reaches the client as plain text. The resulting file is read back and its
//! schema and first rows printed as a smoke check.

pub mod columnar;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod frame;

pub use columnar::{ParquetSink, VerifyReport, WriteStats, materialize, verify};
pub use config::ExportConfig;
pub use database::Database;
pub use errors::ExportError;
pub use export::{ExportStats, export_table};
pub use frame::{DecodedRow, EncodedFrame, EncodedRow};
