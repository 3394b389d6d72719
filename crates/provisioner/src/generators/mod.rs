//! Row generators for load-test data.
//!
//! - [`RowGenerator`]: random 16-byte keys paired with randomly sized random payloads

pub mod row;

pub use row::{GeneratedRow, RowGenConfig, RowGenerator};
