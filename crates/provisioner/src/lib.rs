//! Load-test data provisioning.
//!
//! This crate resets a set of MySQL databases and fills one binary table in each
//! with synthetic rows: a 16-byte random key and a randomly sized random payload.
//! It exists to put realistic storage pressure on a server, nothing more.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use provisioner::prelude::*;
//!
//! let config = ProvisionConfig::default();
//! let mut provisioner = Provisioner::connect(&config.connection.url(), &config).await?;
//!
//! let registry = SchemaRegistry::from_config(&config);
//! let report = provisioner.provision(&registry, &mut rng).await?;
//! provisioner.close().await?;
//! ```

pub mod config;
pub mod db;
pub mod generators;
pub mod registry;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{ConfigError, ConnectionConfig, ProvisionConfig};
    pub use crate::db::{ProvisionError, ProvisionReport, Provisioner};
    pub use crate::generators::{GeneratedRow, RowGenConfig, RowGenerator};
    pub use crate::registry::{DatabaseSchema, SchemaRegistry};
}
