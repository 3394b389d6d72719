//! Database integration for provisioning.
//!
//! The [`Provisioner`] owns the single connection of a run and issues the
//! drop/create statements and batched inserts built in [`statements`].

mod provisioner;
pub mod statements;

pub use provisioner::{ProvisionError, ProvisionReport, Provisioner};
