// file: src/lib.rs
// version: 1.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # vCenter Options
//!
//! Resolves the dropdown option sets of a deployment configuration UI:
//! vCenter inventory (datacenters, clusters, hosts and the datastores or
//! networks attached to them), flat object catalogs, values saved in the
//! answer files, and the disks of ESXi hosts discovered over SSH.

pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod network;
pub mod options;
pub mod resolver;
pub mod storage;

pub use error::{ResolverError, Result};
pub use resolver::OptionResolver;

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
