// file: src/storage/mod.rs
// version: 1.0.0
// guid: 4af53f93-2f67-425d-8a47-594ead54a361

//! Disk discovery on ESXi hosts

pub mod discovery;
pub mod parser;

pub use discovery::{discover_disks, MERGE_NAMING_CONVENTIONS};
pub use parser::{parse_listing, Convention};

use std::collections::BTreeMap;

/// Disk label mapped to raw size in KB
pub type DiskInventory = BTreeMap<String, u64>;

/// One discovered disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskRecord {
    /// e.g. `50GB(mpx.vmhba0:C0:T0:L0)`
    pub label: String,
    pub size_kb: u64,
}
