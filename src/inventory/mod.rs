// file: src/inventory/mod.rs
// version: 1.0.0
// guid: 11937aa8-9d2d-44e9-aa16-17def5b0295f

//! vCenter inventory access
//!
//! The inventory service is reached through the [`InventoryConnector`] /
//! [`InventorySession`] capability traits. [`walker`] resolves the
//! datacenter -> cluster -> host -> {datastore, network} hierarchy of a role,
//! [`catalog`] lists every object of one kind as a UI choice set.

pub mod catalog;
pub mod session;
pub mod soap;
pub mod walker;
pub mod xml;

pub use catalog::{list_all, CatalogKind};
pub use session::{connect, release, Endpoint, InventoryConnector, InventorySession};
pub use soap::Vim25Connector;
pub use walker::{list_at_level, HierarchyWalker, InventoryQuery, Level};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a managed inventory entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Folder,
    Datacenter,
    Cluster,
    Host,
    Datastore,
    Network,
    DistributedPortGroup,
    ResourcePool,
}

impl EntityKind {
    /// Managed object type name in the vSphere API
    pub fn vim_type(&self) -> &'static str {
        match self {
            EntityKind::Folder => "Folder",
            EntityKind::Datacenter => "Datacenter",
            EntityKind::Cluster => "ClusterComputeResource",
            EntityKind::Host => "HostSystem",
            EntityKind::Datastore => "Datastore",
            EntityKind::Network => "Network",
            EntityKind::DistributedPortGroup => "DistributedVirtualPortgroup",
            EntityKind::ResourcePool => "ResourcePool",
        }
    }

    /// Inverse of [`EntityKind::vim_type`]; opaque networks and other
    /// `Network` subtypes map to `Network`
    pub fn from_vim_type(name: &str) -> Option<Self> {
        match name {
            "Folder" => Some(EntityKind::Folder),
            "Datacenter" => Some(EntityKind::Datacenter),
            "ClusterComputeResource" => Some(EntityKind::Cluster),
            "HostSystem" => Some(EntityKind::Host),
            "Datastore" => Some(EntityKind::Datastore),
            "DistributedVirtualPortgroup" => Some(EntityKind::DistributedPortGroup),
            "Network" | "OpaqueNetwork" => Some(EntityKind::Network),
            "ResourcePool" | "VirtualApp" => Some(EntityKind::ResourcePool),
            _ => None,
        }
    }
}

/// Reference to an entity owned by the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryNode {
    pub kind: EntityKind,
    /// Managed object id, e.g. `datacenter-2`
    pub id: String,
    pub name: String,
}

impl InventoryNode {
    pub fn new(kind: EntityKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Entities keyed by name. Names are unique only per catalog: when two
/// entities share a name, the one inserted last wins.
pub type NameKeyedCatalog = BTreeMap<String, InventoryNode>;

/// UI option set: only key presence matters, values are empty placeholders
pub type ChoiceSet = BTreeMap<String, String>;

/// Fold entities into a catalog in discovery order, later names overwriting
/// earlier ones
pub fn fold_by_name<I>(catalog: &mut NameKeyedCatalog, nodes: I)
where
    I: IntoIterator<Item = InventoryNode>,
{
    for node in nodes {
        catalog.insert(node.name.clone(), node);
    }
}

/// Single-entry option set keyed by a saved value
pub fn single_choice(value: impl Into<String>) -> ChoiceSet {
    let mut choices = ChoiceSet::new();
    choices.insert(value.into(), String::new());
    choices
}
