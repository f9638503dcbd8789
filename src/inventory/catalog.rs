// file: src/inventory/catalog.rs
// version: 1.0.0
// guid: 336b1877-38b0-49b2-a667-ebdc58191ad6

//! Flat object catalogs used as UI option sets

use super::session::{self, enumerate, Endpoint, InventoryConnector, InventorySession};
use super::{ChoiceSet, EntityKind};
use crate::config::{KeyValueFile, Settings};
use crate::Result;
use std::fmt;
use tracing::debug;

/// Answer file keys holding the catalog vCenter login
pub const VCENTER_HOST_KEY: &str = "vcenter_host_ip";
pub const VCENTER_USER_KEY: &str = "vcenter_user";
pub const VCENTER_PASSWORD_KEY: &str = "vcenter_pwd";

/// Object kinds offered as option sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Datacenter,
    Cluster,
    Host,
    Datastore,
    /// Standard networks and distributed port groups
    Network,
    /// Always includes a blank entry
    ResourcePool,
}

impl CatalogKind {
    pub fn entity_kinds(&self) -> &'static [EntityKind] {
        match self {
            CatalogKind::Datacenter => &[EntityKind::Datacenter],
            CatalogKind::Cluster => &[EntityKind::Cluster],
            CatalogKind::Host => &[EntityKind::Host],
            CatalogKind::Datastore => &[EntityKind::Datastore],
            CatalogKind::Network => &[EntityKind::DistributedPortGroup, EntityKind::Network],
            CatalogKind::ResourcePool => &[EntityKind::ResourcePool],
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CatalogKind::Datacenter => "datacenter",
            CatalogKind::Cluster => "cluster",
            CatalogKind::Host => "host",
            CatalogKind::Datastore => "datastore",
            CatalogKind::Network => "network",
            CatalogKind::ResourcePool => "resource pool",
        };
        f.write_str(name)
    }
}

/// Catalog login from the answer file
pub fn catalog_endpoint(settings: &Settings, answers: &KeyValueFile) -> Endpoint {
    let mut endpoint = Endpoint::new(
        answers.get_or_empty(VCENTER_HOST_KEY),
        answers.get_or_empty(VCENTER_USER_KEY),
        answers.get_or_empty(VCENTER_PASSWORD_KEY),
        settings.catalog_port,
    );
    endpoint.verify_tls = settings.catalog_verify_tls;
    endpoint.connect_timeout = settings.connect_timeout();
    endpoint.request_timeout = settings.command_timeout();
    endpoint.api_version = settings.api_version.clone();
    endpoint
}

/// Names of every object of one kind in an open session
pub async fn collect<S>(session: &S, kind: CatalogKind) -> Result<ChoiceSet>
where
    S: InventorySession + ?Sized,
{
    let root = session.root_folder().await?;
    let nodes = enumerate(session, &root, kind.entity_kinds()).await?;

    let mut choices = ChoiceSet::new();
    if kind == CatalogKind::ResourcePool {
        choices.insert(String::new(), String::new());
    }
    for node in nodes {
        choices.insert(node.name, String::new());
    }

    debug!("Got {} {} objects", choices.len(), kind);
    Ok(choices)
}

/// Every object of one kind, keyed by name, from the answer file's vCenter.
///
/// Returns `None` when no session could be opened. The session is released
/// before returning.
pub async fn list_all<C>(
    connector: &C,
    settings: &Settings,
    kind: CatalogKind,
) -> Result<Option<ChoiceSet>>
where
    C: InventoryConnector + ?Sized,
{
    let answers = KeyValueFile::load(&settings.answer_file)?;
    let endpoint = catalog_endpoint(settings, &answers);

    let session = match session::connect(connector, &endpoint).await? {
        Some(session) => session,
        None => return Ok(None),
    };
    debug!("Connected to {} for {} catalog", endpoint.host, kind);

    let result = collect(&session, kind).await;
    session::release(session).await;

    result.map(Some)
}
