// file: src/inventory/walker.rs
// version: 1.0.0
// guid: aab8b310-57e7-44d6-9562-c22d831aea71

//! Hierarchical inventory resolution
//!
//! Walks root -> datacenters -> clusters -> hosts, and flattens the
//! datastores or networks attached to the selected hosts. Every level is
//! keyed by entity name; an empty filter selects everything at its level.

use super::session::{self, enumerate, Endpoint, InventoryConnector, InventorySession};
use super::{fold_by_name, EntityKind, NameKeyedCatalog};
use crate::config::{load_profile, ConnectionProfile, ProfileField, Role, Settings};
use crate::Result;
use std::fmt;
use tracing::debug;

/// Hierarchy level to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Datacenter,
    Cluster,
    Host,
    Datastore,
    Network,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Datacenter => "datacenter",
            Level::Cluster => "cluster",
            Level::Host => "host",
            Level::Datastore => "datastore",
            Level::Network => "network",
        };
        f.write_str(name)
    }
}

/// Per-call overrides of a role's saved connection fields.
///
/// `None` takes the value from the role's settings document; for
/// `datacenter` and `cluster`, `Some("")` means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryQuery {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub datacenter: Option<String>,
    pub cluster: Option<String>,
}

impl InventoryQuery {
    /// Use the saved connection, but do not restrict any level
    pub fn unfiltered() -> Self {
        Self {
            datacenter: Some(String::new()),
            cluster: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn datacenter(mut self, name: impl Into<String>) -> Self {
        self.datacenter = Some(name.into());
        self
    }

    pub fn cluster(mut self, name: impl Into<String>) -> Self {
        self.cluster = Some(name.into());
        self
    }

    pub fn login(
        mut self,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.host = Some(host.into());
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    fn is_complete(&self) -> bool {
        self.host.is_some()
            && self.username.is_some()
            && self.password.is_some()
            && self.datacenter.is_some()
            && self.cluster.is_some()
    }
}

/// Connection and filters of one query after defaults were applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub endpoint: Endpoint,
    pub datacenter: String,
    pub cluster: String,
}

/// Fill the unset fields of `query` from the role's settings document,
/// which is read only when some field is unset
pub fn resolve_query(settings: &Settings, role: Role, query: &InventoryQuery) -> Result<ResolvedQuery> {
    let profile = if query.is_complete() {
        ConnectionProfile::default()
    } else {
        load_profile(settings, role)?
    };
    let pick = |value: &Option<String>, field: ProfileField| {
        value.clone().unwrap_or_else(|| profile.field(field))
    };

    let mut endpoint = Endpoint::new(
        pick(&query.host, ProfileField::Host),
        pick(&query.username, ProfileField::Username),
        pick(&query.password, ProfileField::Password),
        settings.vcenter_port,
    );
    endpoint.verify_tls = settings.verify_tls;
    endpoint.connect_timeout = settings.connect_timeout();
    endpoint.request_timeout = settings.command_timeout();
    endpoint.api_version = settings.api_version.clone();

    Ok(ResolvedQuery {
        endpoint,
        datacenter: pick(&query.datacenter, ProfileField::Datacenter),
        cluster: pick(&query.cluster, ProfileField::Cluster),
    })
}

fn selected(filter: &str, name: &str) -> bool {
    filter.is_empty() || filter == name
}

/// Walks the hierarchy of one open session
pub struct HierarchyWalker<'a, S: ?Sized> {
    session: &'a S,
}

impl<'a, S> HierarchyWalker<'a, S>
where
    S: InventorySession + ?Sized,
{
    pub fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Datacenters under the root folder
    pub async fn datacenters(&self, datacenter: &str) -> Result<NameKeyedCatalog> {
        let root = self.session.root_folder().await?;
        let mut catalog = NameKeyedCatalog::new();
        fold_by_name(
            &mut catalog,
            enumerate(self.session, &root, &[EntityKind::Datacenter])
                .await?
                .into_iter()
                .filter(|dc| selected(datacenter, &dc.name)),
        );
        Ok(catalog)
    }

    /// Clusters of the selected datacenters
    pub async fn clusters(&self, datacenter: &str, cluster: &str) -> Result<NameKeyedCatalog> {
        let mut catalog = NameKeyedCatalog::new();
        for dc in self.datacenters(datacenter).await?.values() {
            let clusters = enumerate(self.session, dc, &[EntityKind::Cluster]).await?;
            fold_by_name(
                &mut catalog,
                clusters.into_iter().filter(|cl| selected(cluster, &cl.name)),
            );
        }
        Ok(catalog)
    }

    /// Hosts of the selected clusters
    pub async fn hosts(&self, datacenter: &str, cluster: &str) -> Result<NameKeyedCatalog> {
        let mut catalog = NameKeyedCatalog::new();
        for cl in self.clusters(datacenter, cluster).await?.values() {
            fold_by_name(
                &mut catalog,
                enumerate(self.session, cl, &[EntityKind::Host]).await?,
            );
        }
        Ok(catalog)
    }

    /// Datastores or networks attached to the selected hosts, flattened
    /// into one catalog
    pub async fn attachments(
        &self,
        datacenter: &str,
        cluster: &str,
        kind: EntityKind,
    ) -> Result<NameKeyedCatalog> {
        let mut catalog = NameKeyedCatalog::new();
        for host in self.hosts(datacenter, cluster).await?.values() {
            fold_by_name(
                &mut catalog,
                self.session.host_attachments(host, kind).await?,
            );
        }
        Ok(catalog)
    }

    pub async fn list(&self, level: Level, datacenter: &str, cluster: &str) -> Result<NameKeyedCatalog> {
        match level {
            Level::Datacenter => self.datacenters(datacenter).await,
            Level::Cluster => self.clusters(datacenter, cluster).await,
            Level::Host => self.hosts(datacenter, cluster).await,
            Level::Datastore => {
                self.attachments(datacenter, cluster, EntityKind::Datastore)
                    .await
            }
            Level::Network => {
                self.attachments(datacenter, cluster, EntityKind::Network)
                    .await
            }
        }
    }
}

/// Resolve one hierarchy level of a role's vCenter.
///
/// Returns `None` when no session could be opened (missing credentials,
/// rejected login, unreachable endpoint), and an empty catalog when the
/// filters match nothing. The session is released before returning.
pub async fn list_at_level<C>(
    connector: &C,
    settings: &Settings,
    role: Role,
    level: Level,
    query: &InventoryQuery,
) -> Result<Option<NameKeyedCatalog>>
where
    C: InventoryConnector + ?Sized,
{
    let resolved = resolve_query(settings, role, query)?;
    debug!(
        "list {} for {}: {}, {}, {:?}, {:?}",
        level,
        role.as_str(),
        resolved.endpoint.host,
        resolved.endpoint.username,
        resolved.datacenter,
        resolved.cluster
    );

    let session = match session::connect(connector, &resolved.endpoint).await? {
        Some(session) => session,
        None => return Ok(None),
    };

    let result = HierarchyWalker::new(&session)
        .list(level, &resolved.datacenter, &resolved.cluster)
        .await;
    session::release(session).await;

    result.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_query_defaults_from_settings() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcenter.yml");
        fs::write(
            &path,
            "mgmt_vc: mgmt.lab\nmgmt_vc_username: admin\nmgmt_vc_password: secret\nmgmt_vc_datacenter: DC1\n",
        )?;
        let settings = Settings {
            management_settings_path: path,
            vcenter_port: 8443,
            ..Settings::default()
        };

        let resolved = resolve_query(
            &settings,
            Role::Management,
            &InventoryQuery::default().cluster("Edge"),
        )?;
        assert_eq!(resolved.endpoint.host, "mgmt.lab");
        assert_eq!(resolved.endpoint.port, 8443);
        assert_eq!(resolved.datacenter, "DC1");
        assert_eq!(resolved.cluster, "Edge");
        Ok(())
    }

    #[test]
    fn test_complete_query_skips_settings_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcenter.yml");
        // Unreadable as YAML: only parsed when a field falls back to it
        fs::write(&path, "comp_vc: [unterminated\n")?;
        let settings = Settings {
            compute_settings_path: path,
            ..Settings::default()
        };

        let query = InventoryQuery::unfiltered().login("vc.lab", "root", "pw");
        let resolved = resolve_query(&settings, Role::Compute, &query)?;
        assert_eq!(resolved.endpoint.username, "root");
        assert_eq!(resolved.datacenter, "");

        assert!(resolve_query(&settings, Role::Compute, &InventoryQuery::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_selected() {
        assert!(selected("", "anything"));
        assert!(selected("DC1", "DC1"));
        assert!(!selected("DC1", "dc1"));
    }
}
