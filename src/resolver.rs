// file: src/resolver.rs
// version: 1.0.0
// guid: 40937e22-6176-4a75-8565-018621f520f3

//! Option resolver facade
//!
//! [`OptionResolver`] is the single entry point used by the configuration
//! UI. Inventory lookups return `Ok(None)` when no vCenter session could be
//! opened; every other lookup returns the option set directly.

use crate::config::{load_profile, KeyValueFile, ProfileField, Role, Settings};
use crate::inventory::{
    list_all, list_at_level, single_choice, CatalogKind, ChoiceSet, InventoryConnector,
    InventoryQuery, Level, NameKeyedCatalog, Vim25Connector,
};
use crate::logging::with_async_operation_span;
use crate::network::{CommandExecutor, SshClient};
use crate::options;
use crate::storage::{discover_disks, DiskInventory};
use crate::Result;
use tracing::debug;

/// Resolves UI option sets from the saved settings, vCenter and ESXi hosts
pub struct OptionResolver<C> {
    settings: Settings,
    connector: C,
}

impl OptionResolver<Vim25Connector> {
    /// Resolver talking to vCenter over the vSphere Web Services API
    pub fn vim25(settings: Settings) -> Self {
        Self::new(settings, Vim25Connector::new())
    }
}

impl<C> OptionResolver<C>
where
    C: InventoryConnector,
{
    pub fn new(settings: Settings, connector: C) -> Self {
        Self {
            settings,
            connector,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    async fn level(
        &self,
        role: Role,
        level: Level,
        query: &InventoryQuery,
    ) -> Result<Option<NameKeyedCatalog>> {
        let operation = format!("list_{}s", level);
        with_async_operation_span(&operation, || {
            list_at_level(&self.connector, &self.settings, role, level, query)
        })
        .await
    }

    pub async fn datacenters(&self, role: Role, query: &InventoryQuery) -> Result<Option<NameKeyedCatalog>> {
        self.level(role, Level::Datacenter, query).await
    }

    pub async fn clusters(&self, role: Role, query: &InventoryQuery) -> Result<Option<NameKeyedCatalog>> {
        self.level(role, Level::Cluster, query).await
    }

    pub async fn hosts(&self, role: Role, query: &InventoryQuery) -> Result<Option<NameKeyedCatalog>> {
        self.level(role, Level::Host, query).await
    }

    /// Datastores attached to the hosts the query selects
    pub async fn datastores(&self, role: Role, query: &InventoryQuery) -> Result<Option<NameKeyedCatalog>> {
        self.level(role, Level::Datastore, query).await
    }

    /// Networks attached to the hosts the query selects
    pub async fn networks(&self, role: Role, query: &InventoryQuery) -> Result<Option<NameKeyedCatalog>> {
        self.level(role, Level::Network, query).await
    }

    /// Every object of one kind in the answer file's vCenter
    pub async fn all_objects(&self, kind: CatalogKind) -> Result<Option<ChoiceSet>> {
        with_async_operation_span("list_all", || {
            list_all(&self.connector, &self.settings, kind)
        })
        .await
    }
}

impl<C> OptionResolver<C> {
    /// Saved connection field of a role, empty when unset
    pub fn saved_value(&self, role: Role, field: ProfileField) -> Result<String> {
        Ok(load_profile(&self.settings, role)?.field(field))
    }

    /// Saved connection field as a single-entry option set
    pub fn saved_choice(&self, role: Role, field: ProfileField) -> Result<ChoiceSet> {
        self.saved_value(role, field).map(single_choice)
    }

    fn answers(&self) -> Result<KeyValueFile> {
        KeyValueFile::load(&self.settings.answer_file)
    }

    fn admin_answers(&self) -> Result<KeyValueFile> {
        KeyValueFile::load(&self.settings.admin_answer_file)
    }

    pub fn management_azs(&self) -> Result<ChoiceSet> {
        Ok(options::management_azs(&self.answers()?))
    }

    pub fn compute_azs(&self) -> Result<ChoiceSet> {
        options::compute_azs(&self.answers()?, &self.admin_answers()?)
    }

    pub fn compute_hosts(&self) -> Result<ChoiceSet> {
        options::compute_hosts(&self.answers()?, &self.admin_answers()?)
    }

    pub fn edge_hosts(&self) -> Result<ChoiceSet> {
        Ok(options::edge_hosts(&self.answers()?))
    }

    fn ssh_client(&self) -> SshClient {
        SshClient::with_timeouts(
            self.settings.connect_timeout(),
            self.settings.command_timeout(),
        )
    }

    /// Disks of an ESXi host over SSH
    pub async fn disk_sizes(&self, host_ip: &str, username: &str, password: &str) -> Result<DiskInventory> {
        let mut client = self.ssh_client();
        self.disk_sizes_with(&mut client, host_ip, username, password)
            .await
    }

    /// Disks of an ESXi host through the given executor
    pub async fn disk_sizes_with<E>(
        &self,
        executor: &mut E,
        host_ip: &str,
        username: &str,
        password: &str,
    ) -> Result<DiskInventory>
    where
        E: CommandExecutor + ?Sized,
    {
        let port = self.settings.ssh_port;
        with_async_operation_span("discover_disks", || {
            discover_disks(executor, host_ip, port, username, password)
        })
        .await
    }

    /// Disks of the numbered management host from the answer file
    pub async fn disk_sizes_for_slot(&self, slot: u32) -> Result<DiskInventory> {
        let mut client = self.ssh_client();
        self.disk_sizes_for_slot_with(&mut client, slot).await
    }

    pub async fn disk_sizes_for_slot_with<E>(&self, executor: &mut E, slot: u32) -> Result<DiskInventory>
    where
        E: CommandExecutor + ?Sized,
    {
        let login = options::slot_login(&self.answers()?, slot);
        debug!("Disk discovery for slot {} on {}", slot, login.host);
        self.disk_sizes_with(executor, &login.host, &login.username, &login.password)
            .await
    }
}
