// file: src/config/profile.rs
// version: 1.0.0
// guid: c328b006-74a1-4f8d-8173-721b5c348b23

//! Per-role vCenter connection profiles

use super::{KeyValueFile, ProfileField, Role, RoleKeys, Settings};
use crate::Result;
use tracing::debug;

/// Hierarchy level a scope filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeLevel {
    Datacenter,
    Cluster,
}

/// Connection fields and scope filters of one role, read from its settings
/// document. Absent keys read as empty strings, absent scope keys as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    pub username: String,
    pub password: String,
    pub scope: Vec<(ScopeLevel, Option<String>)>,
}

impl ConnectionProfile {
    /// Build a profile from an already loaded document
    pub fn from_document(document: &KeyValueFile, keys: &RoleKeys) -> Self {
        Self {
            host: document.get_or_empty(keys.host),
            username: document.get_or_empty(keys.username),
            password: document.get_or_empty(keys.password),
            scope: vec![
                (ScopeLevel::Datacenter, document.get(keys.datacenter)),
                (ScopeLevel::Cluster, document.get(keys.cluster)),
            ],
        }
    }

    /// Saved filter for a level
    pub fn scope_value(&self, level: ScopeLevel) -> Option<&str> {
        self.scope
            .iter()
            .find(|(l, _)| *l == level)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Saved value of a field, empty string when absent
    pub fn field(&self, field: ProfileField) -> String {
        match field {
            ProfileField::Host => self.host.clone(),
            ProfileField::Username => self.username.clone(),
            ProfileField::Password => self.password.clone(),
            ProfileField::Datacenter => self
                .scope_value(ScopeLevel::Datacenter)
                .unwrap_or_default()
                .to_string(),
            ProfileField::Cluster => self
                .scope_value(ScopeLevel::Cluster)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Whether host, username and password are all present
    pub fn has_credentials(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Load the connection profile of a role from its settings document
pub fn load_profile(settings: &Settings, role: Role) -> Result<ConnectionProfile> {
    let path = settings.settings_path(role);
    debug!("Loading {} profile from {}", role.as_str(), path.display());
    let document = KeyValueFile::load(path)?;
    Ok(ConnectionProfile::from_document(&document, &role.keys()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_absent_file_gives_empty_profile() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            compute_settings_path: dir.path().join("missing.yml"),
            ..Settings::default()
        };

        let profile = load_profile(&settings, Role::Compute)?;
        assert_eq!(profile.host, "");
        assert_eq!(profile.username, "");
        assert_eq!(profile.password, "");
        assert_eq!(profile.scope_value(ScopeLevel::Datacenter), None);
        assert_eq!(profile.field(ProfileField::Cluster), "");
        assert!(!profile.has_credentials());
        Ok(())
    }

    #[test]
    fn test_roles_read_their_own_keys() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcenter.yml");
        fs::write(
            &path,
            "comp_vc: comp.lab\ncomp_vc_username: admin\ncomp_vc_password: secret\n\
             comp_vc_datacenter: DC1\nmgmt_vc: mgmt.lab\nmgmt_vc_cluster: ''\n",
        )?;
        let settings = Settings {
            compute_settings_path: path.clone(),
            management_settings_path: path,
            ..Settings::default()
        };

        let compute = load_profile(&settings, Role::Compute)?;
        assert_eq!(compute.host, "comp.lab");
        assert!(compute.has_credentials());
        assert_eq!(compute.scope_value(ScopeLevel::Datacenter), Some("DC1"));
        assert_eq!(compute.scope_value(ScopeLevel::Cluster), None);

        let management = load_profile(&settings, Role::Management)?;
        assert_eq!(management.host, "mgmt.lab");
        assert_eq!(management.username, "");
        assert_eq!(management.scope_value(ScopeLevel::Cluster), Some(""));
        Ok(())
    }
}
