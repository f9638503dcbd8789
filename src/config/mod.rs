// file: src/config/mod.rs
// version: 1.0.0
// guid: fed544bd-cdc6-4545-b594-939966cea109

//! Configuration module for the vCenter option resolver
//!
//! Handles the process-wide [`Settings`], the persisted key/value documents
//! written by the deployment UI, and the per-role connection profiles built
//! from them.

pub mod loader;
pub mod profile;
pub mod settings;
pub mod store;

pub use loader::SettingsLoader;
pub use profile::{load_profile, ConnectionProfile, ScopeLevel};
pub use settings::Settings;
pub use store::KeyValueFile;

use serde::{Deserialize, Serialize};

/// Deployment role whose vCenter is being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "compute")]
    Compute,
    #[serde(rename = "management")]
    Management,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Compute => "compute",
            Role::Management => "management",
        }
    }

    /// Settings keys holding this role's connection fields
    pub fn keys(&self) -> RoleKeys {
        match self {
            Role::Compute => RoleKeys {
                host: "comp_vc",
                username: "comp_vc_username",
                password: "comp_vc_password",
                datacenter: "comp_vc_datacenter",
                cluster: "comp_vc_cluster",
            },
            Role::Management => RoleKeys {
                host: "mgmt_vc",
                username: "mgmt_vc_username",
                password: "mgmt_vc_password",
                datacenter: "mgmt_vc_datacenter",
                cluster: "mgmt_vc_cluster",
            },
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compute" | "comp" => Ok(Role::Compute),
            "management" | "mgmt" => Ok(Role::Management),
            _ => Err(crate::error::ResolverError::config(format!(
                "Unknown role: {}",
                s
            ))),
        }
    }
}

/// One saved connection field of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Host,
    Username,
    Password,
    Datacenter,
    Cluster,
}

/// Key names of one role's connection fields in the settings document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleKeys {
    pub host: &'static str,
    pub username: &'static str,
    pub password: &'static str,
    pub datacenter: &'static str,
    pub cluster: &'static str,
}

impl RoleKeys {
    /// Key for the given field
    pub fn key(&self, field: ProfileField) -> &'static str {
        match field {
            ProfileField::Host => self.host,
            ProfileField::Username => self.username,
            ProfileField::Password => self.password,
            ProfileField::Datacenter => self.datacenter,
            ProfileField::Cluster => self.cluster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_keys() {
        let keys = Role::Management.keys();
        assert_eq!(keys.key(ProfileField::Host), "mgmt_vc");
        assert_eq!(keys.key(ProfileField::Cluster), "mgmt_vc_cluster");
        assert_eq!(Role::Compute.keys().password, "comp_vc_password");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("compute".parse::<Role>().unwrap(), Role::Compute);
        assert_eq!("mgmt".parse::<Role>().unwrap(), Role::Management);
        assert!("edge".parse::<Role>().is_err());
    }
}
