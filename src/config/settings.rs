// file: src/config/settings.rs
// version: 1.0.0
// guid: 7f0ac83e-a6f2-4ca6-bff3-504eecd27759

//! Process-wide resolver settings

use super::Role;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings constructed once at process start and passed to every resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key/value document holding the compute vCenter connection fields
    pub compute_settings_path: PathBuf,
    /// Key/value document holding the management vCenter connection fields
    pub management_settings_path: PathBuf,
    /// Deployment answer file (host IPs, AZ names, catalog vCenter login)
    pub answer_file: PathBuf,
    /// Admin answer file (cluster and AZ counts)
    pub admin_answer_file: PathBuf,
    /// Port used for role-scoped inventory sessions
    pub vcenter_port: u16,
    pub verify_tls: bool,
    /// Port used by the flat object catalog
    pub catalog_port: u16,
    pub catalog_verify_tls: bool,
    /// SOAP API version sent in the SOAPAction header
    pub api_version: String,
    pub ssh_port: u16,
    /// No timeout unless set: calls block until the transport gives up
    pub connect_timeout_secs: Option<u64>,
    pub command_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compute_settings_path: PathBuf::from("/var/lib/chaperone/vcenter.yml"),
            management_settings_path: PathBuf::from("/var/lib/chaperone/vcenter.yml"),
            answer_file: PathBuf::from("/var/lib/chaperone/answerfile.yml"),
            admin_answer_file: PathBuf::from("/var/lib/chaperone-admin/answerfile.yml"),
            vcenter_port: 443,
            verify_tls: true,
            catalog_port: 443,
            catalog_verify_tls: false,
            api_version: "6.0".to_string(),
            ssh_port: 22,
            connect_timeout_secs: None,
            command_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Settings document for a role
    pub fn settings_path(&self, role: Role) -> &Path {
        match role {
            Role::Compute => &self.compute_settings_path,
            Role::Management => &self.management_settings_path,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Expand `~` and environment references in every configured path
    pub fn expand_paths(&mut self) -> crate::Result<()> {
        for path in [
            &mut self.compute_settings_path,
            &mut self.management_settings_path,
            &mut self.answer_file,
            &mut self.admin_answer_file,
        ] {
            let raw = path.to_string_lossy().to_string();
            let expanded = shellexpand::full(&raw).map_err(|e| {
                crate::error::ResolverError::config(format!(
                    "Failed to expand path {}: {}",
                    raw, e
                ))
            })?;
            *path = PathBuf::from(expanded.as_ref());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.vcenter_port, 443);
        assert_eq!(settings.ssh_port, 22);
        assert!(settings.connect_timeout().is_none());
        assert!(!settings.catalog_verify_tls);
        assert_eq!(
            settings.settings_path(Role::Management),
            Path::new("/var/lib/chaperone/vcenter.yml")
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: Settings =
            serde_yaml::from_str("vcenter_port: 8443\ncommand_timeout_secs: 30\n").unwrap();
        assert_eq!(settings.vcenter_port, 8443);
        assert_eq!(settings.command_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.catalog_port, 443);
    }
}
