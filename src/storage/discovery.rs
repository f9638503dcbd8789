// file: src/storage/discovery.rs
// version: 1.0.0
// guid: dbaa6cca-0611-4f5a-a392-1378dec87d09

//! Disk discovery over SSH

use super::parser::{parse_listing, Convention, DEVICE_PATHS_COMMAND};
use super::DiskInventory;
use crate::error::ResolverError;
use crate::network::CommandExecutor;
use crate::Result;
use tracing::{debug, info, warn};

/// When false, each convention's pass starts from an empty result, so a
/// host reporting both conventions only yields its NAA devices.
pub const MERGE_NAMING_CONVENTIONS: bool = false;

/// Discover the disks of an ESXi host, keyed by label.
///
/// A failed SSH login is logged and discovery carries on; the commands then
/// find no session and the result is empty. A listing that writes to
/// stderr contributes nothing. The executor is always disconnected before
/// returning.
pub async fn discover_disks<E>(
    executor: &mut E,
    host: &str,
    port: u16,
    username: &str,
    password: &str,
) -> Result<DiskInventory>
where
    E: CommandExecutor + ?Sized,
{
    if let Err(e) = executor.connect(host, port, username, password).await {
        warn!("SSH connection to {} failed: {}", host, e);
    }

    let result = scan(executor, host).await;
    executor.disconnect();

    match result {
        Err(ResolverError::NoSession(reason)) => {
            warn!("No disks discovered on {}: {}", host, reason);
            Ok(DiskInventory::new())
        }
        other => other,
    }
}

async fn scan<E>(executor: &mut E, host: &str) -> Result<DiskInventory>
where
    E: CommandExecutor + ?Sized,
{
    let (_, paths, _) = executor
        .execute_with_error_collection(DEVICE_PATHS_COMMAND, "device paths")
        .await?;
    debug!("Device paths on {}: {}", host, paths);

    let mut devices = DiskInventory::new();
    for convention in Convention::ALL {
        if !convention.is_present_in(&paths) {
            continue;
        }
        if !MERGE_NAMING_CONVENTIONS {
            devices.clear();
        }

        let command = convention.listing_command();
        info!("Executing {} for host {}", command, host);
        let (_, stdout, stderr) = executor
            .execute_with_error_collection(command, "device listing")
            .await?;

        if !stderr.is_empty() {
            warn!("Listing {:?} devices on {} failed: {}", convention, host, stderr.trim());
            continue;
        }

        for record in parse_listing(convention, &stdout)? {
            devices.insert(record.label, record.size_kb);
        }
    }

    debug!("The device ids with their sizes are {:?}", devices);
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct ScriptedExecutor {
        outputs: HashMap<&'static str, (&'static str, &'static str)>,
        refuse_login: bool,
        connected: bool,
        disconnects: usize,
        executed: Vec<String>,
    }

    impl ScriptedExecutor {
        fn with(mut self, command: &'static str, stdout: &'static str, stderr: &'static str) -> Self {
            self.outputs.insert(command, (stdout, stderr));
            self
        }
    }

    #[async_trait::async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn connect(&mut self, _host: &str, _port: u16, _user: &str, _pass: &str) -> Result<()> {
            if self.refuse_login {
                return Err(ResolverError::auth("bad password"));
            }
            self.connected = true;
            Ok(())
        }

        async fn execute_with_error_collection(
            &mut self,
            command: &str,
            _description: &str,
        ) -> Result<(i32, String, String)> {
            if !self.connected {
                return Err(ResolverError::no_session("not connected"));
            }
            self.executed.push(command.to_string());
            let (stdout, stderr) = self.outputs.get(command).copied().unwrap_or(("", ""));
            let code = if stdout.is_empty() { 1 } else { 0 };
            Ok((code, stdout.to_string(), stderr.to_string()))
        }

        fn disconnect(&mut self) {
            self.connected = false;
            self.disconnects += 1;
        }
    }

    const LEGACY_PATHS: &str = "   Devfs Path: /vmfs/devices/disks/mpx.vmhba0:C0:T0:L0\n";
    const BOTH_PATHS: &str = "   Devfs Path: /vmfs/devices/disks/mpx.vmhba0:C0:T0:L0
   Devfs Path: /vmfs/devices/disks/naa.600508b1001c3a1f
";
    const LEGACY_LISTING: &str = "   Display Name: Local Disk (mpx.vmhba0:C0:T0:L0)\n   Size: 2048\n   Is SSD: false\n";
    const NAA_LISTING: &str = "   Display Name: SAS Disk (naa.600508b1001c3a1f)\n   Size: 1536\n";

    #[tokio::test]
    async fn test_discovers_legacy_disks() {
        let mut executor = ScriptedExecutor::default()
            .with(DEVICE_PATHS_COMMAND, LEGACY_PATHS, "")
            .with(Convention::Legacy.listing_command(), LEGACY_LISTING, "");

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "pw")
            .await
            .unwrap();

        assert_eq!(disks.len(), 1);
        assert_eq!(disks.get("2GB(mpx.vmhba0:C0:T0:L0)"), Some(&2048));
        assert_eq!(executor.disconnects, 1);
        assert!(!executor
            .executed
            .iter()
            .any(|c| c == Convention::Naa.listing_command()));
    }

    #[tokio::test]
    async fn test_second_convention_replaces_first() {
        let mut executor = ScriptedExecutor::default()
            .with(DEVICE_PATHS_COMMAND, BOTH_PATHS, "")
            .with(Convention::Legacy.listing_command(), LEGACY_LISTING, "")
            .with(Convention::Naa.listing_command(), NAA_LISTING, "");

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "pw")
            .await
            .unwrap();

        assert!(!MERGE_NAMING_CONVENTIONS);
        assert_eq!(disks.len(), 1);
        assert_eq!(disks.get("2GB(naa.600508b1001c3a1f)"), Some(&1536));
        assert!(!disks.contains_key("2GB(mpx.vmhba0:C0:T0:L0)"));
    }

    #[tokio::test]
    async fn test_failed_naa_listing_still_discards_legacy() {
        let mut executor = ScriptedExecutor::default()
            .with(DEVICE_PATHS_COMMAND, BOTH_PATHS, "")
            .with(Convention::Legacy.listing_command(), LEGACY_LISTING, "")
            .with(Convention::Naa.listing_command(), "", "esxcli: connection refused");

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "pw")
            .await
            .unwrap();
        assert!(disks.is_empty());
    }

    #[tokio::test]
    async fn test_stderr_yields_empty_pass() {
        let mut executor = ScriptedExecutor::default()
            .with(DEVICE_PATHS_COMMAND, LEGACY_PATHS, "")
            .with(Convention::Legacy.listing_command(), LEGACY_LISTING, "grep: broken pipe");

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "pw")
            .await
            .unwrap();
        assert!(disks.is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_yields_empty_result() {
        let mut executor = ScriptedExecutor {
            refuse_login: true,
            ..ScriptedExecutor::default()
        }
        .with(DEVICE_PATHS_COMMAND, LEGACY_PATHS, "");

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "wrong")
            .await
            .unwrap();

        assert!(disks.is_empty());
        assert!(executor.executed.is_empty());
        assert_eq!(executor.disconnects, 1);
    }

    #[tokio::test]
    async fn test_no_known_convention() {
        let mut executor = ScriptedExecutor::default().with(
            DEVICE_PATHS_COMMAND,
            "   Devfs Path: /vmfs/devices/disks/t10.ATA_Disk\n",
            "",
        );

        let disks = discover_disks(&mut executor, "10.0.0.21", 22, "root", "pw")
            .await
            .unwrap();
        assert!(disks.is_empty());
        assert_eq!(executor.executed, vec![DEVICE_PATHS_COMMAND.to_string()]);
    }
}
