// file: src/storage/parser.rs
// version: 1.0.0
// guid: 92bd988a-2c79-4a35-9927-1819bc48ca8f

//! Parsing of `esxcli storage core device list` output

use super::DiskRecord;
use crate::error::ResolverError;
use crate::Result;
use regex::Regex;
use tracing::debug;

/// Lists device paths; only used to find which naming conventions exist
pub const DEVICE_PATHS_COMMAND: &str = "esxcli storage core device list | grep -E 'Devfs Path:'";

const LEGACY_LISTING_COMMAND: &str = "esxcli storage core device list | grep -E 'Size:|Is SSD:|mpx'";
const NAA_LISTING_COMMAND: &str = "esxcli storage core device list | grep -E 'Size:|Is SSD:|naa'";

const LEGACY_PATTERN: &str = r"^(?P<id>mpx\.\w+(?::\w+)+)\)\s+Size:\s(?P<size>\d+)";
const NAA_PATTERN: &str = r"^(?P<id>naa\.\w+)\)\s+Size:\s(?P<size>\d+)";

/// Device naming conventions reported by ESXi
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// Legacy multipath names, e.g. `mpx.vmhba0:C0:T0:L0`
    Legacy,
    /// Network Addressing Authority names, e.g. `naa.600508b1001c`
    Naa,
}

impl Convention {
    /// Conventions in the order they are scanned
    pub const ALL: [Convention; 2] = [Convention::Legacy, Convention::Naa];

    /// Substring marking this convention in device path output
    pub fn marker(&self) -> &'static str {
        match self {
            Convention::Legacy => "mpx",
            Convention::Naa => "naa",
        }
    }

    pub fn listing_command(&self) -> &'static str {
        match self {
            Convention::Legacy => LEGACY_LISTING_COMMAND,
            Convention::Naa => NAA_LISTING_COMMAND,
        }
    }

    fn pattern(&self) -> Result<Regex> {
        let pattern = match self {
            Convention::Legacy => LEGACY_PATTERN,
            Convention::Naa => NAA_PATTERN,
        };
        Regex::new(pattern)
            .map_err(|e| ResolverError::other(format!("Invalid device pattern: {}", e)))
    }

    /// Legacy listings start with a fragment that never names a device
    fn skips_leading_fragment(&self) -> bool {
        matches!(self, Convention::Legacy)
    }

    /// Size in whole GB, or `None` when the device is filtered out
    pub fn size_in_gb(&self, size_kb: u64) -> Option<u64> {
        match self {
            Convention::Legacy if size_kb > 1024 => Some(size_kb / 1024),
            Convention::Legacy => None,
            Convention::Naa => Some((size_kb as f64 / 1024.0).round() as u64),
        }
    }

    pub fn is_present_in(&self, paths_output: &str) -> bool {
        paths_output.contains(self.marker())
    }
}

/// Human-readable disk label, e.g. `2GB(mpx.vmhba0:C0:T0:L0)`
pub fn disk_label(size_gb: u64, device_id: &str) -> String {
    format!("{}GB({})", size_gb, device_id)
}

/// Extract every device of one convention from a detailed listing.
///
/// Newlines are removed and the text is split on `(`, which the tool uses
/// to open each device identifier; each fragment must then start with the
/// identifier, a closing parenthesis and the size in KB.
pub fn parse_listing(convention: Convention, output: &str) -> Result<Vec<DiskRecord>> {
    let re = convention.pattern()?;
    let flattened = output.replace('\n', "");
    let skip = usize::from(convention.skips_leading_fragment());

    let mut records = Vec::new();
    for fragment in flattened.split('(').skip(skip) {
        let Some(caps) = re.captures(fragment) else {
            continue;
        };
        let id = &caps["id"];
        let size_kb = match caps["size"].parse::<u64>() {
            Ok(size) => size,
            Err(e) => {
                debug!("Skipping {} with unreadable size: {}", id, e);
                continue;
            }
        };
        if let Some(size_gb) = convention.size_in_gb(size_kb) {
            records.push(DiskRecord {
                label: disk_label(size_gb, id),
                size_kb,
            });
        }
    }

    debug!("Parsed {} {:?} devices", records.len(), convention);
    Ok(records)
}
