// file: src/config/store.rs
// version: 1.0.0
// guid: f65db980-7dd8-4977-b210-05f9f6c54c04

//! Read-only access to the flat key/value YAML documents written by the
//! deployment UI.

use crate::error::ResolverError;
use crate::Result;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use tracing::{debug, info};

/// Snapshot of a flat key/value document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValueFile {
    entries: BTreeMap<String, Value>,
}

impl KeyValueFile {
    /// Load a document, holding a shared lock while reading.
    ///
    /// A missing file is an empty document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No file {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ResolverError::Io(e)),
        };

        let content = {
            let _lock = SharedLock::acquire(&file)?;
            let mut content = String::new();
            let mut reader = &file;
            reader.read_to_string(&mut content)?;
            content
        };

        debug!("Read {} bytes from {}", content.len(), path.display());
        Self::parse(&content)
    }

    /// Parse document contents
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(content)?;
        let entries = match value {
            Value::Null => BTreeMap::new(),
            Value::Mapping(map) => map
                .into_iter()
                .filter_map(|(k, v)| scalar_to_string(&k).map(|k| (k, v)))
                .collect(),
            _ => {
                return Err(ResolverError::config(
                    "Settings document is not a key/value mapping",
                ))
            }
        };

        Ok(Self { entries })
    }

    /// Value for a key; null and nested values read as absent
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).and_then(scalar_to_string)
    }

    /// Value for a key, empty string when absent
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Non-negative count for a key; absent or empty reads as zero
    pub fn get_count(&self, key: &str) -> Result<u32> {
        let raw = self.get_or_empty(key);
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<u32>().map_err(|e| {
            ResolverError::config(format!("Invalid count for {}: {:?} ({})", key, raw, e))
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Shared `flock` released on drop
struct SharedLock<'a> {
    file: &'a File,
}

impl<'a> SharedLock<'a> {
    fn acquire(file: &'a File) -> Result<Self> {
        // SAFETY: the descriptor is owned by `file`, which outlives the lock.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_SH) };
        if rc != 0 {
            return Err(ResolverError::Io(std::io::Error::last_os_error()));
        }
        Ok(Self { file })
    }
}

impl Drop for SharedLock<'_> {
    fn drop(&mut self) {
        // SAFETY: see `acquire`.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = KeyValueFile::load(dir.path().join("absent.yml")).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.get_or_empty("comp_vc"), "");
    }

    #[test]
    fn test_scalars_are_stringified() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
comp_vc: vc01.lab.local
compute_az: 3
mgmt_vc_password: 12345
enabled: true
empty:
nested:
  a: b
"#
        )
        .unwrap();

        let doc = KeyValueFile::load(file.path())?;
        assert_eq!(doc.get("comp_vc").as_deref(), Some("vc01.lab.local"));
        assert_eq!(doc.get("mgmt_vc_password").as_deref(), Some("12345"));
        assert_eq!(doc.get("enabled").as_deref(), Some("true"));
        assert_eq!(doc.get("empty"), None);
        assert_eq!(doc.get("nested"), None);
        assert!(doc.contains_key("nested"));
        assert_eq!(doc.get_count("compute_az")?, 3);
        Ok(())
    }

    #[test]
    fn test_counts() {
        let doc = KeyValueFile::parse("good: '2'\nbad: two\n").unwrap();
        assert_eq!(doc.get_count("good").unwrap(), 2);
        assert_eq!(doc.get_count("missing").unwrap(), 0);
        assert!(doc.get_count("bad").is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(KeyValueFile::parse("").unwrap().is_empty());
        assert!(KeyValueFile::parse("~\n").unwrap().is_empty());
        assert!(KeyValueFile::parse("- a\n- b\n").is_err());
    }
}
