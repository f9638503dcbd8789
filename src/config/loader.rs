// file: src/config/loader.rs
// version: 1.0.0
// guid: 87097678-7dc2-4151-b311-3e7572c6bbe1

//! Settings file loading and environment variable substitution

use super::Settings;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Settings loader with environment variable substitution
pub struct SettingsLoader {
    env_vars: HashMap<String, String>,
}

impl SettingsLoader {
    /// Create a new settings loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load resolver settings from a YAML file
    pub fn load_settings<P: AsRef<Path>>(&self, path: P) -> Result<Settings> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::ResolverError::config(format!(
                "Failed to read settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        self.parse_settings(&content)
    }

    /// Parse resolver settings from YAML text
    pub fn parse_settings(&self, content: &str) -> Result<Settings> {
        let expanded = self.expand_env_vars(content)?;
        if expanded.trim().is_empty() {
            return Ok(Settings::default());
        }

        let mut settings: Settings = serde_yaml::from_str(&expanded)?;
        settings.expand_paths()?;
        Ok(settings)
    }

    /// Expand environment variables in settings content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::ResolverError::config(format!("Invalid regex pattern: {}", e))
        })?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(crate::error::ResolverError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
