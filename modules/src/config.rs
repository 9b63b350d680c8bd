//! Host configuration.
//!
//! Controls which units the host loads and the default log level.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! units:
//!   allow: []
//!   exclude:
//!     - ndk.view
//! log: info
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_version() -> String {
    "1.0".to_string()
}

/// Unit allow and exclude lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFilter {
    /// Units to load (empty = every unit).
    #[serde(default)]
    pub allow: Vec<String>,
    /// Units to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Top-level host configuration.
///
/// Loaded from a YAML file (`ndk.yml` in the working directory, or the path
/// in `NDK_CONFIG`). Every field is optional.
///
/// # Examples
///
/// ```no_run
/// use ndk_modules::HostConfig;
///
/// let config = HostConfig::load("ndk.yml").unwrap();
/// if config.is_unit_allowed("ndk.start") {
///     println!("start is enabled");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Configuration format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Unit selection.
    #[serde(default)]
    pub units: UnitFilter,
    /// Log filter used when `NDK_LOG` is unset (`warn`, `info`, `ndk_modules=debug`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            units: UnitFilter::default(),
            log: None,
        }
    }
}

impl HostConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::RegistryError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::RegistryError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `unit` is in the exclusion list.
    pub fn is_unit_excluded(&self, unit: &str) -> bool {
        self.units.exclude.iter().any(|u| u == unit)
    }

    /// Returns `true` if `unit` should be loaded.
    ///
    /// An empty allow list allows every unit. Exclusions always win.
    ///
    /// # Examples
    ///
    /// ```
    /// # let yaml = "units: { allow: [ndk.start, ndk.view], exclude: [ndk.view] }";
    /// # let config: ndk_modules::HostConfig = serde_yaml::from_str(yaml).unwrap();
    /// assert!(config.is_unit_allowed("ndk.start"));
    /// assert!(!config.is_unit_allowed("ndk.view"));
    /// assert!(!config.is_unit_allowed("ndk.shared"));
    /// ```
    pub fn is_unit_allowed(&self, unit: &str) -> bool {
        if self.is_unit_excluded(unit) {
            return false;
        }
        self.units.allow.is_empty() || self.units.allow.iter().any(|u| u == unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
units:
  allow:
    - ndk.shared
    - ndk.start
  exclude:
    - ndk.start
log: debug
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: HostConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.units.allow, vec!["ndk.shared", "ndk.start"]);
        assert_eq!(config.units.exclude, vec!["ndk.start"]);
        assert_eq!(config.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_deserialize_empty_document() {
        let config: HostConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_exclusion_beats_allow_list() {
        let config: HostConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert!(config.is_unit_excluded("ndk.start"));
        assert!(!config.is_unit_allowed("ndk.start"));
        assert!(config.is_unit_allowed("ndk.shared"));
        assert!(!config.is_unit_allowed("ndk.view"));
    }

    #[test]
    fn test_empty_allow_list_allows_all() {
        let config = HostConfig::default();
        assert!(config.is_unit_allowed("anything"));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndk.yml");

        let original: HostConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = HostConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, crate::RegistryError::IoError(_)));
    }
}
