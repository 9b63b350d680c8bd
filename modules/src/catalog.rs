//! Serializable snapshots of a registry.
//!
//! A [`RegistryCatalog`] lists every live registration with the unit that
//! provided it. The catalog carries a SHA-256 fingerprint over the sorted
//! registration keys and versions, so two scans that produced the same
//! registrations produce the same fingerprint regardless of when they ran.
//!
//! # Examples
//!
//! ```
//! use ndk_modules::{ModuleRegistry, builtin};
//!
//! let mut registry = ModuleRegistry::new();
//! registry.scan(&[&builtin::SHARED_UNIT]);
//!
//! let catalog = registry.catalog();
//! assert_eq!(catalog.entries.len(), 1);
//! assert!(catalog.verify());
//! assert!(catalog.to_table().contains("standardlib"));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::registry::ModuleRegistry;
use crate::tool::Capability;

/// One live registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Marker kind (`language-info`, `template`, ...).
    pub marker: String,
    /// Variant key.
    pub variant: String,
    /// Language key; empty for language-neutral tools.
    #[serde(default)]
    pub language: String,
    /// Marker version.
    pub version: String,
    /// Capability the registration provides.
    pub capability: Capability,
    /// Implementing type.
    pub type_name: String,
    /// Unit that provided it.
    pub unit: String,
}

impl CatalogEntry {
    /// Registration key: `marker|variant|language`.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.marker, self.variant, self.language)
    }
}

/// Snapshot of a registry's registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryCatalog {
    /// Host version the registry gated on.
    pub host_version: String,
    /// RFC 3339 timestamp of the snapshot.
    pub generated_at: String,
    /// SHA-256 hex digest of the registrations.
    pub fingerprint: String,
    /// Registrations in registration order.
    pub entries: Vec<CatalogEntry>,
}

impl RegistryCatalog {
    /// Snapshots `registry`.
    pub fn from_registry(registry: &ModuleRegistry) -> Self {
        let entries: Vec<CatalogEntry> = registry
            .registrations()
            .iter()
            .map(|r| CatalogEntry {
                marker: r.marker.to_string(),
                variant: r.variant.clone(),
                language: r.language.clone(),
                version: r.version.to_string(),
                capability: r.base,
                type_name: r.type_name.to_string(),
                unit: r.unit.clone(),
            })
            .collect();
        Self {
            host_version: registry.host_version().to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            fingerprint: fingerprint(&entries),
            entries,
        }
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`JsonError`](crate::RegistryError::JsonError) if the
    /// content is not catalog JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let catalog = serde_json::from_reader(reader)?;
        Ok(catalog)
    }

    /// Saves the catalog as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be written, or [`JsonError`](crate::RegistryError::JsonError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](crate::RegistryError::JsonError) if
    /// serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](crate::RegistryError::YamlError) if
    /// serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Plain-text table, one registration per row.
    pub fn to_table(&self) -> String {
        const HEADERS: [&str; 5] = ["MARKER", "VARIANT", "LANGUAGE", "VERSION", "UNIT"];

        let rows: Vec<[&str; 5]> = self
            .entries
            .iter()
            .map(|e| {
                [
                    e.marker.as_str(),
                    e.variant.as_str(),
                    if e.language.is_empty() { "-" } else { e.language.as_str() },
                    e.version.as_str(),
                    e.unit.as_str(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        for row in std::iter::once(&HEADERS).chain(&rows) {
            let mut line = String::new();
            for (cell, width) in row.iter().zip(widths) {
                let _ = write!(line, "{cell:<width$}  ");
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// `true` when the stored fingerprint matches the entries.
    pub fn verify(&self) -> bool {
        self.fingerprint == fingerprint(&self.entries)
    }

    /// Keys that differ between `self` and `other`: present in only one
    /// catalog, or registered at a different version. Sorted.
    pub fn diff(&self, other: &RegistryCatalog) -> Vec<String> {
        let versions = |catalog: &RegistryCatalog| -> BTreeMap<String, String> {
            catalog
                .entries
                .iter()
                .map(|e| (e.key(), e.version.clone()))
                .collect()
        };
        let ours = versions(self);
        let theirs = versions(other);

        let mut changed: Vec<String> = ours
            .iter()
            .filter(|(key, version)| theirs.get(*key) != Some(*version))
            .map(|(key, _)| key.clone())
            .collect();
        changed.extend(theirs.keys().filter(|key| !ours.contains_key(*key)).cloned());
        changed.sort();
        changed
    }
}

fn fingerprint(entries: &[CatalogEntry]) -> String {
    let mut lines: Vec<String> = entries
        .iter()
        .map(|e| format!("{}|{}|{}", e.key(), e.version, e.type_name))
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
