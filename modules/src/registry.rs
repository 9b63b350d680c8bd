//! The extension registry.
//!
//! [`ModuleRegistry`] scans units, keeps one live registration per
//! (variant, language, marker kind) key, and hands out lazily constructed,
//! memoized tool instances. [`RegistryBuilder`] assembles the unit list and
//! applies host configuration before the scan.
//!
//! # Admission rules
//!
//! For every marker on every descriptor of every unit, in order:
//!
//! 1. The descriptor's capability must match what the marker requires.
//! 2. The marker version must parse and share the host's major.minor.
//! 3. A registration with the same key is replaced only by a strictly higher
//!    version; the replacement moves to the end of the registration order.
//!
//! Rejections are logged and counted in the [`ScanSummary`]; they never abort
//! the scan.
//!
//! # Examples
//!
//! ```
//! use ndk_modules::{ModuleRegistry, builtin};
//!
//! let mut registry = ModuleRegistry::new();
//! let summary = registry.scan(&[&builtin::SHARED_UNIT]);
//! assert_eq!(summary.accepted, 1);
//! assert!(registry.tools().linker("standardlib").unwrap().is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use semver::Version;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::RegistryCatalog;
use crate::config::HostConfig;
use crate::descriptor::{MarkerKind, ToolDescriptor, ToolFactory, ToolMarker};
use crate::error::{RegistryError, Result};
use crate::resolver::ToolResolver;
use crate::tool::{Capability, CapabilityKind, ToolInstance};
use crate::unit::ModuleUnit;
use crate::version::{host_version, is_compatible, parse_version};

/// A live registration.
#[derive(Clone)]
pub struct Registration {
    id: u64,
    /// Marker kind it was registered under.
    pub marker: MarkerKind,
    /// Variant key.
    pub variant: String,
    /// Language key.
    pub language: String,
    /// Marker version.
    pub version: Version,
    /// Capability lookups match against.
    pub base: Capability,
    /// Implementing type.
    pub type_name: &'static str,
    /// Unit that provided it.
    pub unit: String,
    factory: ToolFactory,
}

impl Registration {
    fn same_key(&self, marker: &ToolMarker) -> bool {
        self.marker == marker.kind && self.variant == marker.variant && self.language == marker.language
    }

    fn matches(&self, capability: Capability, variant: &str, language: &str) -> bool {
        self.variant == variant && self.language == language && self.base.satisfies(capability)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("marker", &self.marker)
            .field("variant", &self.variant)
            .field("language", &self.language)
            .field("version", &self.version.to_string())
            .field("base", &self.base)
            .field("type_name", &self.type_name)
            .field("unit", &self.unit)
            .finish()
    }
}

/// Counts from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Units that loaded.
    pub units: usize,
    /// Units that failed to load, by name.
    pub failed_units: Vec<String>,
    /// New keys registered.
    pub accepted: usize,
    /// Existing registrations replaced by a higher version.
    pub replaced: usize,
    /// Markers dropped because an equal or higher version was present.
    pub superseded: usize,
    /// Markers outside the host's major.minor.
    pub incompatible: usize,
    /// Markers on a type lacking the required capability.
    pub mismatched: usize,
    /// Markers whose version did not parse.
    pub invalid_versions: usize,
}

/// Registry of tools discovered in units.
pub struct ModuleRegistry {
    host: Version,
    registrations: Vec<Registration>,
    next_id: u64,
    instances: Mutex<HashMap<u64, ToolInstance>>,
}

impl ModuleRegistry {
    /// Empty registry for [`HOST_VERSION`](crate::HOST_VERSION).
    pub fn new() -> Self {
        Self::with_host(host_version())
    }

    /// Empty registry gating on `host`.
    pub fn with_host(host: Version) -> Self {
        Self {
            host,
            registrations: Vec::new(),
            next_id: 0,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Host version used by the compatibility gate.
    pub fn host_version(&self) -> &Version {
        &self.host
    }

    /// Loads every unit and admits its markers. Registrations accumulate
    /// across calls.
    pub fn scan(&mut self, units: &[&dyn ModuleUnit]) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for unit in units {
            let descriptors = match unit.load() {
                Ok(descriptors) => descriptors,
                Err(err) => {
                    warn!(unit = unit.name(), error = %err, "skipping unit");
                    summary.failed_units.push(unit.name().to_string());
                    continue;
                }
            };
            summary.units += 1;
            for descriptor in &descriptors {
                for marker in &descriptor.markers {
                    self.admit(unit.name(), descriptor, marker, &mut summary);
                }
            }
        }
        info!(
            units = summary.units,
            failed = summary.failed_units.len(),
            registrations = self.registrations.len(),
            "module scan complete"
        );
        summary
    }

    fn admit(
        &mut self,
        unit: &str,
        descriptor: &ToolDescriptor,
        marker: &ToolMarker,
        summary: &mut ScanSummary,
    ) {
        let base = match marker.kind.required_base() {
            Some(required) if required != descriptor.base => {
                warn!(
                    type_name = descriptor.type_name,
                    marker = %marker.kind,
                    required = %required,
                    actual = %descriptor.base,
                    "marker requires a different capability"
                );
                summary.mismatched += 1;
                return;
            }
            Some(required) => required,
            None => Capability::Any,
        };

        let version = match parse_version(&marker.version) {
            Ok(version) => version,
            Err(err) => {
                warn!(type_name = descriptor.type_name, error = %err, "skipping marker");
                summary.invalid_versions += 1;
                return;
            }
        };
        if !is_compatible(&self.host, &version) {
            debug!(
                type_name = descriptor.type_name,
                version = %version,
                host = %self.host,
                "incompatible with host"
            );
            summary.incompatible += 1;
            return;
        }

        if let Some(index) = self.registrations.iter().position(|r| r.same_key(marker)) {
            if version <= self.registrations[index].version {
                debug!(
                    variant = %marker.variant,
                    language = %marker.language,
                    version = %version,
                    "superseded by an existing registration"
                );
                summary.superseded += 1;
                return;
            }
            let old = self.registrations.remove(index);
            self.instances
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&old.id);
            debug!(
                variant = %marker.variant,
                language = %marker.language,
                from = %old.version,
                to = %version,
                "replacing registration"
            );
            summary.replaced += 1;
        } else {
            summary.accepted += 1;
        }

        self.next_id += 1;
        self.registrations.push(Registration {
            id: self.next_id,
            marker: marker.kind,
            variant: marker.variant.clone(),
            language: marker.language.clone(),
            version,
            base,
            type_name: descriptor.type_name,
            unit: unit.to_string(),
            factory: descriptor.factory,
        });
    }

    /// Live registrations in registration order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// The shared instance for `registration`, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Construction`] when the factory fails, or
    /// [`RegistryError::CapabilityMismatch`] when it builds the wrong kind of
    /// tool.
    pub fn instance(&self, registration: &Registration) -> Result<ToolInstance> {
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(&registration.id) {
            return Ok(instance.clone());
        }

        let instance = (registration.factory)().map_err(|source| RegistryError::Construction {
            type_name: registration.type_name,
            source,
        })?;
        if registration.base != Capability::Any && instance.capability() != registration.base {
            return Err(RegistryError::CapabilityMismatch {
                type_name: registration.type_name,
                expected: registration.base,
                actual: instance.capability(),
            });
        }
        instances.insert(registration.id, instance.clone());
        Ok(instance)
    }

    /// First tool registered under (`variant`, `language`) providing
    /// `capability`.
    ///
    /// # Errors
    ///
    /// Propagates construction failures; a miss is `Ok(None)`.
    pub fn lookup_instance(
        &self,
        capability: Capability,
        variant: &str,
        language: &str,
    ) -> Result<Option<ToolInstance>> {
        self.registrations
            .iter()
            .find(|r| r.matches(capability, variant, language))
            .map(|r| self.instance(r))
            .transpose()
    }

    /// Typed form of [`lookup_instance`](Self::lookup_instance).
    ///
    /// # Errors
    ///
    /// Propagates construction failures; a miss is `Ok(None)`.
    pub fn lookup<T: CapabilityKind + ?Sized>(
        &self,
        variant: &str,
        language: &str,
    ) -> Result<Option<Arc<T>>> {
        self.lookup_instance(T::CAPABILITY, variant, language)?
            .map(|instance| typed::<T>(&instance))
            .transpose()
    }

    /// Every tool providing `capability`, in registration order.
    ///
    /// # Errors
    ///
    /// Fails on the first tool that cannot be constructed.
    pub fn lookup_all_instances(&self, capability: Capability) -> Result<Vec<ToolInstance>> {
        self.registrations
            .iter()
            .filter(|r| r.base.satisfies(capability))
            .map(|r| self.instance(r))
            .collect()
    }

    /// Typed form of [`lookup_all_instances`](Self::lookup_all_instances).
    ///
    /// # Errors
    ///
    /// Fails on the first tool that cannot be constructed.
    pub fn lookup_all<T: CapabilityKind + ?Sized>(&self) -> Result<Vec<Arc<T>>> {
        self.lookup_all_instances(T::CAPABILITY)?
            .iter()
            .map(typed::<T>)
            .collect()
    }

    /// Capability-specific lookups.
    pub fn tools(&self) -> ToolResolver<'_> {
        ToolResolver::new(self)
    }

    /// Serializable snapshot of the live registrations.
    pub fn catalog(&self) -> RegistryCatalog {
        RegistryCatalog::from_registry(self)
    }
}

fn typed<T: CapabilityKind + ?Sized>(instance: &ToolInstance) -> Result<Arc<T>> {
    T::extract(instance).ok_or_else(|| RegistryError::CapabilityMismatch {
        type_name: std::any::type_name::<T>(),
        expected: T::CAPABILITY,
        actual: instance.capability(),
    })
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("host", &self.host.to_string())
            .field("registrations", &self.registrations)
            .finish()
    }
}

/// Builder that collects units and scans them once.
///
/// # Example
///
/// ```
/// use ndk_modules::{HostConfig, ModuleRegistry, builtin};
///
/// let mut config = HostConfig::default();
/// config.units.exclude.push("ndk.shared".into());
///
/// let registry = ModuleRegistry::builder()
///     .unit(builtin::SHARED_UNIT)
///     .config(config)
///     .build();
/// assert!(registry.is_empty());
/// ```
pub struct RegistryBuilder {
    host: Option<Version>,
    units: Vec<Box<dyn ModuleUnit>>,
    config: HostConfig,
}

impl RegistryBuilder {
    /// Creates a builder with no units and default configuration.
    pub fn new() -> Self {
        Self {
            host: None,
            units: Vec::new(),
            config: HostConfig::default(),
        }
    }

    /// Overrides the host version.
    pub fn host(mut self, host: Version) -> Self {
        self.host = Some(host);
        self
    }

    /// Adds a unit.
    pub fn unit(mut self, unit: impl ModuleUnit + 'static) -> Self {
        self.units.push(Box::new(unit));
        self
    }

    /// Adds several units.
    pub fn units<U: ModuleUnit + 'static>(mut self, units: impl IntoIterator<Item = U>) -> Self {
        for unit in units {
            self.units.push(Box::new(unit));
        }
        self
    }

    /// Applies host configuration (unit allow/exclude lists).
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Scans the allowed units and returns the registry with the scan counts.
    pub fn build_with_summary(self) -> (ModuleRegistry, ScanSummary) {
        let mut registry = match self.host {
            Some(host) => ModuleRegistry::with_host(host),
            None => ModuleRegistry::new(),
        };
        let allowed: Vec<&dyn ModuleUnit> = self
            .units
            .iter()
            .map(|unit| unit.as_ref())
            .filter(|unit| {
                let allowed = self.config.is_unit_allowed(unit.name());
                if !allowed {
                    debug!(unit = unit.name(), "unit disabled by configuration");
                }
                allowed
            })
            .collect();

        let summary = registry.scan(&allowed);
        (registry, summary)
    }

    /// Scans the allowed units and returns the registry.
    pub fn build(self) -> ModuleRegistry {
        self.build_with_summary().0
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
