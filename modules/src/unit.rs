//! Units: independently built bundles of tools.
//!
//! A unit is anything that can list its [`ToolDescriptor`]s. The usual unit
//! is a [`StaticUnit`], a crate exporting a registration function that the
//! host links in. Loading is best-effort: a unit that fails, or whose
//! registration function panics, is reported and skipped by the registry.

use std::panic::{self, AssertUnwindSafe};

use crate::descriptor::ToolDescriptor;
use crate::error::{RegistryError, Result};

/// A source of tool descriptors.
pub trait ModuleUnit: Send + Sync {
    /// Name used in logs, catalogs, and host configuration.
    fn name(&self) -> &str;

    /// Produces the unit's descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnitLoad`] when the unit cannot be read.
    fn load(&self) -> Result<Vec<ToolDescriptor>>;
}

/// Collects descriptors from a registration function.
#[derive(Debug, Default)]
pub struct UnitRegistrar {
    descriptors: Vec<ToolDescriptor>,
}

impl UnitRegistrar {
    /// Adds a descriptor.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Descriptors collected so far.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Consumes the registrar.
    pub fn into_descriptors(self) -> Vec<ToolDescriptor> {
        self.descriptors
    }
}

/// A unit compiled into the host, exposing a fixed registration function.
///
/// # Examples
///
/// ```
/// use ndk_modules::{ModuleUnit, StaticUnit, UnitRegistrar};
///
/// fn register(_unit: &mut UnitRegistrar) {}
///
/// const EMPTY: StaticUnit = StaticUnit::new("empty", register);
/// assert_eq!(EMPTY.name(), "empty");
/// assert!(EMPTY.load().unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticUnit {
    name: &'static str,
    entry: fn(&mut UnitRegistrar),
}

impl StaticUnit {
    /// Wraps a registration function.
    pub const fn new(name: &'static str, entry: fn(&mut UnitRegistrar)) -> Self {
        Self { name, entry }
    }
}

impl ModuleUnit for StaticUnit {
    fn name(&self) -> &str {
        self.name
    }

    fn load(&self) -> Result<Vec<ToolDescriptor>> {
        let entry = self.entry;
        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut registrar = UnitRegistrar::default();
            entry(&mut registrar);
            registrar.into_descriptors()
        }))
        .map_err(|_| RegistryError::UnitLoad {
            unit: self.name.to_string(),
            reason: "registration function panicked".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Capability;

    fn two_tools(unit: &mut UnitRegistrar) {
        unit.register(ToolDescriptor::with_factory(
            "A",
            Capability::Any,
            || Err(crate::ToolError::Construction("unused".into())),
        ))
        .register(ToolDescriptor::with_factory(
            "B",
            Capability::Any,
            || Err(crate::ToolError::Construction("unused".into())),
        ));
    }

    fn panicking(_unit: &mut UnitRegistrar) {
        panic!("corrupt unit");
    }

    #[test]
    fn test_static_unit_collects_in_order() {
        let unit = StaticUnit::new("pair", two_tools);
        let names: Vec<&str> = unit.load().unwrap().iter().map(|d| d.type_name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_panicking_unit_is_load_error() {
        let unit = StaticUnit::new("corrupt", panicking);
        let err = unit.load().unwrap_err();
        assert!(matches!(err, RegistryError::UnitLoad { ref unit, .. } if unit == "corrupt"));
    }
}
