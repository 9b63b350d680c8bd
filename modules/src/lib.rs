//! Versioned extension registry for the development kit.
//!
//! Tools (language descriptions, compilers, linkers, outputs, subsystems,
//! templates) live in independently built units. Each unit lists
//! [`ToolDescriptor`]s; the [`ModuleRegistry`] scans units, admits the
//! markers compatible with the host version, and hands out shared tool
//! instances by (capability, variant, language).
//!
//! # Quick start
//!
//! ```
//! use ndk_modules::{HostConfig, ModuleRegistry, builtin};
//!
//! let registry = ModuleRegistry::builder()
//!     .unit(builtin::SHARED_UNIT)
//!     .config(HostConfig::default())
//!     .build();
//!
//! let tools = registry.tools();
//! let linker = tools.linker("standardlib").unwrap().expect("built in");
//! assert_eq!(linker.variant(), "standardlib");
//!
//! let catalog = registry.catalog();
//! println!("{}", catalog.to_table());
//! ```

pub mod builtin;
mod catalog;
mod config;
mod descriptor;
mod error;
mod project;
mod registry;
mod resolver;
mod tool;
mod unit;
mod version;

pub use catalog::{CatalogEntry, RegistryCatalog};
pub use config::{HostConfig, UnitFilter};
pub use descriptor::{MarkerKind, ToolDescriptor, ToolFactory, ToolMarker};
pub use error::{RegistryError, Result, ToolError};
pub use project::{PROJECT_EXTENSION, Project, ProjectFile, is_project_file};
pub use registry::{ModuleRegistry, Registration, RegistryBuilder, ScanSummary};
pub use resolver::ToolResolver;
pub use tool::{
    Capability, CapabilityKind, CompilerInfo, Invocation, InvokeContext, LanguageInfo, LinkInfo,
    LinkReference, LinkerInfo, ModuleTool, OutputInfo, Subsystem, Template, ToolInstance,
};
pub use unit::{ModuleUnit, StaticUnit, UnitRegistrar};
pub use version::{
    HOST_VERSION, LanguageVersion, compare_language_versions, compare_languages, host_version,
    is_compatible, parse_version,
};
