//! Static descriptors of pluggable types.
//!
//! A unit announces each tool type it ships with a [`ToolDescriptor`]: the
//! type's name, the capability it implements, a factory, and one or more
//! [`ToolMarker`]s saying under which (variant, language, version) it should
//! be registered.
//!
//! # Examples
//!
//! ```
//! use ndk_modules::{
//!     Capability, LinkInfo, LinkReference, LinkerInfo, ModuleTool, ToolDescriptor, ToolError,
//!     ToolMarker,
//! };
//!
//! #[derive(Default)]
//! struct SystemLinker;
//!
//! impl ModuleTool for SystemLinker {
//!     fn name(&self) -> &str { "system" }
//! }
//!
//! impl LinkerInfo for SystemLinker {
//!     fn variant(&self) -> &str { "system" }
//!     fn parse_reference(&self, r: &LinkReference) -> Result<LinkInfo, ToolError> {
//!         Ok(LinkInfo { kind: "system".into(), value: r.kind.clone() })
//!     }
//! }
//!
//! let descriptor = ToolDescriptor::linker::<SystemLinker>()
//!     .marker(ToolMarker::linker("system", "0.1.0"));
//! assert_eq!(descriptor.base, Capability::Linker);
//! assert_eq!(descriptor.markers[0].variant, "system");
//! assert!(descriptor.construct().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::ToolError;
use crate::tool::{
    Capability, CompilerInfo, LanguageInfo, LinkerInfo, ModuleTool, OutputInfo, Subsystem,
    Template, ToolInstance,
};

/// Kind of registration marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    LanguageInfo,
    CompilerInfo,
    LinkerInfo,
    OutputInfo,
    Subsystem,
    Template,
    /// A marker defined outside this crate; it requires no capability.
    Custom(&'static str),
}

impl MarkerKind {
    /// Capability a type must implement to carry this marker.
    pub fn required_base(self) -> Option<Capability> {
        match self {
            Self::LanguageInfo => Some(Capability::Language),
            Self::CompilerInfo => Some(Capability::Compiler),
            Self::LinkerInfo => Some(Capability::Linker),
            Self::OutputInfo => Some(Capability::Output),
            Self::Subsystem => Some(Capability::Subsystem),
            Self::Template => Some(Capability::Template),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LanguageInfo => "language-info",
            Self::CompilerInfo => "compiler-info",
            Self::LinkerInfo => "linker-info",
            Self::OutputInfo => "output-info",
            Self::Subsystem => "subsystem",
            Self::Template => "template",
            Self::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// One registration request attached to a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMarker {
    /// Marker kind.
    pub kind: MarkerKind,
    /// Variant key (a language version, a subsystem name, a template id).
    pub variant: String,
    /// Language key; empty for language-neutral tools.
    pub language: String,
    /// Version of the host the tool was built against.
    pub version: String,
}

impl ToolMarker {
    /// Creates a marker from its parts.
    pub fn new(
        kind: MarkerKind,
        variant: impl Into<String>,
        language: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            variant: variant.into(),
            language: language.into(),
            version: version.into(),
        }
    }

    /// Language description: keyed by language version within `language`.
    pub fn language_info(language: &str, language_version: &str, version: &str) -> Self {
        Self::new(MarkerKind::LanguageInfo, language_version, language, version)
    }

    /// Compiler for `variant` of `language`.
    pub fn compiler(variant: &str, language: &str, version: &str) -> Self {
        Self::new(MarkerKind::CompilerInfo, variant, language, version)
    }

    /// Language-neutral linker variant.
    pub fn linker(variant: &str, version: &str) -> Self {
        Self::new(MarkerKind::LinkerInfo, variant, "", version)
    }

    /// Language-neutral output variant.
    pub fn output(variant: &str, version: &str) -> Self {
        Self::new(MarkerKind::OutputInfo, variant, "", version)
    }

    /// Subsystem reachable as `name` from the hub.
    pub fn subsystem(name: &str, version: &str) -> Self {
        Self::new(MarkerKind::Subsystem, name, "", version)
    }

    /// Template `identifier` for `language`.
    pub fn template(language: &str, identifier: &str, version: &str) -> Self {
        Self::new(MarkerKind::Template, identifier, language, version)
    }
}

/// Constructor of a registered tool.
pub type ToolFactory = fn() -> Result<ToolInstance, ToolError>;

/// Static description of one pluggable type.
#[derive(Clone)]
pub struct ToolDescriptor {
    /// Name of the implementing type.
    pub type_name: &'static str,
    /// Capability the type implements.
    pub base: Capability,
    /// Registration markers, in declaration order.
    pub markers: Vec<ToolMarker>,
    /// Builds a new instance.
    pub factory: ToolFactory,
}

impl ToolDescriptor {
    /// Descriptor with an explicit, possibly fallible, factory.
    pub fn with_factory(type_name: &'static str, base: Capability, factory: ToolFactory) -> Self {
        Self {
            type_name,
            base,
            markers: Vec::new(),
            factory,
        }
    }

    /// Language description constructed with `Default`.
    pub fn language<T: LanguageInfo + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Language, || {
            Ok(ToolInstance::Language(Arc::new(T::default())))
        })
    }

    /// Compiler constructed with `Default`.
    pub fn compiler<T: CompilerInfo + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Compiler, || {
            Ok(ToolInstance::Compiler(Arc::new(T::default())))
        })
    }

    /// Linker constructed with `Default`.
    pub fn linker<T: LinkerInfo + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Linker, || {
            Ok(ToolInstance::Linker(Arc::new(T::default())))
        })
    }

    /// Output description constructed with `Default`.
    pub fn output<T: OutputInfo + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Output, || {
            Ok(ToolInstance::Output(Arc::new(T::default())))
        })
    }

    /// Subsystem constructed with `Default`.
    pub fn subsystem<T: Subsystem + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Subsystem, || {
            Ok(ToolInstance::Subsystem(Arc::new(T::default())))
        })
    }

    /// Template constructed with `Default`.
    pub fn template<T: Template + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Template, || {
            Ok(ToolInstance::Template(Arc::new(T::default())))
        })
    }

    /// Tool with no specific capability, constructed with `Default`.
    pub fn other<T: ModuleTool + Default>() -> Self {
        Self::with_factory(std::any::type_name::<T>(), Capability::Any, || {
            Ok(ToolInstance::Other(Arc::new(T::default())))
        })
    }

    /// Adds a marker.
    pub fn marker(mut self, marker: ToolMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Runs the factory.
    ///
    /// # Errors
    ///
    /// Propagates the factory's [`ToolError`].
    pub fn construct(&self) -> Result<ToolInstance, ToolError> {
        (self.factory)()
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("type_name", &self.type_name)
            .field("base", &self.base)
            .field("markers", &self.markers)
            .finish()
    }
}
