//! Capability traits implemented by pluggable tools.
//!
//! Every tool implements [`ModuleTool`] plus exactly one capability trait.
//! The registry hands tools out as [`ToolInstance`], an enum holding one
//! shared pointer per capability; typed lookups go through
//! [`CapabilityKind`], implemented for each capability's trait object.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ToolError;
use crate::resolver::ToolResolver;

/// Common surface of every pluggable tool.
pub trait ModuleTool: Send + Sync + 'static {
    /// Stable identifying name (a variant, a subsystem name, a template id).
    fn name(&self) -> &str;

    /// Language the tool belongs to; empty for language-neutral tools.
    fn language(&self) -> &str {
        ""
    }
}

/// Capability a registration provides. `Any` is the lookup wildcard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
    Any,
    Language,
    Compiler,
    Linker,
    Output,
    Subsystem,
    Template,
}

impl Capability {
    /// `true` when a registration of capability `self` satisfies a request
    /// for `requested`.
    pub fn satisfies(self, requested: Capability) -> bool {
        requested == Capability::Any || self == requested
    }
}

/// Description of a programming language.
pub trait LanguageInfo: ModuleTool {
    /// Short identifier (`csharp`).
    fn identifier(&self) -> &str;

    /// Display name (`C#`).
    fn full_name(&self) -> &str;

    /// Language version label (`c#12`).
    fn language_version(&self) -> &str;

    /// Alternative names accepted on the command line.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Source file extensions, with the leading dot.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// `true` when `name` is the identifier or an alias, ignoring case.
    fn answers_to(&self, name: &str) -> bool {
        self.identifier().eq_ignore_ascii_case(name)
            || self.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Compiler settings for one language variant.
pub trait CompilerInfo: ModuleTool {
    /// Compiler variant name.
    fn variant(&self) -> &str;

    /// Display properties as name/value pairs.
    fn properties(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// A link reference as written in a project: a type plus named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReference {
    /// Linker variant handling the reference.
    #[serde(rename = "type")]
    pub kind: String,
    /// Named values.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl LinkReference {
    /// Creates a reference of `kind` with no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A parsed link reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Linker variant that produced it.
    pub kind: String,
    /// Formatted value.
    pub value: String,
}

impl fmt::Display for LinkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.kind, self.value)
    }
}

/// Resolves link references of one variant.
pub trait LinkerInfo: ModuleTool {
    /// Linker variant name.
    fn variant(&self) -> &str;

    /// Parses a reference.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidReference`] when required fields are
    /// missing or empty.
    fn parse_reference(&self, reference: &LinkReference) -> Result<LinkInfo, ToolError>;
}

/// Output settings for one project output variant.
pub trait OutputInfo: ModuleTool {
    /// Output variant name.
    fn variant(&self) -> &str;

    /// Display properties as name/value pairs.
    fn properties(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// How a subsystem run ended, when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The requested work was done.
    Completed,
    /// Help text was printed instead.
    Usage,
    /// The arguments had problems, which were printed.
    Rejected,
}

/// What a subsystem receives from the host when invoked.
pub struct InvokeContext<'a> {
    /// Access to every registered tool.
    pub tools: ToolResolver<'a>,
    /// Directory relative paths resolve against.
    pub working_dir: PathBuf,
    /// Where user-facing text goes.
    pub out: &'a mut dyn Write,
}

/// A named command the hub dispatches to.
pub trait Subsystem: ModuleTool {
    /// One-line description for listings.
    fn description(&self) -> &str;

    /// Longer description for detailed help.
    fn detailed_description(&self) -> &str {
        self.description()
    }

    /// Runs the subsystem with its own argument tokens.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] when the work cannot be completed.
    fn invoke(&self, cx: &mut InvokeContext<'_>, args: &[String]) -> Result<Invocation, ToolError>;
}

/// A project template.
pub trait Template: ModuleTool {
    /// Short identifier (`console`).
    fn identifier(&self) -> &str;

    /// Display name.
    fn title(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Writes a new project named `project_name` into `target`. Returns the
    /// created paths.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] when files cannot be written.
    fn instantiate(&self, target: &Path, project_name: &str) -> Result<Vec<PathBuf>, ToolError>;
}

/// A constructed tool.
#[derive(Clone)]
pub enum ToolInstance {
    Language(Arc<dyn LanguageInfo>),
    Compiler(Arc<dyn CompilerInfo>),
    Linker(Arc<dyn LinkerInfo>),
    Output(Arc<dyn OutputInfo>),
    Subsystem(Arc<dyn Subsystem>),
    Template(Arc<dyn Template>),
    /// A tool registered under a marker with no required capability.
    Other(Arc<dyn ModuleTool>),
}

impl ToolInstance {
    /// Capability of the contained tool; [`Capability::Any`] for `Other`.
    pub fn capability(&self) -> Capability {
        match self {
            Self::Language(_) => Capability::Language,
            Self::Compiler(_) => Capability::Compiler,
            Self::Linker(_) => Capability::Linker,
            Self::Output(_) => Capability::Output,
            Self::Subsystem(_) => Capability::Subsystem,
            Self::Template(_) => Capability::Template,
            Self::Other(_) => Capability::Any,
        }
    }

    /// [`ModuleTool::name`] of the contained tool.
    pub fn name(&self) -> &str {
        match self {
            Self::Language(tool) => tool.name(),
            Self::Compiler(tool) => tool.name(),
            Self::Linker(tool) => tool.name(),
            Self::Output(tool) => tool.name(),
            Self::Subsystem(tool) => tool.name(),
            Self::Template(tool) => tool.name(),
            Self::Other(tool) => tool.name(),
        }
    }

    /// [`ModuleTool::language`] of the contained tool.
    pub fn language(&self) -> &str {
        match self {
            Self::Language(tool) => tool.language(),
            Self::Compiler(tool) => tool.language(),
            Self::Linker(tool) => tool.language(),
            Self::Output(tool) => tool.language(),
            Self::Subsystem(tool) => tool.language(),
            Self::Template(tool) => tool.language(),
            Self::Other(tool) => tool.language(),
        }
    }

    /// `true` when both values share the same underlying tool.
    pub fn same_tool(&self, other: &ToolInstance) -> bool {
        match (self, other) {
            (Self::Language(a), Self::Language(b)) => Arc::ptr_eq(a, b),
            (Self::Compiler(a), Self::Compiler(b)) => Arc::ptr_eq(a, b),
            (Self::Linker(a), Self::Linker(b)) => Arc::ptr_eq(a, b),
            (Self::Output(a), Self::Output(b)) => Arc::ptr_eq(a, b),
            (Self::Subsystem(a), Self::Subsystem(b)) => Arc::ptr_eq(a, b),
            (Self::Template(a), Self::Template(b)) => Arc::ptr_eq(a, b),
            (Self::Other(a), Self::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ToolInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolInstance")
            .field("capability", &self.capability())
            .field("name", &self.name())
            .field("language", &self.language())
            .finish()
    }
}

/// Links a capability trait object to its [`Capability`] and
/// [`ToolInstance`] variant.
pub trait CapabilityKind: 'static {
    /// Capability this trait provides.
    const CAPABILITY: Capability;

    /// Extracts the typed tool, if `instance` holds this capability.
    fn extract(instance: &ToolInstance) -> Option<Arc<Self>>;
}

macro_rules! capability_kind {
    ($($tool:ident => $variant:ident),+ $(,)?) => {$(
        impl CapabilityKind for dyn $tool {
            const CAPABILITY: Capability = Capability::$variant;

            fn extract(instance: &ToolInstance) -> Option<Arc<Self>> {
                match instance {
                    ToolInstance::$variant(tool) => Some(Arc::clone(tool)),
                    _ => None,
                }
            }
        }
    )+};
}

capability_kind!(
    LanguageInfo => Language,
    CompilerInfo => Compiler,
    LinkerInfo => Linker,
    OutputInfo => Output,
    Subsystem => Subsystem,
    Template => Template,
);
