//! Tools every host ships with.

use crate::HOST_VERSION;
use crate::descriptor::{ToolDescriptor, ToolMarker};
use crate::error::ToolError;
use crate::tool::{LinkInfo, LinkReference, LinkerInfo, ModuleTool};
use crate::unit::{StaticUnit, UnitRegistrar};

/// Linker variant name of [`StandardLibraryLinker`].
pub const STANDARD_LIBRARY: &str = "standardlib";

/// Resolves references to a language's standard library by name.
///
/// A reference must carry a non-empty `Name` field:
///
/// ```
/// use ndk_modules::{LinkReference, LinkerInfo, builtin::StandardLibraryLinker};
///
/// let reference = LinkReference::new("standardlib").with_field("Name", "System.Core");
/// let info = StandardLibraryLinker.parse_reference(&reference).unwrap();
/// assert_eq!(info.to_string(), "standardlib => System.Core");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLibraryLinker;

impl ModuleTool for StandardLibraryLinker {
    fn name(&self) -> &str {
        STANDARD_LIBRARY
    }
}

impl LinkerInfo for StandardLibraryLinker {
    fn variant(&self) -> &str {
        STANDARD_LIBRARY
    }

    fn parse_reference(&self, reference: &LinkReference) -> Result<LinkInfo, ToolError> {
        match reference.fields.get("Name").map(|name| name.trim()) {
            Some(name) if !name.is_empty() => Ok(LinkInfo {
                kind: STANDARD_LIBRARY.to_string(),
                value: name.to_string(),
            }),
            _ => Err(ToolError::InvalidReference(format!(
                "{STANDARD_LIBRARY} reference requires a non-empty 'Name'"
            ))),
        }
    }
}

/// Registration function of [`SHARED_UNIT`].
pub fn register(unit: &mut UnitRegistrar) {
    unit.register(
        ToolDescriptor::linker::<StandardLibraryLinker>()
            .marker(ToolMarker::linker(STANDARD_LIBRARY, HOST_VERSION)),
    );
}

/// Unit holding the shared tools.
pub const SHARED_UNIT: StaticUnit = StaticUnit::new("ndk.shared", register);
