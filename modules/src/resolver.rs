//! Capability-specific lookups over a [`ModuleRegistry`].
//!
//! Each method maps a domain question ("which template is `console` for
//! `csharp`?") onto the registry's (capability, variant, language) key.
//! Language descriptions are keyed by language version within their
//! identifier, templates by identifier within their language; linkers,
//! outputs, and subsystems carry no language.

use std::sync::Arc;

use crate::error::{RegistryError, Result};
use crate::registry::{ModuleRegistry, Registration};
use crate::tool::{
    Capability, CapabilityKind, CompilerInfo, LanguageInfo, LinkerInfo, OutputInfo, Subsystem, Template,
};
use crate::version::compare_language_versions;

/// Borrowed view of a registry with typed lookups.
#[derive(Debug, Clone, Copy)]
pub struct ToolResolver<'r> {
    registry: &'r ModuleRegistry,
}

impl<'r> ToolResolver<'r> {
    /// Wraps `registry`.
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &'r ModuleRegistry {
        self.registry
    }

    /// Language `identifier` at exactly `language_version`.
    pub fn language(&self, identifier: &str, language_version: &str) -> Result<Option<Arc<dyn LanguageInfo>>> {
        self.registry.lookup::<dyn LanguageInfo>(language_version, identifier)
    }

    /// First registered version of language `identifier`.
    pub fn first_language(&self, identifier: &str) -> Result<Option<Arc<dyn LanguageInfo>>> {
        self.language_registrations(identifier)
            .first()
            .map(|registration| self.typed_language(registration))
            .transpose()
    }

    /// The version of language `identifier` that sorts first: highest suite,
    /// then highest base. Ties keep registration order.
    pub fn highest_language(&self, identifier: &str) -> Result<Option<Arc<dyn LanguageInfo>>> {
        let mut candidates = self.language_registrations(identifier);
        candidates.sort_by(|a, b| compare_language_versions(&a.variant, &b.variant));
        candidates
            .first()
            .map(|registration| self.typed_language(registration))
            .transpose()
    }

    /// Every registered language description.
    pub fn languages(&self) -> Result<Vec<Arc<dyn LanguageInfo>>> {
        self.registry.lookup_all::<dyn LanguageInfo>()
    }

    /// Compiler `variant` for `language`.
    pub fn compiler(&self, variant: &str, language: &str) -> Result<Option<Arc<dyn CompilerInfo>>> {
        self.registry.lookup::<dyn CompilerInfo>(variant, language)
    }

    /// Linker `variant`.
    pub fn linker(&self, variant: &str) -> Result<Option<Arc<dyn LinkerInfo>>> {
        self.registry.lookup::<dyn LinkerInfo>(variant, "")
    }

    /// Output description `variant`.
    pub fn output(&self, variant: &str) -> Result<Option<Arc<dyn OutputInfo>>> {
        self.registry.lookup::<dyn OutputInfo>(variant, "")
    }

    /// Subsystem reachable as `name`.
    pub fn subsystem(&self, name: &str) -> Result<Option<Arc<dyn Subsystem>>> {
        self.registry.lookup::<dyn Subsystem>(name, "")
    }

    /// Every registered subsystem.
    pub fn subsystems(&self) -> Result<Vec<Arc<dyn Subsystem>>> {
        self.registry.lookup_all::<dyn Subsystem>()
    }

    /// Template `identifier` for `language`.
    pub fn template(&self, language: &str, identifier: &str) -> Result<Option<Arc<dyn Template>>> {
        self.registry.lookup::<dyn Template>(identifier, language)
    }

    /// First registered template for `language`.
    pub fn first_template(&self, language: &str) -> Result<Option<Arc<dyn Template>>> {
        self.registry
            .registrations()
            .iter()
            .find(|r| r.base == Capability::Template && r.language == language)
            .map(|registration| self.typed::<dyn Template>(registration))
            .transpose()
    }

    /// Every registered template.
    pub fn templates(&self) -> Result<Vec<Arc<dyn Template>>> {
        self.registry.lookup_all::<dyn Template>()
    }

    fn language_registrations(&self, identifier: &str) -> Vec<&'r Registration> {
        self.registry
            .registrations()
            .iter()
            .filter(|r| r.base == Capability::Language && r.language == identifier)
            .collect()
    }

    fn typed_language(&self, registration: &Registration) -> Result<Arc<dyn LanguageInfo>> {
        self.typed::<dyn LanguageInfo>(registration)
    }

    fn typed<T: CapabilityKind + ?Sized>(&self, registration: &Registration) -> Result<Arc<T>> {
        let instance = self.registry.instance(registration)?;
        T::extract(&instance).ok_or_else(|| RegistryError::CapabilityMismatch {
            type_name: registration.type_name,
            expected: T::CAPABILITY,
            actual: instance.capability(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::descriptor::{ToolDescriptor, ToolMarker};
    use crate::tool::{InvokeContext, Invocation, ModuleTool};
    use crate::unit::{StaticUnit, UnitRegistrar};
    use crate::{HOST_VERSION, ToolError};

    macro_rules! language {
        ($ty:ident, $version:literal) => {
            #[derive(Default)]
            struct $ty;

            impl ModuleTool for $ty {
                fn name(&self) -> &str {
                    $version
                }
                fn language(&self) -> &str {
                    "csharp"
                }
            }

            impl LanguageInfo for $ty {
                fn identifier(&self) -> &str {
                    "csharp"
                }
                fn full_name(&self) -> &str {
                    "C#"
                }
                fn language_version(&self) -> &str {
                    $version
                }
            }
        };
    }

    language!(Suite1, "c#12-1");
    language!(Suite3, "c#11-3");
    language!(Plain12, "c#12");

    #[derive(Default)]
    struct Console;

    impl ModuleTool for Console {
        fn name(&self) -> &str {
            "console"
        }
        fn language(&self) -> &str {
            "csharp"
        }
    }

    impl Template for Console {
        fn identifier(&self) -> &str {
            "console"
        }
        fn title(&self) -> &str {
            "Console"
        }
        fn description(&self) -> &str {
            "A console app"
        }
        fn instantiate(&self, _: &Path, _: &str) -> std::result::Result<Vec<PathBuf>, ToolError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Echo;

    impl ModuleTool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
    }

    impl Subsystem for Echo {
        fn description(&self) -> &str {
            "Echoes"
        }
        fn invoke(
            &self,
            cx: &mut InvokeContext<'_>,
            args: &[String],
        ) -> std::result::Result<Invocation, ToolError> {
            writeln!(cx.out, "{}", args.join(" "))?;
            Ok(Invocation::Completed)
        }
    }

    fn register(unit: &mut UnitRegistrar) {
        unit.register(
            ToolDescriptor::language::<Plain12>()
                .marker(ToolMarker::language_info("csharp", "c#12", HOST_VERSION)),
        )
        .register(
            ToolDescriptor::language::<Suite1>()
                .marker(ToolMarker::language_info("csharp", "c#12-1", HOST_VERSION)),
        )
        .register(
            ToolDescriptor::language::<Suite3>()
                .marker(ToolMarker::language_info("csharp", "c#11-3", HOST_VERSION)),
        )
        .register(
            ToolDescriptor::template::<Console>()
                .marker(ToolMarker::template("csharp", "console", HOST_VERSION))
                .marker(ToolMarker::template("csharp", "app", HOST_VERSION)),
        )
        .register(ToolDescriptor::subsystem::<Echo>().marker(ToolMarker::subsystem("echo", HOST_VERSION)));
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.scan(&[&StaticUnit::new("test", register)]);
        registry
    }

    #[test]
    fn test_exact_language() {
        let registry = registry();
        let tools = registry.tools();
        let language = tools.language("csharp", "c#12-1").unwrap().unwrap();
        assert_eq!(language.language_version(), "c#12-1");
        assert!(tools.language("csharp", "c#9").unwrap().is_none());
    }

    #[test]
    fn test_first_and_highest_language() {
        let registry = registry();
        let tools = registry.tools();
        assert_eq!(
            tools.first_language("csharp").unwrap().unwrap().language_version(),
            "c#12"
        );
        assert_eq!(
            tools.highest_language("csharp").unwrap().unwrap().language_version(),
            "c#11-3"
        );
        assert!(tools.highest_language("fsharp").unwrap().is_none());
        assert_eq!(tools.languages().unwrap().len(), 3);
    }

    #[test]
    fn test_templates() {
        let registry = registry();
        let tools = registry.tools();
        assert!(tools.template("csharp", "console").unwrap().is_some());
        assert!(tools.template("csharp", "app").unwrap().is_some());
        assert!(tools.template("fsharp", "console").unwrap().is_none());
        assert_eq!(
            tools.first_template("csharp").unwrap().unwrap().identifier(),
            "console"
        );
        assert!(tools.first_template("fsharp").unwrap().is_none());
        assert_eq!(tools.templates().unwrap().len(), 2);
    }

    #[test]
    fn test_subsystem_invocation() {
        let registry = registry();
        let tools = registry.tools();
        let echo = tools.subsystem("echo").unwrap().unwrap();
        let mut out = Vec::new();
        let mut cx = InvokeContext {
            tools,
            working_dir: PathBuf::from("."),
            out: &mut out,
        };
        let outcome = echo.invoke(&mut cx, &["a".into(), "b".into()]).unwrap();
        assert_eq!(outcome, Invocation::Completed);
        assert_eq!(String::from_utf8(out).unwrap(), "a b\n");
        assert!(tools.subsystem("missing").unwrap().is_none());
        assert_eq!(tools.subsystems().unwrap().len(), 1);
    }

    #[test]
    fn test_neutral_lookups_miss_cleanly() {
        let registry = registry();
        let tools = registry.tools();
        assert!(tools.linker("standardlib").unwrap().is_none());
        assert!(tools.output("exe").unwrap().is_none());
        assert!(tools.compiler("roslyn", "csharp").unwrap().is_none());
    }
}
