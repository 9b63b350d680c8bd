//! C# support: the language description and the `console` template.

use std::fs;
use std::path::{Path, PathBuf};

use ndk_modules::{
    HOST_VERSION, LanguageInfo, LinkReference, ModuleTool, Project, ProjectFile, StaticUnit,
    Template, ToolDescriptor, ToolError, ToolMarker, UnitRegistrar,
    builtin::STANDARD_LIBRARY,
};
use tracing::debug;

/// Language identifier.
pub const IDENTIFIER: &str = "csharp";
/// Language version label of [`CSharp`].
pub const LANGUAGE_VERSION: &str = "c#12";

/// C# 12.
#[derive(Debug, Default, Clone, Copy)]
pub struct CSharp;

impl ModuleTool for CSharp {
    fn name(&self) -> &str {
        LANGUAGE_VERSION
    }

    fn language(&self) -> &str {
        IDENTIFIER
    }
}

impl LanguageInfo for CSharp {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn full_name(&self) -> &str {
        "C#"
    }

    fn language_version(&self) -> &str {
        LANGUAGE_VERSION
    }

    fn aliases(&self) -> &[&str] {
        &["csharp", "cs"]
    }

    fn file_extensions(&self) -> &[&str] {
        &[".cs"]
    }
}

/// A console application: the project file plus `Program.cs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTemplate;

impl ConsoleTemplate {
    fn program(project_name: &str) -> String {
        let namespace: String = project_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        format!(
            "namespace {namespace};\n\
             \n\
             public static class Program\n\
             {{\n    \
                 public static void Main(string[] args)\n    \
                 {{\n        \
                     System.Console.WriteLine(\"Hello, World!\");\n    \
                 }}\n\
             }}\n"
        )
    }
}

impl ModuleTool for ConsoleTemplate {
    fn name(&self) -> &str {
        "console"
    }

    fn language(&self) -> &str {
        IDENTIFIER
    }
}

impl Template for ConsoleTemplate {
    fn identifier(&self) -> &str {
        "console"
    }

    fn title(&self) -> &str {
        "Console Project"
    }

    fn description(&self) -> &str {
        "Creates a simple console application."
    }

    fn instantiate(&self, target: &Path, project_name: &str) -> Result<Vec<PathBuf>, ToolError> {
        let file = ProjectFile {
            language: IDENTIFIER.to_string(),
            version: LANGUAGE_VERSION.to_string(),
            references: vec![LinkReference::new(STANDARD_LIBRARY).with_field("Name", "System")],
        };
        let project = Project::create(target, project_name, file)?;

        let program = target.join("Program.cs");
        fs::write(&program, Self::program(project_name))?;
        debug!(target = %target.display(), project = project_name, "console template written");

        Ok(vec![project.path, program])
    }
}

/// Registration function of [`UNIT`].
pub fn register(unit: &mut UnitRegistrar) {
    unit.register(
        ToolDescriptor::language::<CSharp>()
            .marker(ToolMarker::language_info(IDENTIFIER, LANGUAGE_VERSION, HOST_VERSION)),
    )
    .register(
        ToolDescriptor::template::<ConsoleTemplate>()
            .marker(ToolMarker::template(IDENTIFIER, "console", HOST_VERSION)),
    );
}

/// Unit providing C# support.
pub const UNIT: StaticUnit = StaticUnit::new("ndk.csharp", register);

#[cfg(test)]
mod tests {
    use super::*;
    use ndk_modules::{LinkerInfo, ModuleRegistry, builtin};

    fn registry() -> ModuleRegistry {
        ModuleRegistry::builder()
            .units([builtin::SHARED_UNIT, UNIT])
            .build()
    }

    #[test]
    fn test_language_is_registered() {
        let registry = registry();
        let tools = registry.tools();
        let language = tools.highest_language(IDENTIFIER).unwrap().unwrap();
        assert_eq!(language.full_name(), "C#");
        assert!(language.answers_to("CS"));
        assert_eq!(language.file_extensions(), &[".cs"]);
        assert!(tools.language(IDENTIFIER, "c#12").unwrap().is_some());
    }

    #[test]
    fn test_console_is_first_template() {
        let registry = registry();
        let template = registry.tools().first_template(IDENTIFIER).unwrap().unwrap();
        assert_eq!(template.identifier(), "console");
        assert_eq!(template.title(), "Console Project");
    }

    #[test]
    fn test_console_writes_project() {
        let dir = tempfile::tempdir().unwrap();
        let created = ConsoleTemplate.instantiate(dir.path(), "My App").unwrap();
        assert_eq!(
            created,
            vec![dir.path().join("My App.nproj"), dir.path().join("Program.cs")]
        );

        let program = fs::read_to_string(dir.path().join("Program.cs")).unwrap();
        assert!(program.starts_with("namespace My_App;\n"));
        assert!(program.contains("    public static void Main(string[] args)\n"));

        let project = Project::load(dir.path().join("My App.nproj")).unwrap();
        assert_eq!(project.file.language, IDENTIFIER);
        assert_eq!(project.file.version, LANGUAGE_VERSION);

        let registry = registry();
        let linker = registry.tools().linker(STANDARD_LIBRARY).unwrap().unwrap();
        let info = linker.parse_reference(&project.file.references[0]).unwrap();
        assert_eq!(info.value, "System");
    }
}
