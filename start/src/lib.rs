//! The `start` subsystem.
//!
//! `ndk start <language> [template] [-dir <path>] [--yes]` creates a project
//! from a template. The language may be given by identifier or alias; the
//! highest registered version of it is used. Without a template name the
//! language's first registered template is used.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndk_core::{Arguments, FieldSet, render_arguments, render_issues, render_table, render_usage};
use ndk_modules::{
    HOST_VERSION, Invocation, InvokeContext, LanguageInfo, ModuleTool, PROJECT_EXTENSION,
    StaticUnit, Subsystem, Template, ToolDescriptor, ToolError, ToolMarker, ToolResolver,
    UnitRegistrar, is_project_file,
};
use tracing::{debug, info};

/// Entries allowed in a project directory without counting as contents.
const IGNORED_ENTRIES: [&str; 2] = [".git", ".vs"];

/// Arguments of `ndk start`.
#[derive(Debug, Default)]
pub struct StartArguments {
    pub language: String,
    pub template: Option<String>,
    pub dir: Option<PathBuf>,
    pub yes: bool,
}

impl Arguments for StartArguments {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .field("language", |a| &mut a.language)
            .positional(0)
            .required()
            .describe("Language identifier or alias.");
        fields
            .field("template", |a| &mut a.template)
            .positional(1)
            .describe("Template to use. Defaults to the language's first template.");
        fields
            .field("dir", |a| &mut a.dir)
            .variable()
            .describe("Project directory. Defaults to the working directory.");
        fields
            .field("yes", |a| &mut a.yes)
            .flag()
            .describe("Create the project even if the directory has contents.");
    }
}

/// What a target directory already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectoryState {
    Empty,
    Contents,
    Project,
}

fn inspect_directory(dir: &Path) -> io::Result<DirectoryState> {
    if !dir.exists() {
        return Ok(DirectoryState::Empty);
    }
    let mut state = DirectoryState::Empty;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let ignored = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| IGNORED_ENTRIES.contains(&name));
        if ignored {
            continue;
        }
        if path.is_file() && is_project_file(&path) {
            return Ok(DirectoryState::Project);
        }
        state = DirectoryState::Contents;
    }
    Ok(state)
}

/// Highest version of the language answering to `name`.
fn resolve_language(tools: ToolResolver<'_>, name: &str) -> Result<Option<Arc<dyn LanguageInfo>>, ToolError> {
    if let Some(language) = tools.highest_language(name)? {
        return Ok(Some(language));
    }
    match tools.languages()?.into_iter().find(|l| l.answers_to(name)) {
        Some(alias) => Ok(tools.highest_language(alias.identifier())?),
        None => Ok(None),
    }
}

fn resolve_template(
    tools: ToolResolver<'_>,
    language: &str,
    name: Option<&str>,
) -> Result<Arc<dyn Template>, ToolError> {
    match name {
        Some(name) => tools.template(language, name)?.ok_or_else(|| {
            ToolError::Template(format!(
                "template '{name}' was not found for language '{language}'; \
                 run `ndk start` for a list of available templates"
            ))
        }),
        None => tools.first_template(language)?.ok_or_else(|| {
            ToolError::Template(format!("language '{language}' has no templates installed"))
        }),
    }
}

fn language_rows(tools: ToolResolver<'_>) -> Result<Vec<(String, String)>, ToolError> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for language in tools.languages()? {
        if language.aliases().is_empty() {
            continue;
        }
        let aliases = language.aliases().join(", ");
        if seen.insert(aliases.clone()) {
            rows.push((aliases, format!("Create a {} project.", language.full_name())));
        }
    }
    Ok(rows)
}

/// Templates grouped by identifier and description, each listing the
/// languages it exists for, or `all`.
fn template_rows(tools: ToolResolver<'_>) -> Result<Vec<(String, String)>, ToolError> {
    let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();
    for template in tools.templates()? {
        let index = match groups
            .iter()
            .position(|(id, desc, _)| id == template.identifier() && desc == template.description())
        {
            Some(index) => index,
            None => {
                groups.push((
                    template.identifier().to_string(),
                    template.description().to_string(),
                    Vec::new(),
                ));
                groups.len() - 1
            }
        };
        let languages = &mut groups[index].2;
        if !languages.iter().any(|l| l == template.language()) {
            languages.push(template.language().to_string());
        }
    }

    let known: Vec<String> = tools
        .languages()?
        .iter()
        .map(|l| l.identifier().to_string())
        .collect();
    Ok(groups
        .into_iter()
        .map(|(identifier, description, languages)| {
            let scope = if known.iter().all(|l| languages.contains(l)) {
                "all".to_string()
            } else {
                languages.join(", ")
            };
            (format!("{identifier} ({scope})"), description)
        })
        .collect())
}

/// Creates projects from templates.
#[derive(Debug, Default)]
pub struct StartSubsystem;

impl StartSubsystem {
    fn write_help(&self, cx: &mut InvokeContext<'_>) -> Result<(), ToolError> {
        let schema = StartArguments::schema();
        writeln!(cx.out, "{}\n", self.detailed_description())?;
        writeln!(cx.out, "{}\n", render_usage("ndk start", &schema))?;
        write!(cx.out, "{}", render_arguments(&schema))?;

        for (heading, rows) in [
            ("Languages", language_rows(cx.tools)?),
            ("Templates", template_rows(cx.tools)?),
        ] {
            if !rows.is_empty() {
                write!(cx.out, "\n{}", render_table(heading, &rows))?;
            }
        }
        Ok(())
    }

    fn create_project(
        &self,
        cx: &mut InvokeContext<'_>,
        args: &StartArguments,
    ) -> Result<Invocation, ToolError> {
        let tools = cx.tools;
        let language = resolve_language(tools, &args.language)?.ok_or_else(|| {
            ToolError::Project(format!(
                "unknown language '{}'; either it is not supported or its unit is not installed. \
                 Run `ndk start` for a list of known languages",
                args.language
            ))
        })?;
        let identifier = language.identifier().to_string();
        let template = resolve_template(tools, &identifier, args.template.as_deref())?;

        let dir = match &args.dir {
            Some(dir) => cx.working_dir.join(dir),
            None => cx.working_dir.clone(),
        };
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ToolError::Project(format!("cannot name a project after '{}'", dir.display()))
            })?;

        let properties = vec![
            ("Project Name".to_string(), name.clone()),
            (
                "Language".to_string(),
                format!("{} ({})", language.full_name(), language.language_version()),
            ),
            ("Template".to_string(), template.title().to_string()),
            ("Directory".to_string(), dir.display().to_string()),
            ("Project File".to_string(), format!("{name}.{PROJECT_EXTENSION}")),
            ("NDK Version".to_string(), HOST_VERSION.to_string()),
        ];
        writeln!(cx.out, "Creating new project")?;
        write!(cx.out, "{}", render_table("Properties", &properties))?;

        match inspect_directory(&dir)? {
            DirectoryState::Project => {
                return Err(ToolError::Project(format!(
                    "there is an existing project in '{}'; remove it before creating a new one",
                    dir.display()
                )));
            }
            DirectoryState::Contents if !args.yes => {
                return Err(ToolError::Project(format!(
                    "'{}' already has contents; pass --yes to create the project anyway",
                    dir.display()
                )));
            }
            state => debug!(?state, dir = %dir.display(), "target directory checked"),
        }

        fs::create_dir_all(&dir)?;
        let created = template.instantiate(&dir, &name)?;
        info!(
            project = %name,
            template = template.identifier(),
            files = created.len(),
            "project created"
        );

        let rows: Vec<(String, String)> = created
            .iter()
            .map(|path| {
                let shown = path.strip_prefix(&dir).unwrap_or(path);
                (shown.display().to_string(), String::new())
            })
            .collect();
        write!(cx.out, "{}", render_table("Created", &rows))?;
        Ok(Invocation::Completed)
    }
}

impl ModuleTool for StartSubsystem {
    fn name(&self) -> &str {
        "start"
    }
}

impl Subsystem for StartSubsystem {
    fn description(&self) -> &str {
        "Creates a project of a specific language in the current directory."
    }

    fn detailed_description(&self) -> &str {
        "Creates a project of a specific language in the current directory.\n\
         If a template is not provided, the first available template (typically\n\
         the \"console\" template) is chosen."
    }

    fn invoke(&self, cx: &mut InvokeContext<'_>, args: &[String]) -> Result<Invocation, ToolError> {
        let parsed = StartArguments::parse(args);
        if !parsed.report.any_arguments {
            self.write_help(cx)?;
            return Ok(Invocation::Usage);
        }
        if let Some(issues) = render_issues(&parsed.report) {
            write!(cx.out, "{issues}")?;
            return Ok(Invocation::Rejected);
        }
        self.create_project(cx, &parsed)
    }
}

/// Registration function of [`UNIT`].
pub fn register(unit: &mut UnitRegistrar) {
    unit.register(
        ToolDescriptor::subsystem::<StartSubsystem>()
            .marker(ToolMarker::subsystem("start", HOST_VERSION)),
    );
}

/// Unit providing the `start` subsystem.
pub const UNIT: StaticUnit = StaticUnit::new("ndk.start", register);

#[cfg(test)]
mod tests {
    use super::*;
    use ndk_modules::{ModuleRegistry, Project, ProjectFile};

    macro_rules! fake_language {
        ($ty:ident, $version:literal) => {
            #[derive(Default)]
            struct $ty;

            impl ModuleTool for $ty {
                fn name(&self) -> &str {
                    $version
                }
                fn language(&self) -> &str {
                    "fake"
                }
            }

            impl LanguageInfo for $ty {
                fn identifier(&self) -> &str {
                    "fake"
                }
                fn full_name(&self) -> &str {
                    "Fake"
                }
                fn language_version(&self) -> &str {
                    $version
                }
                fn aliases(&self) -> &[&str] {
                    &["fake", "fk"]
                }
            }
        };
    }

    fake_language!(Fake1, "fake1");
    fake_language!(Fake2, "fake2-1");

    #[derive(Default)]
    struct Hello;

    impl ModuleTool for Hello {
        fn name(&self) -> &str {
            "hello"
        }
        fn language(&self) -> &str {
            "fake"
        }
    }

    impl Template for Hello {
        fn identifier(&self) -> &str {
            "hello"
        }
        fn title(&self) -> &str {
            "Hello Project"
        }
        fn description(&self) -> &str {
            "Says hello."
        }
        fn instantiate(&self, target: &Path, project_name: &str) -> Result<Vec<PathBuf>, ToolError> {
            let file = ProjectFile {
                language: "fake".into(),
                version: "fake2-1".into(),
                references: Vec::new(),
            };
            let project = Project::create(target, project_name, file)?;
            Ok(vec![project.path])
        }
    }

    fn fake(unit: &mut UnitRegistrar) {
        unit.register(
            ToolDescriptor::language::<Fake1>()
                .marker(ToolMarker::language_info("fake", "fake1", HOST_VERSION)),
        )
        .register(
            ToolDescriptor::language::<Fake2>()
                .marker(ToolMarker::language_info("fake", "fake2-1", HOST_VERSION)),
        )
        .register(
            ToolDescriptor::template::<Hello>()
                .marker(ToolMarker::template("fake", "hello", HOST_VERSION)),
        );
    }

    fn run(dir: &Path, args: &[&str]) -> (Result<Invocation, ToolError>, String) {
        let mut registry = ModuleRegistry::new();
        registry.scan(&[&UNIT, &StaticUnit::new("fake", fake)]);
        let start = registry.tools().subsystem("start").unwrap().unwrap();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();

        let mut out = Vec::new();
        let result = {
            let mut cx = InvokeContext {
                tools: registry.tools(),
                working_dir: dir.to_path_buf(),
                out: &mut out,
            };
            start.invoke(&mut cx, &args)
        };
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_help_without_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &[]);
        assert_eq!(result.unwrap(), Invocation::Usage);
        assert!(out.contains("usage: ndk start <language> [<template>] [-dir <path>] [--yes]"));
        assert!(out.contains("Languages:\n  fake, fk  Create a Fake project.\n"));
        assert!(out.contains("Templates:\n  hello (all)  Says hello.\n"));
    }

    #[test]
    fn test_rejects_unknown_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &["fake", "hello", "extra"]);
        assert_eq!(result.unwrap(), Invocation::Rejected);
        assert!(out.starts_with("1 argument was not recognized:\n  extra\n"));
    }

    #[test]
    fn test_rejects_missing_language() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &["--yes"]);
        assert_eq!(result.unwrap(), Invocation::Rejected);
        assert!(out.contains("is required but was not given:\n  language\n"));
    }

    #[test]
    fn test_creates_project_through_alias() {
        let root = tempfile::tempdir().unwrap();
        let (result, out) = run(root.path(), &["fk", "-dir:Greeter"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(out.contains("Fake (fake2-1)"));
        assert!(out.contains("Greeter.nproj"));

        let project = Project::find(root.path().join("Greeter")).unwrap().unwrap();
        assert_eq!(project.name, "Greeter");
        assert_eq!(project.file.version, "fake2-1");
    }

    #[test]
    fn test_ignores_git_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Repo");
        fs::create_dir_all(dir.join(".git")).unwrap();
        let (result, _) = run(&dir, &["fake"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(dir.join("Repo.nproj").is_file());
    }

    #[test]
    fn test_refuses_existing_project() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Taken");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Old.nproj"), "language: fake\n").unwrap();
        let (result, _) = run(&dir, &["fake", "--yes"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("existing project")));
    }

    #[test]
    fn test_contents_need_confirmation() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Busy");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();

        let (result, _) = run(&dir, &["fake"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("--yes")));

        let (result, _) = run(&dir, &["fake", "--yes"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(dir.join("Busy.nproj").is_file());
    }

    #[test]
    fn test_unknown_language_and_template() {
        let dir = tempfile::tempdir().unwrap();
        let (result, _) = run(dir.path(), &["cobol"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("unknown language 'cobol'")));

        let (result, _) = run(dir.path(), &["fake", "library"]);
        assert!(matches!(result, Err(ToolError::Template(msg)) if msg.contains("'library'")));
    }
}
