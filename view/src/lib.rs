//! The `view` subsystem.
//!
//! `ndk view [option] [-file:<path>]` reads a project and shows one aspect of
//! it. Without `-file` the working directory must hold exactly one project
//! file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndk_core::{
    Arguments, FieldSet, enum_argument, render_category, render_issues, render_table, render_usage,
};
use ndk_modules::{
    HOST_VERSION, Invocation, InvokeContext, LanguageInfo, LinkerInfo, ModuleTool, Project,
    StaticUnit, Subsystem, ToolDescriptor, ToolError, ToolMarker, UnitRegistrar,
};
use strum::{Display, EnumString, VariantNames};
use tracing::debug;

/// What to show about the project.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
pub enum ViewOption {
    /// General project information.
    #[default]
    Properties,
    /// Files next to the project file.
    Directory,
    /// Source files of the project's language.
    Outline,
}
enum_argument!(ViewOption);

/// Arguments of `ndk view`.
#[derive(Debug, Default)]
pub struct ViewArguments {
    pub option: ViewOption,
    pub file: Option<PathBuf>,
}

impl Arguments for ViewArguments {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .field("option", |a| &mut a.option)
            .positional(0)
            .describe("What to show.");
        fields
            .field("file", |a| &mut a.file)
            .variable()
            .category("Arguments")
            .describe("The project file to target. Leave blank to auto-detect the project file.");
    }
}

/// Shows information about a project.
#[derive(Debug, Default)]
pub struct ViewSubsystem;

impl ViewSubsystem {
    fn write_help(&self, cx: &mut InvokeContext<'_>) -> Result<(), ToolError> {
        let schema = ViewArguments::schema();
        writeln!(cx.out, "{}\n", self.detailed_description())?;
        writeln!(cx.out, "{}\n", render_usage("ndk view", &schema))?;

        let options: Vec<(String, String)> = ViewOption::VARIANTS
            .iter()
            .map(|name| (name.to_lowercase(), String::new()))
            .collect();
        writeln!(cx.out, "{}", render_table("Options", &options))?;
        write!(cx.out, "{}", render_category(&schema, "Arguments"))?;
        Ok(())
    }

    fn read_project(cx: &InvokeContext<'_>, args: &ViewArguments) -> Result<Project, ToolError> {
        match &args.file {
            Some(file) => Project::load(cx.working_dir.join(file)),
            None => Project::find(&cx.working_dir)?.ok_or_else(|| {
                ToolError::Project(
                    "cannot auto-detect the project: no project file in the working directory"
                        .to_string(),
                )
            }),
        }
    }

    fn show_properties(cx: &mut InvokeContext<'_>, project: &Project) -> Result<(), ToolError> {
        let mut rows = vec![
            ("Name".to_string(), project.name.clone()),
            ("Path".to_string(), project.path.display().to_string()),
            ("Language".to_string(), project.file.language.clone()),
            ("Version".to_string(), project.file.version.clone()),
        ];
        if let Some(language) = cx
            .tools
            .language(&project.file.language, &project.file.version)?
        {
            rows.push(("Language Name".to_string(), language.full_name().to_string()));
        }
        if !project.matches_directory() {
            let folder = project.directory_name().unwrap_or_default();
            rows.push((
                "Warning".to_string(),
                format!("project name '{}' differs from its folder '{folder}'", project.name),
            ));
        }
        write!(cx.out, "{}", render_table("General", &rows))?;

        let mut links = Vec::new();
        for reference in &project.file.references {
            let resolved = match cx.tools.linker(&reference.kind)? {
                Some(linker) => match linker.parse_reference(reference) {
                    Ok(info) => info.to_string(),
                    Err(err) => err.to_string(),
                },
                None => format!("no linker for '{}'", reference.kind),
            };
            links.push((reference.kind.clone(), resolved));
        }
        if !links.is_empty() {
            write!(cx.out, "\n{}", render_table("References", &links))?;
        }
        Ok(())
    }

    fn show_directory(cx: &mut InvokeContext<'_>, project: &Project) -> Result<(), ToolError> {
        let root = project_root(project);
        let mut names: Vec<String> = fs::read_dir(&root)?
            .map(|entry| {
                entry.map(|e| {
                    let name = e.file_name().to_string_lossy().into_owned();
                    if e.path().is_dir() { format!("{name}/") } else { name }
                })
            })
            .collect::<Result<_, _>>()?;
        names.sort();
        let rows: Vec<(String, String)> = names.into_iter().map(|n| (n, String::new())).collect();
        write!(cx.out, "{}", render_table(&root.display().to_string(), &rows))?;
        Ok(())
    }

    fn show_outline(cx: &mut InvokeContext<'_>, project: &Project) -> Result<(), ToolError> {
        let exact = cx
            .tools
            .language(&project.file.language, &project.file.version)?;
        let language = match exact {
            Some(language) => Some(language),
            None => cx.tools.highest_language(&project.file.language)?,
        }
        .ok_or_else(|| {
            ToolError::Project(format!("language '{}' is not installed", project.file.language))
        })?;
        let root = project_root(project);
        let mut sources = Vec::new();
        collect_sources(&root, &root, language.file_extensions(), &mut sources)?;
        sources.sort();
        debug!(project = %project.name, sources = sources.len(), "outline collected");

        let rows: Vec<(String, String)> = sources.into_iter().map(|s| (s, String::new())).collect();
        let heading = format!("{} sources", language.full_name());
        write!(cx.out, "{}", render_table(&heading, &rows))?;
        Ok(())
    }
}

fn project_root(project: &Project) -> PathBuf {
    project
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn collect_sources(
    root: &Path,
    dir: &Path,
    extensions: &[&str],
    out: &mut Vec<String>,
) -> Result<(), ToolError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_sources(root, &path, extensions, out)?;
        } else {
            let name = path.to_string_lossy();
            if extensions.iter().any(|ext| name.ends_with(ext)) {
                let shown = path.strip_prefix(root).unwrap_or(&path);
                out.push(shown.display().to_string());
            }
        }
    }
    Ok(())
}

impl ModuleTool for ViewSubsystem {
    fn name(&self) -> &str {
        "view"
    }
}

impl Subsystem for ViewSubsystem {
    fn description(&self) -> &str {
        "View information about a project."
    }

    fn invoke(&self, cx: &mut InvokeContext<'_>, args: &[String]) -> Result<Invocation, ToolError> {
        let parsed = ViewArguments::parse(args);
        if !parsed.report.any_arguments {
            self.write_help(cx)?;
            return Ok(Invocation::Usage);
        }
        if let Some(issues) = render_issues(&parsed.report) {
            write!(cx.out, "{issues}")?;
            return Ok(Invocation::Rejected);
        }

        let project = Self::read_project(cx, &parsed)?;
        match parsed.option {
            ViewOption::Properties => Self::show_properties(cx, &project)?,
            ViewOption::Directory => Self::show_directory(cx, &project)?,
            ViewOption::Outline => Self::show_outline(cx, &project)?,
        }
        Ok(Invocation::Completed)
    }
}

/// Registration function of [`UNIT`].
pub fn register(unit: &mut UnitRegistrar) {
    unit.register(
        ToolDescriptor::subsystem::<ViewSubsystem>()
            .marker(ToolMarker::subsystem("view", HOST_VERSION)),
    );
}

/// Unit providing the `view` subsystem.
pub const UNIT: StaticUnit = StaticUnit::new("ndk.view", register);

#[cfg(test)]
mod tests {
    use super::*;
    use ndk_modules::{LinkReference, ModuleRegistry, ProjectFile, builtin};

    fn run(dir: &Path, args: &[&str]) -> (Result<Invocation, ToolError>, String) {
        let registry = ModuleRegistry::builder()
            .units([builtin::SHARED_UNIT, UNIT])
            .build();
        let view = registry.tools().subsystem("view").unwrap().unwrap();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();

        let mut out = Vec::new();
        let result = {
            let mut cx = InvokeContext {
                tools: registry.tools(),
                working_dir: dir.to_path_buf(),
                out: &mut out,
            };
            view.invoke(&mut cx, &args)
        };
        (result, String::from_utf8(out).unwrap())
    }

    fn project_in(root: &Path, folder: &str, name: &str) -> PathBuf {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        let file = ProjectFile {
            language: "csharp".into(),
            version: "c#12".into(),
            references: vec![
                LinkReference::new("standardlib").with_field("Name", "System"),
                LinkReference::new("standardlib"),
                LinkReference::new("nuget").with_field("Name", "Json"),
            ],
        };
        Project::create(&dir, name, file).unwrap();
        dir
    }

    #[test]
    fn test_help_without_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &[]);
        assert_eq!(result.unwrap(), Invocation::Usage);
        assert!(out.contains("usage: ndk view [<option>] [-file <path>]"));
        assert!(out.contains("Options:\n  properties\n  directory\n  outline\n"));
        assert!(out.contains("Arguments:\n  [-file <path>]  The project file to target."));
    }

    #[test]
    fn test_bad_option_alone_shows_help() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &["everything"]);
        assert_eq!(result.unwrap(), Invocation::Usage);
        assert!(out.contains("usage: ndk view"));
        assert!(!out.contains("could not be parsed"));
    }

    #[test]
    fn test_rejects_bad_option_next_to_bound_argument() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out) = run(dir.path(), &["everything", "-file:App.nproj"]);
        assert_eq!(result.unwrap(), Invocation::Rejected);
        assert!(out.contains("1 argument could not be parsed:\n  option\n"));
    }

    #[test]
    fn test_properties_of_detected_project() {
        let root = tempfile::tempdir().unwrap();
        let dir = project_in(root.path(), "Hello", "Hello");
        let (result, out) = run(&dir, &["properties"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(out.contains("  Name      Hello\n"));
        assert!(out.contains("  Language  csharp\n"));
        assert!(!out.contains("Warning"));
        assert!(out.contains("standardlib => System"));
        assert!(out.contains("invalid reference"));
        assert!(out.contains("no linker for 'nuget'"));
    }

    #[test]
    fn test_properties_warns_on_name_mismatch() {
        let root = tempfile::tempdir().unwrap();
        project_in(root.path(), "Folder", "Named");
        let (result, out) = run(root.path(), &["-file:Folder/Named.nproj"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(out.contains("project name 'Named' differs from its folder 'Folder'"));
    }

    #[test]
    fn test_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let (result, _) = run(dir.path(), &["properties"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("auto-detect")));

        let (result, _) = run(dir.path(), &["-file:absent.nproj"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("does not exist")));
    }

    #[test]
    fn test_directory_listing() {
        let root = tempfile::tempdir().unwrap();
        let dir = project_in(root.path(), "App", "App");
        fs::create_dir(dir.join("src")).unwrap();
        fs::write(dir.join("README.md"), "").unwrap();
        let (result, out) = run(&dir, &["directory"]);
        assert_eq!(result.unwrap(), Invocation::Completed);
        assert!(out.contains("  App.nproj\n  README.md\n  src/\n"));
    }

    #[test]
    fn test_outline_needs_installed_language() {
        let root = tempfile::tempdir().unwrap();
        let dir = project_in(root.path(), "App", "App");
        let (result, _) = run(&dir, &["outline"]);
        assert!(matches!(result, Err(ToolError::Project(msg)) if msg.contains("not installed")));
    }
}
