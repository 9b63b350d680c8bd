//! Project files.
//!
//! A project is a single `<name>.nproj` YAML file at the root of its
//! directory. The file stem is the project name.
//!
//! ```yaml
//! language: csharp
//! version: c#12
//! references:
//!   - type: standardlib
//!     fields:
//!       Name: System
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tool::LinkReference;

/// Extension of project files, without the dot.
pub const PROJECT_EXTENSION: &str = "nproj";

/// Contents of a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Language identifier.
    pub language: String,
    /// Language version label.
    #[serde(default)]
    pub version: String,
    /// Link references, resolved by the linker named in each `type`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<LinkReference>,
}

/// A project file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project name (the file stem).
    pub name: String,
    /// Path of the project file.
    pub path: PathBuf,
    /// Parsed contents.
    pub file: ProjectFile,
}

/// `true` when `path` names a project file.
pub fn is_project_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION)
}

impl Project {
    /// Reads the project file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Project`] when the path does not exist or is not a
    /// project file, and I/O or YAML errors when it cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ToolError::Project(format!(
                "'{}' does not exist",
                path.display()
            )));
        }
        if !is_project_file(path) {
            return Err(ToolError::Project(format!(
                "'{}' is not a .{PROJECT_EXTENSION} file",
                path.display()
            )));
        }
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = fs::read_to_string(path)?;
        let file = serde_yaml::from_str(&text)?;
        Ok(Self {
            name,
            path: path.to_path_buf(),
            file,
        })
    }

    /// Finds the project file directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Project`] when more than one project file is
    /// present, and propagates read failures.
    pub fn find(dir: impl AsRef<Path>) -> Result<Option<Self>, ToolError> {
        let dir = dir.as_ref();
        let mut found: Option<PathBuf> = None;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_project_file(&path) {
                continue;
            }
            if found.is_some() {
                return Err(ToolError::Project(format!(
                    "multiple projects exist in '{}'",
                    dir.display()
                )));
            }
            found = Some(path);
        }
        found.map(Self::load).transpose()
    }

    /// Writes `file` as `<dir>/<name>.nproj`.
    ///
    /// # Errors
    ///
    /// Propagates I/O and YAML errors.
    pub fn create(dir: impl AsRef<Path>, name: &str, file: ProjectFile) -> Result<Self, ToolError> {
        let path = dir.as_ref().join(format!("{name}.{PROJECT_EXTENSION}"));
        fs::write(&path, serde_yaml::to_string(&file)?)?;
        Ok(Self {
            name: name.to_string(),
            path,
            file,
        })
    }

    /// Name of the directory holding the project file.
    pub fn directory_name(&self) -> Option<String> {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// `true` when the project is named after its directory.
    pub fn matches_directory(&self) -> bool {
        self.directory_name().is_some_and(|dir| dir == self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectFile {
        ProjectFile {
            language: "csharp".into(),
            version: "c#12".into(),
            references: vec![LinkReference::new("standardlib").with_field("Name", "System")],
        }
    }

    #[test]
    fn test_create_and_find() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Hello");
        fs::create_dir(&dir).unwrap();

        let created = Project::create(&dir, "Hello", sample()).unwrap();
        let found = Project::find(&dir).unwrap().unwrap();
        assert_eq!(found, created);
        assert!(found.matches_directory());
    }

    #[test]
    fn test_find_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        assert!(Project::find(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_find_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        Project::create(dir.path(), "A", sample()).unwrap();
        Project::create(dir.path(), "B", sample()).unwrap();
        let err = Project::find(dir.path()).unwrap_err();
        assert!(matches!(err, ToolError::Project(_)));
    }

    #[test]
    fn test_name_mismatch() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Folder");
        fs::create_dir(&dir).unwrap();
        let project = Project::create(&dir, "Other", sample()).unwrap();
        assert_eq!(project.directory_name().as_deref(), Some("Folder"));
        assert!(!project.matches_directory());
    }

    #[test]
    fn test_load_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.cs");
        fs::write(&path, "").unwrap();
        assert!(matches!(Project::load(&path), Err(ToolError::Project(_))));
        assert!(matches!(
            Project::load(dir.path().join("absent.nproj")),
            Err(ToolError::Project(_))
        ));
    }

    #[test]
    fn test_minimal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Min.nproj");
        fs::write(&path, "language: csharp\n").unwrap();
        let project = Project::load(&path).unwrap();
        assert_eq!(project.file.language, "csharp");
        assert!(project.file.version.is_empty());
        assert!(project.file.references.is_empty());
    }
}
