//! Plain-text rendering of parse reports and argument help.
//!
//! Nothing here writes to a terminal; callers decide where the text goes.

use crate::parse::ParseReport;
use crate::schema::{ArgumentInfo, ArgumentSchema};

/// Renders every issue in `report`: unknown, duplicate, missing, then
/// unparsed. Returns `None` when there is nothing to report.
///
/// # Examples
///
/// ```
/// use ndk_core::{ParseReport, render_issues};
///
/// let report = ParseReport {
///     unknown: vec!["extra".into()],
///     missing: vec!["language".into(), "-dir".into()],
///     ..ParseReport::default()
/// };
/// let text = render_issues(&report).unwrap();
/// assert!(text.starts_with("1 argument was not recognized:\n  extra\n"));
/// assert!(text.contains("2 arguments are required but were not given:\n  language\n  -dir\n"));
/// assert!(render_issues(&ParseReport::default()).is_none());
/// ```
pub fn render_issues(report: &ParseReport) -> Option<String> {
    let sections = [
        (&report.unknown, "was not recognized", "were not recognized"),
        (
            &report.duplicate,
            "was given more than once",
            "were given more than once",
        ),
        (
            &report.missing,
            "is required but was not given",
            "are required but were not given",
        ),
        (&report.unparsed, "could not be parsed", "could not be parsed"),
    ];

    let mut out = String::new();
    for (names, singular, plural) in sections {
        if names.is_empty() {
            continue;
        }
        let (noun, verb) = if names.len() == 1 {
            ("argument", singular)
        } else {
            ("arguments", plural)
        };
        out.push_str(&format!("{} {noun} {verb}:\n", names.len()));
        for name in names {
            out.push_str(&format!("  {name}\n"));
        }
    }
    (!out.is_empty()).then_some(out)
}

/// One-line usage: `usage: <command> <arguments...>`.
pub fn render_usage<A>(command: &str, schema: &ArgumentSchema<A>) -> String {
    let parts: Vec<String> = schema.arguments().iter().map(ArgumentInfo::usage).collect();
    if parts.is_empty() {
        format!("usage: {command}")
    } else {
        format!("usage: {command} {}", parts.join(" "))
    }
}

/// Aligned listing of the arguments in `category` (empty string for the
/// uncategorized ones), headed by the category name when it has one.
pub fn render_category<A>(schema: &ArgumentSchema<A>, category: &str) -> String {
    let rows: Vec<(String, String)> = schema
        .in_category(category)
        .map(|a| (a.usage(), a.description.clone()))
        .collect();
    render_table(category, &rows)
}

/// Two-column listing with the first column padded to a common width,
/// headed by `heading` when it is not empty. Rows with an empty second
/// column print only the first. Empty when there are no rows.
///
/// # Examples
///
/// ```
/// use ndk_core::render_table;
///
/// let rows = vec![
///     ("start".to_string(), "Creates a project.".to_string()),
///     ("view".to_string(), "Shows a project.".to_string()),
/// ];
/// assert_eq!(
///     render_table("Subsystems", &rows),
///     "Subsystems:\n  start  Creates a project.\n  view   Shows a project.\n"
/// );
/// ```
pub fn render_table(heading: &str, rows: &[(String, String)]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut out = String::new();
    if !heading.is_empty() {
        out.push_str(&format!("{heading}:\n"));
    }
    for (key, value) in rows {
        if value.is_empty() {
            out.push_str(&format!("  {key}\n"));
        } else {
            out.push_str(&format!("  {key:<width$}  {value}\n"));
        }
    }
    out
}

/// Every category in order, uncategorized arguments first, separated by
/// blank lines.
pub fn render_arguments<A>(schema: &ArgumentSchema<A>) -> String {
    std::iter::once("")
        .chain(schema.categories())
        .map(|category| render_category(schema, category))
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
