//! Top-level argument handling: picks a subsystem or prints information
//! about the installation.

use std::io::Write;
use std::path::PathBuf;

use ndk_core::{
    Arguments, FieldSet, enum_argument, render_arguments, render_issues, render_table, render_usage,
};
use ndk_modules::{Invocation, InvokeContext, ModuleRegistry, ModuleTool, Subsystem};
use strum::{Display, EnumString, VariantNames};
use tracing::{debug, warn};

pub const REPOSITORY: &str = env!("CARGO_PKG_REPOSITORY");
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Output format of `--modules`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
pub enum CatalogFormat {
    #[default]
    Table,
    Json,
    Yaml,
}
enum_argument!(CatalogFormat);

#[derive(Debug, Default)]
pub struct HubArguments {
    pub subsystem: String,
    pub subsystem_args: Vec<String>,
    pub help: bool,
    pub repo: bool,
    pub version: bool,
    pub modules: bool,
    pub format: CatalogFormat,
}

impl Arguments for HubArguments {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .field("subsystem", |a| &mut a.subsystem)
            .positional(0)
            .describe("The subsystem to run.");
        fields
            .field("subsystem_args", |a| &mut a.subsystem_args)
            .positional(1)
            .remainder()
            .named("args")
            .describe("Arguments handed to the subsystem.");
        fields
            .field("help", |a| &mut a.help)
            .flag()
            .category("About")
            .describe("Show this help.");
        fields
            .field("repo", |a| &mut a.repo)
            .flag()
            .describe("Show the repository URL.");
        fields
            .field("version", |a| &mut a.version)
            .flag()
            .describe("Show the kit version.");
        fields
            .field("modules", |a| &mut a.modules)
            .flag()
            .describe("List the registered tools.");
        fields
            .field("format", |a| &mut a.format)
            .variable()
            .describe("Format of the tool list: table, json or yaml.");
    }
}

/// Dispatches `args` and returns the process exit code.
pub fn run(
    registry: &ModuleRegistry,
    working_dir: PathBuf,
    args: &[String],
    out: &mut dyn Write,
) -> Result<i32, String> {
    let parsed = HubArguments::parse(args);
    if let Some(issues) = render_issues(&parsed.report) {
        write!(out, "{issues}").map_err(|e| e.to_string())?;
        return Ok(EXIT_USAGE);
    }
    let args = parsed.into_args();

    if !args.subsystem.is_empty() {
        return dispatch(registry, working_dir, &args, out);
    }

    let show_help = args.help || !(args.repo || args.version || args.modules);
    if show_help {
        write_help(registry, out)?;
    }
    if args.repo {
        writeln!(out, "{REPOSITORY}").map_err(|e| e.to_string())?;
    }
    if args.version {
        writeln!(out, "ndk {PACKAGE_VERSION} (host {})", registry.host_version())
            .map_err(|e| e.to_string())?;
    }
    if args.modules {
        let catalog = registry.catalog();
        let text = match args.format {
            CatalogFormat::Table => catalog.to_table(),
            CatalogFormat::Json => catalog.to_json().map_err(|e| e.to_string())?,
            CatalogFormat::Yaml => catalog.to_yaml().map_err(|e| e.to_string())?,
        };
        writeln!(out, "{}", text.trim_end()).map_err(|e| e.to_string())?;
    }
    Ok(EXIT_OK)
}

fn dispatch(
    registry: &ModuleRegistry,
    working_dir: PathBuf,
    args: &HubArguments,
    out: &mut dyn Write,
) -> Result<i32, String> {
    let tools = registry.tools();
    let Some(subsystem) = tools.subsystem(&args.subsystem).map_err(|e| e.to_string())? else {
        warn!(subsystem = %args.subsystem, "unknown subsystem");
        writeln!(
            out,
            "'{}' is not a subsystem. Run 'ndk --help' to list the subsystems.",
            args.subsystem
        )
        .map_err(|e| e.to_string())?;
        return Ok(EXIT_FAILURE);
    };

    debug!(subsystem = subsystem.name(), args = args.subsystem_args.len(), "dispatching");
    let mut cx = InvokeContext {
        tools,
        working_dir,
        out,
    };
    let outcome = subsystem
        .invoke(&mut cx, &args.subsystem_args)
        .map_err(|e| e.to_string())?;
    Ok(match outcome {
        Invocation::Completed | Invocation::Usage => EXIT_OK,
        Invocation::Rejected => EXIT_USAGE,
    })
}

fn write_help(registry: &ModuleRegistry, out: &mut dyn Write) -> Result<(), String> {
    let schema = HubArguments::schema();
    let subsystems = registry
        .tools()
        .subsystems()
        .map_err(|e| e.to_string())?;
    let mut rows: Vec<(String, String)> = subsystems
        .iter()
        .map(|s| (s.name().to_string(), s.description().to_string()))
        .collect();
    rows.sort();

    let text = format!(
        "Native development kit.\n\n{}\n\n{}\n{}",
        render_usage("ndk", &schema),
        render_table("Subsystems", &rows),
        render_arguments(&schema),
    );
    write!(out, "{text}").map_err(|e| e.to_string())
}
