mod hub;

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ndk_modules::{HostConfig, ModuleRegistry, builtin};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "NDK_CONFIG";
const LOG_ENV: &str = "NDK_LOG";
const CONFIG_FILE: &str = "ndk.yml";

fn main() {
    let result = run();

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(hub::EXIT_FAILURE);
        }
    }
}

fn run() -> Result<i32, String> {
    let working_dir =
        env::current_dir().map_err(|e| format!("cannot read the working directory: {e}"))?;
    let config = load_config(&working_dir)?;
    init_tracing(config.log.as_deref());

    let (registry, summary) = ModuleRegistry::builder()
        .unit(builtin::SHARED_UNIT)
        .unit(ndk_start::UNIT)
        .unit(ndk_view::UNIT)
        .unit(ndk_tools_csharp::UNIT)
        .config(config)
        .build_with_summary();
    info!(
        units = summary.units,
        accepted = summary.accepted,
        incompatible = summary.incompatible,
        "registry ready"
    );
    for unit in &summary.failed_units {
        warn!(unit = %unit, "unit failed to load");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = hub::run(&registry, working_dir, &args, &mut out)?;
    out.flush().map_err(|e| e.to_string())?;
    Ok(code)
}

/// `NDK_CONFIG` when set, else `ndk.yml` in the working directory when it
/// exists, else defaults.
fn load_config(working_dir: &Path) -> Result<HostConfig, String> {
    let path = match env::var_os(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => {
            let local = working_dir.join(CONFIG_FILE);
            if !local.is_file() {
                return Ok(HostConfig::default());
            }
            local
        }
    };
    HostConfig::load(&path).map_err(|e| format!("cannot load config '{}': {e}", path.display()))
}

fn init_tracing(config_level: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(config_level.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    debug!("tracing initialized");
}
