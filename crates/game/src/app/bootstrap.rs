use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use engine::{
    resolve_app_paths, AppError, AssetCatalog, InputScript, LevelFactory, LoopConfig, Scene,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, PlayConfig};

/// Tick limit used when neither `--ticks` nor `--realtime` is given.
const DEFAULT_TICK_LIMIT: u64 = 600;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) menu: Box<dyn Scene>,
    pub(crate) level_factory: LevelFactory,
    pub(crate) script: InputScript,
    pub(crate) snapshot_path: Option<PathBuf>,
}

pub(crate) enum Launch {
    Run(AppWiring),
    PrintHelp,
}

#[derive(Debug)]
pub(crate) enum BootstrapError {
    Usage(String),
    PlayConfig { path: PathBuf, message: String },
    App(AppError),
}

impl BootstrapError {
    pub(crate) fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(message) => f.write_str(message),
            Self::PlayConfig { path, message } => {
                write!(f, "play config '{}': {message}", path.display())
            }
            Self::App(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<AppError> for BootstrapError {
    fn from(error: AppError) -> Self {
        Self::App(error)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CliOptions {
    /// Zero-based level index; the command line takes the 1-based menu number.
    pub(crate) level: Option<usize>,
    pub(crate) ticks: Option<u64>,
    pub(crate) script: Option<PathBuf>,
    pub(crate) snapshot: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) realtime: bool,
}

impl CliOptions {
    fn tick_limit(&self) -> Option<u64> {
        match (self.ticks, self.realtime) {
            (Some(ticks), _) => Some(ticks),
            (None, true) => None,
            (None, false) => Some(DEFAULT_TICK_LIMIT),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Run(CliOptions),
    Help,
}

pub(crate) fn build_app(args: &[String]) -> Result<Launch, BootstrapError> {
    let options = match parse_args(args)? {
        CliCommand::Help => return Ok(Launch::PrintHelp),
        CliCommand::Run(options) => options,
    };

    init_tracing();
    info!("=== Side Scroller Startup ===");

    let paths = resolve_app_paths().map_err(AppError::from)?;
    let catalog = AssetCatalog::compile(&paths.assets_dir, &paths.base_content_dir)
        .map_err(AppError::from)?;
    let levels = paths.discover_levels().map_err(AppError::from)?;
    let play_config = match &options.config {
        Some(path) => load_play_config(path)?,
        None => PlayConfig::default(),
    };
    let script = match &options.script {
        Some(path) => InputScript::load(path).map_err(AppError::from)?,
        None => InputScript::default(),
    };
    info!(
        root = %paths.root.display(),
        levels = levels.len(),
        animations = catalog.animation_count(),
        fonts = catalog.font_count(),
        script_actions = script.len(),
        "startup_wiring"
    );

    let (menu, level_factory) = gameplay::build_scenes(Rc::new(catalog), levels, play_config);
    let config = LoopConfig {
        max_ticks: options.tick_limit(),
        realtime: options.realtime,
        initial_level: options.level,
        ..LoopConfig::default()
    };

    Ok(Launch::Run(AppWiring {
        config,
        menu,
        level_factory,
        script,
        snapshot_path: options.snapshot,
    }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_play_config(path: &Path) -> Result<PlayConfig, BootstrapError> {
    let config_error = |message: String| BootstrapError::PlayConfig {
        path: path.to_path_buf(),
        message,
    };
    let raw = fs::read_to_string(path).map_err(|error| config_error(error.to_string()))?;
    PlayConfig::from_json(&raw).map_err(config_error)
}

pub(crate) fn parse_args(args: &[String]) -> Result<CliCommand, BootstrapError> {
    let mut options = CliOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "--level" => {
                let value = flag_value(args, index, "--level")?;
                let number = value
                    .parse::<usize>()
                    .ok()
                    .filter(|number| *number > 0)
                    .ok_or_else(|| {
                        usage_error(format!(
                            "invalid --level value '{value}' (expected a level number from 1)"
                        ))
                    })?;
                options.level = Some(number - 1);
                index += 2;
            }
            "--ticks" => {
                let value = flag_value(args, index, "--ticks")?;
                let ticks = value.parse::<u64>().map_err(|_| {
                    usage_error(format!("invalid --ticks value '{value}' (expected u64)"))
                })?;
                options.ticks = Some(ticks);
                index += 2;
            }
            "--script" => {
                options.script = Some(PathBuf::from(flag_value(args, index, "--script")?));
                index += 2;
            }
            "--snapshot" => {
                options.snapshot = Some(PathBuf::from(flag_value(args, index, "--snapshot")?));
                index += 2;
            }
            "--config" => {
                options.config = Some(PathBuf::from(flag_value(args, index, "--config")?));
                index += 2;
            }
            "--realtime" => {
                options.realtime = true;
                index += 1;
            }
            other => return Err(usage_error(format!("unknown argument '{other}'"))),
        }
    }
    Ok(CliCommand::Run(options))
}

fn flag_value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str, BootstrapError> {
    args.get(index + 1)
        .map(String::as_str)
        .ok_or_else(|| usage_error(format!("missing value for {flag}")))
}

fn usage_error(message: String) -> BootstrapError {
    BootstrapError::Usage(message)
}

pub(crate) fn usage() -> String {
    [
        "game - headless side-scrolling platformer",
        "",
        "Usage:",
        "  game [--level <n>] [--ticks <u64>] [--script <file>] [--snapshot <file>] [--config <file>] [--realtime]",
        "",
        "Options:",
        "  --level <n>        start directly in level n (1-based) instead of the menu",
        "  --ticks <u64>      stop after this many ticks (default 600 unless --realtime)",
        "  --script <file>    feed '<tick> <ACTION> <START|END>' lines as input",
        "  --snapshot <file>  write the final render snapshot as JSON",
        "  --config <file>    JSON overrides for the play config",
        "  --realtime         pace ticks at 60 per second",
        "",
        "Environment:",
        "  SIDESCROLL_ROOT    project root containing assets/",
        "  RUST_LOG           log filter (default info)",
    ]
    .join("\n")
}
