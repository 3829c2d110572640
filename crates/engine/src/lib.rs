use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
pub mod sim;

pub use app::{
    run_headless, run_headless_with_metrics, Action, ActionName, ActionPhase, AppError,
    DebugToggles, InputScript, LevelFactory, LoopConfig, LoopMetricsSnapshot, MenuView,
    MetricsHandle, RenderSnapshot, RunSummary, Scene, SceneCommand, SceneKey, SceneLoadError,
    SceneMachine, ScriptError, StopReason,
};
pub use content::{
    AssetCatalog, ContentCompileError, ContentErrorCode, LevelDescription, LevelError,
    LevelWarning, LevelWarningKind, PlayerConfig, SourceLocation, SpawnDirective,
};
pub use sim::{EntityId, EntityManager, EntityTag, Vec2};

pub const ROOT_ENV_VAR: &str = "SIDESCROLL_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub base_content_dir: PathBuf,
    pub levels_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to list levels in {path}: {source}")]
    ReadLevelsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "SIDESCROLL_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/sidescroller\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        Self {
            base_content_dir: assets_dir.join("base"),
            levels_dir: assets_dir.join("levels"),
            assets_dir,
            root,
        }
    }

    /// `levelN.txt` files in the levels directory, ordered by N.
    pub fn discover_levels(&self) -> Result<Vec<PathBuf>, StartupError> {
        let read_error = |source| StartupError::ReadLevelsDir {
            path: self.levels_dir.clone(),
            source,
        };
        let mut numbered = Vec::<(u32, PathBuf)>::new();
        for entry in fs::read_dir(&self.levels_dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if let Some(number) = level_number(&path) {
                numbered.push((number, path));
            }
        }
        numbered.sort();
        Ok(numbered.into_iter().map(|(_, path)| path).collect())
    }
}

fn level_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("level")?
        .parse::<u32>()
        .ok()
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    resolve_root().map(AppPaths::from_root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
