mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{Action, ActionName, ActionPhase, InputScript, ScriptError};
pub use loop_runner::{
    run_headless, run_headless_with_metrics, AppError, LoopConfig, RunSummary, StopReason,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{
    DebugToggles, LevelFactory, MenuView, RenderSnapshot, Scene, SceneCommand, SceneKey,
    SceneLoadError, SceneMachine,
};
