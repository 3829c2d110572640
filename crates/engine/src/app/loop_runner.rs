use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::content::ContentCompileError;
use crate::StartupError;

use super::input::{InputScript, ScriptError};
use super::metrics::{LoopMetricsSnapshot, MetricsAccumulator};
use super::scene::{
    LevelFactory, RenderSnapshot, Scene, SceneCommand, SceneKey, SceneLoadError, SceneMachine,
};
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Stop after this many ticks. Required unless `realtime` is set.
    pub max_ticks: Option<u64>,
    pub metrics_log_interval: Duration,
    /// Sleep so ticks are spaced `1 / target_tps` apart in wall-clock time.
    pub realtime: bool,
    /// Skip the menu and start this level right after the menu has loaded.
    pub initial_level: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            metrics_log_interval: Duration::from_secs(1),
            realtime: false,
            initial_level: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to compile asset catalog: {0}")]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    SceneLoad(#[from] SceneLoadError),
    #[error("failed to write snapshot to {path}: {source}")]
    WriteSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a headless run needs either a tick limit or realtime pacing")]
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Quit,
    TickLimit,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub stop_reason: StopReason,
    pub final_scene: SceneKey,
    pub final_snapshot: RenderSnapshot,
    pub metrics: LoopMetricsSnapshot,
}

pub fn run_headless(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    level_factory: LevelFactory,
    script: &InputScript,
) -> Result<RunSummary, AppError> {
    let metrics_handle = MetricsHandle::default();
    run_headless_with_metrics(config, menu, level_factory, script, metrics_handle)
}

pub fn run_headless_with_metrics(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    level_factory: LevelFactory,
    script: &InputScript,
    metrics_handle: MetricsHandle,
) -> Result<RunSummary, AppError> {
    if config.max_ticks.is_none() && !config.realtime {
        return Err(AppError::Unbounded);
    }

    let target_tps = config.target_tps.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);

    let mut scenes = SceneMachine::new(menu, level_factory);
    scenes.load_active();
    info!(
        scene = ?scenes.active_scene(),
        entity_count = scenes.active_world().entity_count(),
        "scene_loaded"
    );
    if let Some(index) = config.initial_level {
        scenes.apply_command(SceneCommand::StartLevel(index));
    }
    info!(
        target_tps,
        max_ticks = ?config.max_ticks,
        realtime = config.realtime,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        script_actions = script.len(),
        "loop_config"
    );

    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut tick: u64 = 0;
    let stop_reason = loop {
        if !scenes.is_running() {
            break StopReason::Quit;
        }
        if config.max_ticks.is_some_and(|max_ticks| tick >= max_ticks) {
            break StopReason::TickLimit;
        }

        let tick_start = Instant::now();
        deliver_actions(&mut scenes, script, tick);
        if !scenes.is_running() {
            break StopReason::Quit;
        }
        scenes.update_active();
        tick = tick.saturating_add(1);
        let entity_count = scenes.active_world().entity_count();
        metrics_accumulator.record_tick(tick_start.elapsed(), entity_count);

        let now = Instant::now();
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
            metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                worst_tick_ms = snapshot.worst_tick_ms,
                entity_count = snapshot.entity_count,
                scene = ?scenes.active_scene(),
                title = ?scenes.debug_title_active(),
                "loop_metrics"
            );
        }

        if config.realtime {
            let pacing_sleep =
                compute_pacing_sleep(now.saturating_duration_since(tick_start), fixed_dt);
            if pacing_sleep > Duration::ZERO {
                thread::sleep(pacing_sleep);
            }
        }
    };

    metrics_handle.publish(metrics_accumulator.flush(Instant::now()));
    let summary = RunSummary {
        ticks_run: tick,
        stop_reason,
        final_scene: scenes.active_scene(),
        final_snapshot: scenes.render_active(),
        metrics: metrics_handle.snapshot(),
    };
    scenes.shutdown_all();
    info!(
        ticks_run = summary.ticks_run,
        reason = ?summary.stop_reason,
        scene = ?summary.final_scene,
        "shutdown"
    );
    Ok(summary)
}

/// Delivers this tick's scripted actions. Once an action switches scenes the
/// rest are dropped, since they were aimed at the scene that just went away.
fn deliver_actions(scenes: &mut SceneMachine, script: &InputScript, tick: u64) {
    let mut actions = script.actions_at(tick);
    while let Some(action) = actions.next() {
        debug!(tick, action = %action, "action_delivered");
        if scenes.handle_action(action) {
            let dropped = actions.by_ref().count();
            if dropped > 0 {
                debug!(tick, dropped, "actions_dropped_after_scene_switch");
            }
            break;
        }
        if !scenes.is_running() {
            break;
        }
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
