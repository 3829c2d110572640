use std::fs;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use engine::{
    run_headless, AppError, LoopMetricsSnapshot, RenderSnapshot, RunSummary, SceneKey, StopReason,
};
use serde::Serialize;
use tracing::{error, info};

use super::bootstrap::AppWiring;

/// On-disk form of a finished run, written by `--snapshot`.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    ticks_run: u64,
    stop_reason: StopReason,
    final_scene: SceneKey,
    metrics: LoopMetricsSnapshot,
    snapshot: &'a RenderSnapshot,
}

impl<'a> From<&'a RunSummary> for RunReport<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        Self {
            ticks_run: summary.ticks_run,
            stop_reason: summary.stop_reason,
            final_scene: summary.final_scene,
            metrics: summary.metrics,
            snapshot: &summary.final_snapshot,
        }
    }
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_and_report(app) {
        error!(error = %err, "run_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_and_report(app: AppWiring) -> Result<(), AppError> {
    let summary = run_headless(app.config, app.menu, app.level_factory, &app.script)?;
    info!(
        ticks_run = summary.ticks_run,
        reason = ?summary.stop_reason,
        scene = ?summary.final_scene,
        lives = ?summary.final_snapshot.lives,
        entity_count = summary.final_snapshot.entities.len(),
        "run_summary"
    );

    if let Some(path) = &app.snapshot_path {
        write_report(path, &RunReport::from(&summary))?;
        info!(path = %path.display(), "snapshot_written");
    }
    Ok(())
}

fn write_report(path: &Path, report: &RunReport<'_>) -> Result<(), AppError> {
    let write_error = |source: io::Error| AppError::WriteSnapshot {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|error| write_error(io::Error::from(error)))?;
    fs::write(path, json).map_err(write_error)
}
