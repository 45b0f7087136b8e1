//! Read/write fit-report JSON files.
//!
//! The report is the portable record of a fit run: the session configuration,
//! the final parameter vector, and what the search achieved. Enough to
//! reproduce the fitted curve without re-running the search.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AppMode, FitOptions, FitOutcome, FittedParam, GridMode, Observable, Params, ScaleMode, XAxis,
};
use crate::error::AppError;

/// Serialized outcome of one fit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub tool: String,
    pub created: DateTime<Local>,
    pub mode: AppMode,
    pub x_axis: XAxis,
    pub scale: ScaleMode,
    pub observable: Observable,
    pub grid_mode: GridMode,
    pub logarithmic: bool,
    /// Full parameter vector with the fitted values written in.
    pub params: Params,
    pub fitted: Vec<FittedParam>,
    pub srsum: f64,
    pub rounds: usize,
    pub n_points: usize,
}

impl FitReport {
    pub fn new(
        mode: AppMode,
        opts: &FitOptions,
        params: &Params,
        outcome: &FitOutcome,
        n_points: usize,
    ) -> Self {
        let mut params = params.clone();
        for f in &outcome.fitted {
            params.set(f.id, f.value);
        }
        Self {
            tool: "kd".to_string(),
            created: Local::now(),
            mode,
            x_axis: opts.x_axis,
            scale: opts.scale,
            observable: opts.observable,
            grid_mode: opts.grid_mode,
            logarithmic: opts.logarithmic,
            params,
            fitted: outcome.fitted.clone(),
            srsum: outcome.srsum,
            rounds: outcome.rounds,
            n_points,
        }
    }
}

/// Timestamped default report filename in the working directory.
pub fn default_report_path() -> PathBuf {
    PathBuf::from(Local::now().format("fit_%Y-%m-%d_%H-%M-%S.json").to_string())
}

/// Write a fit-report JSON file.
pub fn write_report_json(path: &Path, report: &FitReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create report JSON '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::usage(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a fit-report JSON file.
pub fn read_report_json(path: &Path) -> Result<FitReport, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to open report JSON '{}': {e}",
            path.display()
        ))
    })?;
    let report: FitReport = serde_json::from_reader(file)
        .map_err(|e| AppError::usage(format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
