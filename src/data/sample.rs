//! Synthetic titration data from a known parameter vector.
//!
//! Samples are laid out log-uniformly across the concentration decades and
//! perturbed with multiplicative log-normal noise, so relative scatter is the
//! same in every decade. With the seed fixed the output is fully
//! deterministic, which makes generated fixtures usable in regression tests.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{AppMode, DataPoint, FitOptions, Params, SliderScale};
use crate::error::AppError;
use crate::fit::observable_value;
use crate::models;

/// Settings for one synthetic dataset.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub mode: AppMode,
    pub params: Params,
    /// Scale, x-axis, and observable are read from here; the grid mode is
    /// ignored.
    pub opts: FitOptions,
    pub count: usize,
    pub seed: u64,
    /// Standard deviation of the log-normal noise factor. Zero gives the
    /// exact model curve.
    pub noise: f64,
}

/// Generate `count` noisy observations of the configured observable.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<DataPoint>, AppError> {
    if config.count == 0 {
        return Err(AppError::usage("Sample count must be > 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::usage("Noise level must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))?;

    let scale = SliderScale::concentration();
    let mut points = Vec::with_capacity(config.count);

    for i in 0..config.count {
        // Log-uniform spacing across the full concentration range.
        let u = if config.count == 1 {
            0.5
        } else {
            i as f64 / (config.count - 1) as f64
        };
        let x = scale
            .base
            .powf(scale.min_exp + u * (scale.max_exp - scale.min_exp));

        let species = models::evaluate(config.mode, config.opts.x_axis, &config.params, x)
            .map_err(|e| AppError::numeric(format!("Model evaluation failed at x = {x:e}: {e}")))?;
        let y = observable_value(&species, config.mode, config.opts.scale, config.opts.observable)
            .ok_or_else(|| {
                AppError::numeric(format!("Observable undefined for the model output at x = {x:e}"))
            })?;
        if !y.is_finite() {
            return Err(AppError::numeric(format!(
                "Non-finite model output at x = {x:e}"
            )));
        }

        let z = normal.sample(&mut rng);
        let y_obs = y * (config.noise * z).exp();

        points.push(DataPoint { x, y: y_obs });
    }

    Ok(points)
}
