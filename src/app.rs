//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that
//! parses arguments, wires the session configuration together, runs the
//! requested operation, and prints or exports the results.

use std::fs;

use clap::Parser;

use crate::cli::{Cli, Command, CurveArgs, FitArgs, ModelArgs, ObservableArgs, SampleArgs};
use crate::data::{self, SampleConfig};
use crate::domain::{
    AppMode, FitOptions, FreeParam, GridMode, Observable, ParamId, Params, SliderScale,
    SLIDER_STEPS,
};
use crate::error::AppError;
use crate::fit;
use crate::io::{export, ingest};
use crate::models;
use crate::report;

/// Entry point for the `kd` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Curve(args) => handle_curve(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn params_from_args(args: &ModelArgs) -> Result<Params, AppError> {
    let params = Params {
        total_protein: args.total_protein,
        total_ligand: args.total_ligand,
        total_competitor: args.total_competitor,
        kd: args.kd,
        kd2: args.kd2,
    };
    for (name, v) in [
        ("--total-protein", params.total_protein),
        ("--total-ligand", params.total_ligand),
        ("--total-competitor", params.total_competitor),
        ("--kd", params.kd),
        ("--kd2", params.kd2),
    ] {
        if !(v.is_finite() && v > 0.0) {
            return Err(AppError::usage(format!(
                "{name} must be a positive finite concentration, got {v}"
            )));
        }
    }
    Ok(params)
}

fn observable_from_args(args: &ObservableArgs) -> Observable {
    if args.specificity {
        Observable::Specificity
    } else {
        Observable::Species(args.species)
    }
}

/// Build the free-parameter list from `--free` ids and positional `--start`
/// indices. Fewer starts than free parameters is fine (the rest keep the
/// default); more is a usage error, since a misaligned list would silently
/// shift every start.
fn free_params_from_args(ids: &[ParamId], starts: &[u32]) -> Result<Vec<FreeParam>, AppError> {
    if starts.len() > ids.len() {
        return Err(AppError::usage(format!(
            "{} --start values given for {} free parameter(s).",
            starts.len(),
            ids.len()
        )));
    }

    let mut free: Vec<FreeParam> = Vec::new();
    for id in ids {
        if free.iter().any(|f| f.id == *id) {
            return Err(AppError::usage(format!(
                "Parameter '{}' is listed as free more than once.",
                id.display_name()
            )));
        }
        free.push(FreeParam::standard(*id));
    }
    for (f, &start) in free.iter_mut().zip(starts) {
        if start > SLIDER_STEPS {
            return Err(AppError::usage(format!(
                "--start index {start} is outside the slider range 0..={SLIDER_STEPS}"
            )));
        }
        f.start = start;
    }
    Ok(free)
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let params = params_from_args(&args.model)?;
    let free = free_params_from_args(&args.free, &args.start)?;

    let opts = FitOptions {
        grid_mode: args.grid,
        scale: args.observable.scale,
        x_axis: args.model.x_axis,
        observable: observable_from_args(&args.observable),
        logarithmic: args.logarithmic,
    };

    let parsed = ingest::load_datapoints(&args.data)?;
    let outcome = fit::run_fit(args.model.mode, &params, &free, &parsed.points, &opts)?;

    print!(
        "{}",
        report::format_run_summary(
            args.model.mode,
            &opts,
            &outcome,
            parsed.points.len(),
            parsed.line_errors.len(),
        )
    );

    if let Some(path) = args.export {
        let path = path.unwrap_or_else(export::default_report_path);
        let fit_report =
            export::FitReport::new(args.model.mode, &opts, &params, &outcome, parsed.points.len());
        export::write_report_json(&path, &fit_report)?;
        println!("Report written to '{}'.", path.display());
    }

    Ok(())
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    if args.step == 0 {
        return Err(AppError::usage("--step must be >= 1"));
    }
    let params = params_from_args(&args.model)?;
    let scale = SliderScale::concentration();

    let mut rows = Vec::new();
    let mut failed = 0usize;
    let mut index = 0;
    while index <= SLIDER_STEPS {
        let x = scale.value(index);
        match models::evaluate(args.model.mode, args.model.x_axis, &params, x) {
            Ok(species) => rows.push((x, species)),
            Err(_) => failed += 1,
        }
        index += args.step;
    }

    if rows.is_empty() {
        return Err(AppError::numeric(
            "The model could not be evaluated anywhere on the concentration range.",
        ));
    }

    print!("{}", report::format_curve_table(args.model.mode, &rows));
    if failed > 0 {
        eprintln!("({failed} x-values could not be evaluated and were skipped)");
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        mode: args.model.mode,
        params: params_from_args(&args.model)?,
        opts: FitOptions {
            scale: args.observable.scale,
            x_axis: args.model.x_axis,
            observable: observable_from_args(&args.observable),
            // Noise model and residual mode are independent choices; the
            // grid mode is unused here.
            grid_mode: GridMode::Coarse,
            logarithmic: false,
        },
        count: args.count,
        seed: args.seed,
        noise: args.noise,
    };

    if config.opts.observable == Observable::Specificity
        && config.mode != AppMode::CompetingReceptors
    {
        return Err(AppError::usage(
            "specificity is only defined for competing receptors",
        ));
    }

    let points = data::generate_sample(&config)?;

    let mut out = String::new();
    for p in &points {
        out.push_str(&format!("{:e} {:e}\n", p.x, p.y));
    }

    match &args.output {
        Some(path) => {
            fs::write(path, out).map_err(|e| {
                AppError::usage(format!("Failed to write '{}': {e}", path.display()))
            })?;
            println!("Wrote {} points to '{}'.", points.len(), path.display());
        }
        None => print!("{out}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_indices_apply_in_free_order() {
        let free = free_params_from_args(&[ParamId::Kd, ParamId::TotalProtein], &[100]).unwrap();
        assert_eq!(free[0].start, 100);
        // Unlisted starts keep the default.
        assert_eq!(free[1].start, SLIDER_STEPS / 2);
    }

    #[test]
    fn surplus_start_values_are_a_usage_error() {
        let err = free_params_from_args(&[ParamId::Kd], &[100, 110]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn duplicate_free_parameters_are_a_usage_error() {
        let err = free_params_from_args(&[ParamId::Kd, ParamId::Kd], &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn out_of_range_start_is_a_usage_error() {
        let err = free_params_from_args(&[ParamId::Kd], &[SLIDER_STEPS + 1]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
