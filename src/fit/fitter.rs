//! Exhaustive grid-search least-squares fitter.
//!
//! Every candidate combination of slider indices is evaluated independently,
//! so the search parallelizes over the linear candidate index with rayon.
//! Ties on the residual sum are broken by the lower linear index, which makes
//! the parallel reduction return exactly the candidate a sequential
//! first-minimum scan would keep.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::domain::{
    AppMode, DataPoint, FitOptions, FitOutcome, FittedParam, FreeParam, GridMode, Observable,
    Params, ScaleMode, Species,
};
use crate::error::AppError;
use crate::fit::grid::{self, SliderGrid};
use crate::fit::residual::sum_squared_residuals;
use crate::models;

/// Cap on local-mode rounds. Each round moves every index by at most the
/// window half-width, so the cap bounds total drift; hitting it returns the
/// best candidate found so far instead of iterating forever on a plateau.
const MAX_LOCAL_ROUNDS: usize = 32;

struct Candidate {
    linear: u64,
    indices: Vec<u32>,
    srsum: f64,
}

/// Run a grid-search fit of `free` against `data`, starting from `params`.
///
/// All fixed parameters are read from `params`; the free ones are swept over
/// their slider-index ranges per `opts.grid_mode`. Candidates whose model
/// evaluation fails at any data point, or whose residual sum is degenerate,
/// are skipped; if every candidate is skipped the fit fails with a numeric
/// error.
pub fn run_fit(
    mode: AppMode,
    params: &Params,
    free: &[FreeParam],
    data: &[DataPoint],
    opts: &FitOptions,
) -> Result<FitOutcome, AppError> {
    if data.is_empty() {
        return Err(AppError::insufficient("There are no data points."));
    }
    if free.is_empty() {
        return Err(AppError::insufficient(
            "There are no free parameters to optimise.",
        ));
    }
    if data.len() < free.len() {
        return Err(AppError::insufficient(
            "The number of data points is smaller than the number of free parameters.",
        ));
    }
    match opts.observable {
        Observable::Species(i) if i >= mode.species_len() => {
            return Err(AppError::usage(format!(
                "species index {i} out of range for {} ({} species)",
                mode.display_name(),
                mode.species_len()
            )));
        }
        Observable::Specificity if mode != AppMode::CompetingReceptors => {
            return Err(AppError::usage(
                "specificity is only defined for competing receptors",
            ));
        }
        _ => {}
    }

    match opts.grid_mode {
        GridMode::Coarse => {
            let start: Vec<u32> = free.iter().map(|f| f.start).collect();
            let pass1 = grid::first_pass(GridMode::Coarse, free, &start);
            let best = search_grid(mode, params, free, data, opts, &pass1)?;
            let pass2 = grid::refine_pass(free, &best.indices);
            let best = search_grid(mode, params, free, data, opts, &pass2)?;
            Ok(outcome(free, best, 1))
        }
        GridMode::Medium => {
            let start: Vec<u32> = free.iter().map(|f| f.start).collect();
            let pass = grid::first_pass(GridMode::Medium, free, &start);
            let best = search_grid(mode, params, free, data, opts, &pass)?;
            Ok(outcome(free, best, 1))
        }
        GridMode::Local => {
            let mut current: Vec<u32> = free.iter().map(|f| f.start).collect();
            let mut rounds = 0;
            loop {
                rounds += 1;
                let pass = grid::first_pass(GridMode::Local, free, &current);
                let best = search_grid(mode, params, free, data, opts, &pass)?;
                if best.indices == current || rounds >= MAX_LOCAL_ROUNDS {
                    return Ok(outcome(free, best, rounds));
                }
                current = best.indices;
            }
        }
    }
}

fn outcome(free: &[FreeParam], best: Candidate, rounds: usize) -> FitOutcome {
    let fitted = free
        .iter()
        .zip(best.indices.iter())
        .map(|(f, &index)| FittedParam {
            id: f.id,
            index,
            value: f.scale.value(index),
        })
        .collect();
    FitOutcome {
        fitted,
        srsum: best.srsum,
        rounds,
    }
}

/// Evaluate every candidate on `pass` and return the minimizer.
fn search_grid(
    mode: AppMode,
    params: &Params,
    free: &[FreeParam],
    data: &[DataPoint],
    opts: &FitOptions,
    pass: &SliderGrid,
) -> Result<Candidate, AppError> {
    (0..pass.total())
        .into_par_iter()
        .filter_map(|linear| {
            let mut indices = vec![0u32; free.len()];
            pass.decode(linear, &mut indices);

            let mut candidate = params.clone();
            for (f, &index) in free.iter().zip(indices.iter()) {
                candidate.set(f.id, f.scale.value(index));
            }

            let srsum = objective(mode, &candidate, data, opts)?;
            Some(Candidate {
                linear,
                indices,
                srsum,
            })
        })
        .min_by(|a, b| {
            a.srsum
                .partial_cmp(&b.srsum)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.linear.cmp(&b.linear))
        })
        .ok_or_else(|| {
            AppError::numeric("no parameter combination produced a finite residual sum")
        })
}

/// Residual sum for one candidate parameter vector, or `None` when any data
/// point cannot be predicted under it.
fn objective(mode: AppMode, params: &Params, data: &[DataPoint], opts: &FitOptions) -> Option<f64> {
    let mut predicted = Vec::with_capacity(data.len());
    for point in data {
        let species = models::evaluate(mode, opts.x_axis, params, point.x).ok()?;
        let y = observable_value(&species, mode, opts.scale, opts.observable)?;
        if !y.is_finite() {
            return None;
        }
        predicted.push(DataPoint { x: point.x, y });
    }
    sum_squared_residuals(data, &predicted, opts.logarithmic)
}

/// Project one model evaluation onto the observed quantity.
///
/// Fraction scaling divides by the stoichiometry-weighted total, except in
/// competing-receptors mode where outputs stay absolute (the conserved
/// species differ per output there, so a single divisor would be wrong).
pub fn observable_value(
    species: &Species,
    mode: AppMode,
    scale: ScaleMode,
    observable: Observable,
) -> Option<f64> {
    match observable {
        Observable::Specificity => species.specificity,
        Observable::Species(i) => {
            let d = *species.concentrations.get(i)?;
            match scale {
                ScaleMode::Absolute | ScaleMode::Specificity => Some(d),
                ScaleMode::Fraction if mode == AppMode::CompetingReceptors => Some(d),
                ScaleMode::Fraction => Some(d / species.weighted_total() * species.stoich[i] as f64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamId;
    use crate::models::ligand_total;

    /// Noise-free titration curve: [PL] vs total ligand, absolute scale.
    fn synthetic_ligand_data(e0: f64, kd: f64) -> Vec<DataPoint> {
        let scale = crate::domain::SliderScale::concentration();
        (0..=240)
            .step_by(20)
            .map(|i| {
                let s0 = scale.value(i);
                let pl = ligand_total(e0, s0, kd).unwrap().concentrations[0];
                DataPoint { x: s0, y: pl }
            })
            .collect()
    }

    fn kd_fit_options(grid_mode: GridMode) -> FitOptions {
        FitOptions {
            grid_mode,
            ..FitOptions::default()
        }
    }

    #[test]
    fn rejects_empty_inputs_with_exit_code_3() {
        let free = vec![FreeParam::standard(ParamId::Kd)];
        let data = vec![DataPoint { x: 1e-6, y: 1e-7 }];

        let err = run_fit(
            AppMode::Ligand,
            &Params::default(),
            &free,
            &[],
            &FitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let err = run_fit(
            AppMode::Ligand,
            &Params::default(),
            &[],
            &data,
            &FitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);

        let two_free = vec![
            FreeParam::standard(ParamId::Kd),
            FreeParam::standard(ParamId::TotalProtein),
        ];
        let err = run_fit(
            AppMode::Ligand,
            &Params::default(),
            &two_free,
            &data,
            &FitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn rejects_invalid_observable_with_exit_code_2() {
        let free = vec![FreeParam::standard(ParamId::Kd)];
        let data = vec![DataPoint { x: 1e-6, y: 1e-7 }];

        let opts = FitOptions {
            observable: Observable::Species(7),
            ..FitOptions::default()
        };
        let err = run_fit(AppMode::Ligand, &Params::default(), &free, &data, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let opts = FitOptions {
            observable: Observable::Specificity,
            ..FitOptions::default()
        };
        let err = run_fit(AppMode::Ligand, &Params::default(), &free, &data, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn medium_grid_recovers_kd_exactly() {
        // Data generated at the on-grid value K_D = 1e-5 (slider index 120);
        // an exhaustive step-1 sweep must land on it with zero residual.
        let e0 = 1e-6;
        let kd = crate::domain::SliderScale::concentration().value(120);
        let data = synthetic_ligand_data(e0, kd);
        let free = vec![FreeParam::standard(ParamId::Kd)];

        let outcome = run_fit(
            AppMode::Ligand,
            &Params {
                total_protein: e0,
                ..Params::default()
            },
            &free,
            &data,
            &kd_fit_options(GridMode::Medium),
        )
        .unwrap();

        assert_eq!(outcome.fitted[0].index, 120);
        assert_eq!(outcome.fitted[0].id, ParamId::Kd);
        assert!(outcome.srsum < 1e-24, "srsum = {:e}", outcome.srsum);
        assert_eq!(outcome.rounds, 1);
    }

    #[test]
    fn coarse_grid_matches_medium_on_grid_multiple() {
        // 120 is a multiple of the coarse step, so the first pass already
        // finds it and the refinement pass confirms it.
        let e0 = 1e-6;
        let kd = crate::domain::SliderScale::concentration().value(120);
        let data = synthetic_ligand_data(e0, kd);
        let free = vec![FreeParam::standard(ParamId::Kd)];
        let params = Params {
            total_protein: e0,
            ..Params::default()
        };

        let coarse = run_fit(
            AppMode::Ligand,
            &params,
            &free,
            &data,
            &kd_fit_options(GridMode::Coarse),
        )
        .unwrap();
        assert_eq!(coarse.fitted[0].index, 120);
    }

    #[test]
    fn local_grid_walks_to_the_minimum() {
        let e0 = 1e-6;
        let kd = crate::domain::SliderScale::concentration().value(120);
        let data = synthetic_ligand_data(e0, kd);
        let free = vec![FreeParam {
            start: 105,
            ..FreeParam::standard(ParamId::Kd)
        }];

        let outcome = run_fit(
            AppMode::Ligand,
            &Params {
                total_protein: e0,
                ..Params::default()
            },
            &free,
            &data,
            &kd_fit_options(GridMode::Local),
        )
        .unwrap();

        // 105 -> 110 -> 115 -> 120 and a confirming round, at most.
        assert_eq!(outcome.fitted[0].index, 120);
        assert!(outcome.rounds >= 2 && outcome.rounds <= MAX_LOCAL_ROUNDS);
    }

    #[test]
    fn all_degenerate_candidates_fail_with_exit_code_4() {
        // Negative observed y makes every logarithmic residual degenerate.
        let data = vec![
            DataPoint { x: 1e-7, y: -1.0 },
            DataPoint { x: 1e-6, y: -1.0 },
        ];
        let free = vec![FreeParam::standard(ParamId::Kd)];
        let opts = FitOptions {
            logarithmic: true,
            grid_mode: GridMode::Medium,
            ..FitOptions::default()
        };

        let err = run_fit(AppMode::Ligand, &Params::default(), &free, &data, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn fraction_scale_divides_by_weighted_total() {
        let species = ligand_total(1e-6, 1e-6, 1e-7).unwrap();
        let absolute =
            observable_value(&species, AppMode::Ligand, ScaleMode::Absolute, Observable::Species(0))
                .unwrap();
        let fraction =
            observable_value(&species, AppMode::Ligand, ScaleMode::Fraction, Observable::Species(0))
                .unwrap();
        assert!((fraction - absolute / 1e-6).abs() < 1e-12);

        // Competing receptors keep absolute values even under fraction scale.
        let species = crate::models::competing_ligands_free(
            1e-7,
            1e-6,
            1e-6,
            1e-8,
            1e-6,
            crate::domain::CompetingShape::Receptors,
        );
        let kept = observable_value(
            &species,
            AppMode::CompetingReceptors,
            ScaleMode::Fraction,
            Observable::Species(0),
        )
        .unwrap();
        assert_eq!(kept, species.concentrations[0]);
    }

    #[test]
    fn specificity_observable_reads_the_dedicated_field() {
        let species = crate::models::competing_ligands_free(
            1e-7,
            1e-6,
            1e-6,
            1e-8,
            1e-6,
            crate::domain::CompetingShape::Receptors,
        );
        let y = observable_value(
            &species,
            AppMode::CompetingReceptors,
            ScaleMode::Specificity,
            Observable::Specificity,
        )
        .unwrap();
        assert_eq!(y, species.specificity.unwrap());
    }
}
