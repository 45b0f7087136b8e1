//! Command-line parsing for the equilibrium curve fitter.
//!
//! Argument parsing and command dispatch stay separate from the modeling and
//! fitting code; this module only defines the surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AppMode, GridMode, ParamId, ScaleMode, XAxis};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kd", version, about = "Equilibrium binding curves: simulate, sample, and fit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit free parameters to a dataset by exhaustive grid search.
    Fit(FitArgs),
    /// Print a model curve over the concentration range.
    Curve(CurveArgs),
    /// Generate a synthetic noisy dataset from known parameters.
    Sample(SampleArgs),
}

/// Session options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Binding topology.
    #[arg(short = 'm', long, value_enum, default_value_t = AppMode::Ligand)]
    pub mode: AppMode,

    /// X-axis parameterization (standard sweeps totals, alternative sweeps
    /// the free/second species, depending on the mode).
    #[arg(long, value_enum, default_value_t = XAxis::Standard)]
    pub x_axis: XAxis,

    /// Total protein concentration (total A in competing modes), mol/l.
    #[arg(long, default_value_t = 1e-6)]
    pub total_protein: f64,

    /// Total ligand concentration (total C in competing modes), mol/l.
    #[arg(long, default_value_t = 1e-6)]
    pub total_ligand: f64,

    /// Total competing ligand / second receptor concentration, mol/l.
    #[arg(long, default_value_t = 1e-6)]
    pub total_competitor: f64,

    /// First dissociation constant, mol/l.
    #[arg(long, default_value_t = 1e-7)]
    pub kd: f64,

    /// Second dissociation constant (competing modes), mol/l.
    #[arg(long, default_value_t = 1e-7)]
    pub kd2: f64,
}

/// Observable selection shared by `fit` and `sample`.
#[derive(Debug, Args, Clone)]
pub struct ObservableArgs {
    /// Index of the observed species in the mode's output vector.
    #[arg(long, default_value_t = 0)]
    pub species: usize,

    /// Observe the AB/AC specificity ratio instead of a species
    /// (competing receptors only).
    #[arg(long)]
    pub specificity: bool,

    /// Y-value scaling of the observable.
    #[arg(long, value_enum, default_value_t = ScaleMode::Absolute)]
    pub scale: ScaleMode,
}

/// Options for fitting.
#[derive(Debug, Parser)]
pub struct FitArgs {
    /// Data file: one `x y` pair per line, space or tab separated.
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub observable: ObservableArgs,

    /// Parameter to optimize (repeatable).
    #[arg(short = 'f', long = "free", value_enum)]
    pub free: Vec<ParamId>,

    /// Starting slider index for each free parameter, in `--free` order
    /// (defaults to the middle of the range).
    #[arg(long)]
    pub start: Vec<u32>,

    /// Grid-search strategy.
    #[arg(short = 'g', long, value_enum, default_value_t = GridMode::Coarse)]
    pub grid: GridMode,

    /// Take residuals on ln(observed/predicted) instead of differences.
    #[arg(long)]
    pub logarithmic: bool,

    /// Export a fit report JSON. Without a path a timestamped filename is
    /// used.
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    pub export: Option<Option<PathBuf>>,
}

/// Options for printing a model curve.
#[derive(Debug, Parser)]
pub struct CurveArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Slider-index step between sampled x-values (1 prints all 241 rows).
    #[arg(long, default_value_t = 10)]
    pub step: u32,
}

/// Options for synthetic dataset generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub observable: ObservableArgs,

    /// Number of data points to generate.
    #[arg(short = 'n', long, default_value_t = 25)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the multiplicative log-normal noise.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Write the dataset to a file instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}
