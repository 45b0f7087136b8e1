//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - reloaded later for comparisons
//!
//! All concentrations are in mol/l. "Total" means the conserved amount of a
//! species, "free" the unbound amount at equilibrium; free <= total always.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which binding topology the session models.
///
/// Fixed for the lifetime of a session; every model evaluation and fit is
/// dispatched on this plus the x-axis parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AppMode {
    /// One protein binding one ligand: P + L <-> PL.
    Ligand,
    /// Protein homodimerization: 2P <-> P2.
    Homodimer,
    /// Two ligands competing for one protein: A + B <-> AB, A + C <-> AC.
    CompetingLigands,
    /// Two receptors competing for one ligand. Same equilibria as
    /// `CompetingLigands` with A as the shared ligand; adds the specificity
    /// output `AB/AC`.
    CompetingReceptors,
}

impl AppMode {
    pub fn display_name(self) -> &'static str {
        match self {
            AppMode::Ligand => "ligand binding",
            AppMode::Homodimer => "homodimerization",
            AppMode::CompetingLigands => "competing ligands",
            AppMode::CompetingReceptors => "competing receptors",
        }
    }

    /// Labels of the species concentration vector, in output order.
    pub fn species_labels(self) -> &'static [&'static str] {
        match self {
            AppMode::Ligand => &["[PL]", "[P]"],
            AppMode::Homodimer => &["[P2]", "[P]"],
            AppMode::CompetingLigands => &["[AB]", "[AC]", "[A]", "[B]", "[C]"],
            AppMode::CompetingReceptors => &["[PL]", "[P'L]", "[P]", "[P']", "[L]"],
        }
    }

    /// Number of entries in the species concentration vector.
    pub fn species_len(self) -> usize {
        self.species_labels().len()
    }
}

/// Which quantity runs along the x-axis.
///
/// Per mode:
/// - `Ligand`: total ligand (standard) vs free ligand (alternative)
/// - `Homodimer`: total protein vs free protein
/// - `CompetingLigands`: total A vs total B (with total A fixed)
/// - `CompetingReceptors`: total ligand vs free ligand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum XAxis {
    Standard,
    Alternative,
}

/// How predicted y-values are scaled before the residual is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Raw concentrations (mol/l).
    Absolute,
    /// Molar fraction of the stoichiometry-weighted total.
    Fraction,
    /// Specificity axis (competing receptors only); predictions stay absolute.
    Specificity,
}

/// Grid-search strategy, in slider-index units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// Full range at step 10, then a +/-20 refinement pass at step 1.
    Coarse,
    /// Full range at step 1, single pass.
    Medium,
    /// +/-5 around the current value at step 1, iterated to a fixed point.
    Local,
}

/// Which model output the fit compares against the observed y-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Observable {
    /// Index into the species concentration vector.
    Species(usize),
    /// The `AB/AC` ratio (competing receptors only).
    Specificity,
}

/// Output shape selector for the competing-ligands solvers.
///
/// The two competing topologies share their equilibria but expose different
/// species vectors; the shape is always passed explicitly rather than read
/// from ambient mode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetingShape {
    /// `[AB, AC, A, B, C]`, weights `[1, 1, 1, 0, 0]`.
    Ligands,
    /// `[AB, AC, B, C, A]`, weights `[1, 1, 1, 1, 0]`, plus specificity.
    Receptors,
}

/// Equilibrium species concentrations with their stoichiometric weights.
///
/// Invariant: `concentrations.len() == stoich.len()`. Weights count how many
/// units of the conserved species each entry contributes when aggregating
/// mass or molar fraction (a homodimer counts as 2 protein units).
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub concentrations: Vec<f64>,
    pub stoich: Vec<u32>,
    /// `AB/AC` ratio, present only for the receptors output shape. Derived,
    /// not a concentration, and not part of any conservation sum.
    pub specificity: Option<f64>,
}

impl Species {
    pub fn new(concentrations: Vec<f64>, stoich: Vec<u32>) -> Self {
        debug_assert_eq!(concentrations.len(), stoich.len());
        Self {
            concentrations,
            stoich,
            specificity: None,
        }
    }

    /// Stoichiometry-weighted total, the divisor for molar fractions.
    pub fn weighted_total(&self) -> f64 {
        self.concentrations
            .iter()
            .zip(self.stoich.iter())
            .map(|(&d, &m)| d * m as f64)
            .sum()
    }
}

/// A single observed `(x, y)` pair, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// Identifies one physical parameter of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ParamId {
    /// Total protein (total A in the competing topologies).
    TotalProtein,
    /// Total ligand (total C in the competing topologies).
    TotalLigand,
    /// Total competing ligand B / second receptor.
    TotalCompetitor,
    /// First dissociation constant (A + B in the competing topologies).
    Kd,
    /// Second dissociation constant (A + C).
    Kd2,
}

impl ParamId {
    pub fn display_name(self) -> &'static str {
        match self {
            ParamId::TotalProtein => "total protein",
            ParamId::TotalLigand => "total ligand",
            ParamId::TotalCompetitor => "total competitor",
            ParamId::Kd => "K_D",
            ParamId::Kd2 => "K_D2",
        }
    }
}

/// The full parameter vector of a session.
///
/// The fitter reads a copy at search start and only the returned outcome is
/// written back; core functions never rely on ambient mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub total_protein: f64,
    pub total_ligand: f64,
    pub total_competitor: f64,
    pub kd: f64,
    pub kd2: f64,
}

impl Params {
    pub fn get(&self, id: ParamId) -> f64 {
        match id {
            ParamId::TotalProtein => self.total_protein,
            ParamId::TotalLigand => self.total_ligand,
            ParamId::TotalCompetitor => self.total_competitor,
            ParamId::Kd => self.kd,
            ParamId::Kd2 => self.kd2,
        }
    }

    pub fn set(&mut self, id: ParamId, value: f64) {
        match id {
            ParamId::TotalProtein => self.total_protein = value,
            ParamId::TotalLigand => self.total_ligand = value,
            ParamId::TotalCompetitor => self.total_competitor = value,
            ParamId::Kd => self.kd = value,
            ParamId::Kd2 => self.kd2 = value,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            total_protein: 1e-6,
            total_ligand: 1e-6,
            total_competitor: 1e-6,
            kd: 1e-7,
            kd2: 1e-7,
        }
    }
}

/// Number of steps on a slider index axis (indices run 0..=240).
pub const SLIDER_STEPS: u32 = 240;

/// Exponential mapping between a bounded slider index and a physical value.
///
/// `value(i) = base ^ (min_exp + i * (max_exp - min_exp) / 240)`
///
/// The presentation layer owns which scale each slider uses; the fitter only
/// needs the mapping to enumerate candidate physical values on the quantized
/// grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderScale {
    pub base: f64,
    pub min_exp: f64,
    pub max_exp: f64,
}

impl SliderScale {
    pub fn new(base: f64, min_exp: f64, max_exp: f64) -> Self {
        Self {
            base,
            min_exp,
            max_exp,
        }
    }

    /// The scale shared by every fit-relevant quantity: eight decades from
    /// 1e-9 to 1e-1 mol/l.
    pub fn concentration() -> Self {
        Self::new(10.0, -9.0, -1.0)
    }

    /// Physical value at slider index `index`.
    pub fn value(&self, index: u32) -> f64 {
        self.base
            .powf(self.min_exp + index as f64 * (self.max_exp - self.min_exp) / SLIDER_STEPS as f64)
    }
}

/// One parameter left free for the fitter to optimize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeParam {
    pub id: ParamId,
    pub scale: SliderScale,
    /// Slider index the search starts from (used by `GridMode::Local` and as
    /// the reference the refined value is written back over).
    pub start: u32,
    /// Inclusive slider-index bounds.
    pub min: u32,
    pub max: u32,
}

impl FreeParam {
    /// A free parameter on the standard concentration scale, starting from
    /// the middle of the full slider range.
    pub fn standard(id: ParamId) -> Self {
        Self {
            id,
            scale: SliderScale::concentration(),
            start: SLIDER_STEPS / 2,
            min: 0,
            max: SLIDER_STEPS,
        }
    }
}

/// Options controlling a single fit run.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub grid_mode: GridMode,
    pub scale: ScaleMode,
    pub x_axis: XAxis,
    pub observable: Observable,
    /// Take residuals on `ln(observed/predicted)` instead of differences.
    pub logarithmic: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            grid_mode: GridMode::Coarse,
            scale: ScaleMode::Absolute,
            x_axis: XAxis::Standard,
            observable: Observable::Species(0),
            logarithmic: false,
        }
    }
}

/// One fitted parameter: slider index and the physical value it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParam {
    pub id: ParamId,
    pub index: u32,
    pub value: f64,
}

/// Result of a fit: the minimizing parameter vector and its residual sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub fitted: Vec<FittedParam>,
    /// Achieved sum of squared residuals.
    pub srsum: f64,
    /// Number of search rounds run (1 unless `GridMode::Local` iterated).
    pub rounds: usize,
}
