//! Derived quantities and formatted terminal output.
//!
//! Formatting code lives in one place so the math and fitting modules stay
//! clean and the output layout is easy to change in one spot.

use crate::domain::{AppMode, FitOptions, FitOutcome, GridMode, Observable, ParamId, Species};

/// Molar gas constant, J/(mol*K).
pub const GAS_CONSTANT: f64 = 8.31446261815324;

/// Reference temperature for the free-energy conversion, K.
pub const STANDARD_TEMPERATURE: f64 = 298.15;

/// Thermodynamic quantities derived from a dissociation constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energetics {
    /// Association constant `1/K_D`, l/mol.
    pub ka: f64,
    /// Dissociation free energy `-R*T*ln(K_D)`, kJ/mol.
    pub delta_g: f64,
}

/// Derived quantities for a dissociation constant, `None` when `kd` is not a
/// positive finite concentration.
pub fn energetics(kd: f64) -> Option<Energetics> {
    if !(kd.is_finite() && kd > 0.0) {
        return None;
    }
    Some(Energetics {
        ka: 1.0 / kd,
        delta_g: -GAS_CONSTANT * STANDARD_TEMPERATURE * kd.ln() * 1e-3,
    })
}

/// Scientific notation with a two-decimal mantissa, `1.23*10^-5`. Values of
/// magnitude one stay plain.
pub fn fmt_sci(v: f64) -> String {
    if v == 0.0 || !v.is_finite() {
        return format!("{v:.2}");
    }
    let magnitude = v.abs().log10().floor() as i32;
    if magnitude == 0 {
        return format!("{v:.2}");
    }
    let mantissa = v / 10f64.powi(magnitude);
    format!("{mantissa:.2}*10^{magnitude}")
}

fn observable_label(mode: AppMode, observable: Observable) -> String {
    match observable {
        Observable::Specificity => "specificity".to_string(),
        Observable::Species(i) => mode
            .species_labels()
            .get(i)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("species #{i}")),
    }
}

fn grid_mode_label(mode: GridMode) -> &'static str {
    match mode {
        GridMode::Coarse => "coarse",
        GridMode::Medium => "medium",
        GridMode::Local => "local",
    }
}

/// Format the full run summary: session setup, fitted parameters, and the
/// derived thermodynamics for any fitted dissociation constant.
pub fn format_run_summary(
    mode: AppMode,
    opts: &FitOptions,
    outcome: &FitOutcome,
    n_points: usize,
    skipped_lines: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== kd - equilibrium curve fit ===\n");
    out.push_str(&format!("Mode: {}\n", mode.display_name()));
    out.push_str(&format!(
        "Observable: {}\n",
        observable_label(mode, opts.observable)
    ));
    out.push_str(&format!(
        "Grid: {} | residuals: {}\n",
        grid_mode_label(opts.grid_mode),
        if opts.logarithmic { "logarithmic" } else { "linear" }
    ));
    out.push_str(&format!("Points: n={n_points}"));
    if skipped_lines > 0 {
        out.push_str(&format!(" ({skipped_lines} lines skipped)"));
    }
    out.push('\n');

    out.push_str("\nFitted parameters:\n");
    for f in &outcome.fitted {
        out.push_str(&format!(
            "- {:<16} {} mol/l (slider index {})\n",
            f.id.display_name(),
            fmt_sci(f.value),
            f.index
        ));
        if matches!(f.id, ParamId::Kd | ParamId::Kd2) {
            if let Some(e) = energetics(f.value) {
                out.push_str(&format!(
                    "  {:<15} K_A = {} l/mol | delta_G = {:.2} kJ/mol\n",
                    "", // align under the parameter line
                    fmt_sci(e.ka),
                    e.delta_g
                ));
            }
        }
    }

    out.push_str(&format!(
        "\nResidual sum: {} ({} round{})\n",
        fmt_sci(outcome.srsum),
        outcome.rounds,
        if outcome.rounds == 1 { "" } else { "s" }
    ));

    out
}

/// Format a swept model curve as a fixed-width table, one row per x-value.
pub fn format_curve_table(mode: AppMode, rows: &[(f64, Species)]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:>12}", "x"));
    for label in mode.species_labels() {
        out.push_str(&format!(" {label:>12}"));
    }
    if mode == AppMode::CompetingReceptors {
        out.push_str(&format!(" {:>12}", "AB/AC"));
    }
    out.push('\n');

    for (x, species) in rows {
        out.push_str(&format!("{x:>12.4e}"));
        // Some solvers return more entries than the labeled observables
        // (e.g. the free-ligand tail); the table shows the labeled ones.
        for d in species.concentrations.iter().take(mode.species_len()) {
            out.push_str(&format!(" {d:>12.4e}"));
        }
        if let Some(spec) = species.specificity {
            out.push_str(&format!(" {spec:>12.4e}"));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FittedParam;
    use crate::models::ligand_total;

    #[test]
    fn energetics_of_a_micromolar_site() {
        let e = energetics(1e-6).unwrap();
        assert_eq!(e.ka, 1e6);
        // -R*T*ln(1e-6)*1e-3 = 34.25 kJ/mol at 298.15 K.
        assert!((e.delta_g - 34.25).abs() < 0.01, "delta_G = {}", e.delta_g);
    }

    #[test]
    fn energetics_rejects_non_physical_kd() {
        assert!(energetics(0.0).is_none());
        assert!(energetics(-1e-6).is_none());
        assert!(energetics(f64::NAN).is_none());
    }

    #[test]
    fn fmt_sci_splits_mantissa_and_magnitude() {
        assert_eq!(fmt_sci(2.41e-5), "2.41*10^-5");
        assert_eq!(fmt_sci(1.0), "1.00");
        assert_eq!(fmt_sci(-3.2e6), "-3.20*10^6");
        assert_eq!(fmt_sci(0.0), "0.00");
    }

    #[test]
    fn run_summary_names_the_fitted_parameters() {
        let outcome = FitOutcome {
            fitted: vec![FittedParam {
                id: ParamId::Kd,
                index: 120,
                value: 1e-5,
            }],
            srsum: 2.5e-14,
            rounds: 1,
        };
        let summary =
            format_run_summary(AppMode::Ligand, &FitOptions::default(), &outcome, 13, 2);
        assert!(summary.contains("ligand binding"));
        assert!(summary.contains("K_D"));
        assert!(summary.contains("K_A"));
        assert!(summary.contains("delta_G"));
        assert!(summary.contains("n=13 (2 lines skipped)"));
    }

    #[test]
    fn curve_table_has_one_column_per_species() {
        let rows = vec![(1e-6, ligand_total(1e-6, 1e-6, 1e-7).unwrap())];
        let table = format_curve_table(AppMode::Ligand, &rows);
        let header = table.lines().next().unwrap();
        assert!(header.contains("[PL]"));
        assert!(header.contains("[P]"));
        assert_eq!(table.lines().count(), 2);
    }
}
