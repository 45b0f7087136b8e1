//! Closed-form and semi-analytic equilibrium solvers.
//!
//! Each function maps concentrations and dissociation constants to the
//! species concentrations at equilibrium, paired with the stoichiometric
//! weights used when aggregating mass or molar fraction.
//!
//! Failure policy: a physically invalid result (negative concentration, root
//! outside its interval) is reported as a `ModelError`, never clamped. The
//! fitter excludes failed evaluations from the search instead of letting
//! garbage values win a minimization.

use crate::domain::{AppMode, CompetingShape, Params, Species, XAxis};
use crate::math::Cubic;

/// Numeric failure inside a model evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// A computed concentration came out negative (or NaN).
    NegativeConcentration,
    /// The resolved free-species root fell outside `[0, total)`.
    RootOutOfRange,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NegativeConcentration => write!(f, "negative concentration"),
            ModelError::RootOutOfRange => write!(f, "root outside the physical interval"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Single ligand, parameterized by the free ligand concentration.
///
/// Returns `[PL, P]`, weights `[1, 1]`.
pub fn ligand_free(total_protein: f64, free_ligand: f64, kd: f64) -> Species {
    let pl = total_protein * free_ligand / (free_ligand + kd);
    Species::new(vec![pl, total_protein - pl], vec![1, 1])
}

/// Single ligand, parameterized by the total ligand concentration.
///
/// Returns `[PL, P, L]`, weights `[1, 1, 0]`.
///
/// Solves the binding quadratic for `[PL]` first:
///
/// `m = (S0 + E0 + K_D) / 2`, `[PL] = m - sqrt(m^2 - S0*E0)`
///
/// Solving for `[L]` first instead loses precision catastrophically as
/// `[L] -> 0`; this form never does over the supported parameter ranges, so
/// the choice is a correctness contract rather than an optimization.
pub fn ligand_total(total_protein: f64, total_ligand: f64, kd: f64) -> Result<Species, ModelError> {
    let minus_b = (total_ligand + total_protein + kd) / 2.0;
    let pl = minus_b - (minus_b * minus_b - total_ligand * total_protein).sqrt();
    let p = total_protein - pl;
    let l = total_ligand - pl;

    // Negated comparison so NaN (e.g. from a rounded-negative discriminant)
    // also lands in the error branch.
    if !(pl >= 0.0 && p >= 0.0 && l >= 0.0) {
        return Err(ModelError::NegativeConcentration);
    }

    Ok(Species::new(vec![pl, p, l], vec![1, 1, 0]))
}

/// Homodimer, parameterized by the free monomer concentration.
///
/// Returns `[P2, P]`, weights `[2, 1]`.
pub fn homodimer_free(free_protein: f64, kd: f64) -> Species {
    Species::new(vec![free_protein * free_protein / kd, free_protein], vec![2, 1])
}

/// Homodimer, parameterized by the total monomer concentration.
///
/// Returns `[P2, P]`, weights `[2, 1]`, using the closed-form quadratic
/// `P = (-K_D + sqrt(K_D^2 + 8*K_D*E0)) / 4`.
pub fn homodimer_total(total_protein: f64, kd: f64) -> Species {
    let p = (-kd + (kd * kd + 8.0 * kd * total_protein).sqrt()) / 4.0;
    Species::new(vec![p * p / kd, p], vec![2, 1])
}

/// Competing ligands, parameterized by the free concentration of the shared
/// species A.
///
/// Output shape depends on `shape`:
/// - `Ligands`: `[AB, AC, A, B, C]`, weights `[1, 1, 1, 0, 0]`
/// - `Receptors`: `[AB, AC, B, C, A]`, weights `[1, 1, 1, 1, 0]`, with the
///   specificity ratio `AB/AC` in the dedicated field
pub fn competing_ligands_free(
    free_a: f64,
    total_b: f64,
    total_c: f64,
    kd_b: f64,
    kd_c: f64,
    shape: CompetingShape,
) -> Species {
    let ab = total_b * free_a / (free_a + kd_b);
    let ac = total_c * free_a / (free_a + kd_c);
    let b = total_b - ab;
    let c = total_c - ac;

    match shape {
        CompetingShape::Ligands => {
            Species::new(vec![ab, ac, free_a, b, c], vec![1, 1, 1, 0, 0])
        }
        CompetingShape::Receptors => {
            let mut species = Species::new(vec![ab, ac, b, c, free_a], vec![1, 1, 1, 1, 0]);
            species.specificity = Some(ab / ac);
            species
        }
    }
}

/// Competing ligands, parameterized by total concentrations.
///
/// The conservation equations reduce to a cubic in the free-A concentration:
///
/// ```text
/// t1 = 1
/// t2 = K_DC + K_DB + c_C + c_B - c_A
/// t3 = K_DC*K_DB + c_C*K_DB + c_B*K_DC - c_A*K_DC - c_A*K_DB
/// t4 = -c_A*K_DC*K_DB
/// ```
///
/// Newton's method runs first with the total concentration `c_A` as the
/// initial guess (a safe upper bound for the root). Whenever it fails or
/// steps outside `[0, c_A)`, bisection over `[0, c_A)` takes over.
pub fn competing_ligands(
    total_a: f64,
    total_b: f64,
    total_c: f64,
    kd_b: f64,
    kd_c: f64,
    shape: CompetingShape,
) -> Result<Species, ModelError> {
    let cubic = Cubic::new(
        1.0,
        kd_c + kd_b + total_c + total_b - total_a,
        kd_c * kd_b + total_c * kd_b + total_b * kd_c - total_a * kd_c - total_a * kd_b,
        -total_a * kd_c * kd_b,
    );

    let mut free_a = cubic.solve_newton(total_a);

    if !free_a.is_some_and(|a| a >= 0.0 && a < total_a) {
        free_a = Some(cubic.solve_bisection(0.0, total_a));
    }

    let free_a = free_a.ok_or(ModelError::RootOutOfRange)?;
    if !(free_a >= 0.0 && free_a < total_a) {
        return Err(ModelError::RootOutOfRange);
    }

    Ok(competing_ligands_free(free_a, total_b, total_c, kd_b, kd_c, shape))
}

/// Evaluate the model selected by `(mode, x_axis)` at the x-value `x`.
///
/// This is the single dispatch point between the session configuration and
/// the solvers above; everything the model needs besides `x` comes from the
/// explicit parameter vector.
pub fn evaluate(mode: AppMode, x_axis: XAxis, params: &Params, x: f64) -> Result<Species, ModelError> {
    match (mode, x_axis) {
        (AppMode::Ligand, XAxis::Standard) => ligand_total(params.total_protein, x, params.kd),
        (AppMode::Ligand, XAxis::Alternative) => {
            Ok(ligand_free(params.total_protein, x, params.kd))
        }
        (AppMode::Homodimer, XAxis::Standard) => Ok(homodimer_total(x, params.kd)),
        (AppMode::Homodimer, XAxis::Alternative) => Ok(homodimer_free(x, params.kd)),
        (AppMode::CompetingLigands, XAxis::Standard) => competing_ligands(
            x,
            params.total_competitor,
            params.total_ligand,
            params.kd,
            params.kd2,
            CompetingShape::Ligands,
        ),
        // Alternative axis sweeps total B with total A held fixed.
        (AppMode::CompetingLigands, XAxis::Alternative) => competing_ligands(
            params.total_protein,
            x,
            params.total_ligand,
            params.kd,
            params.kd2,
            CompetingShape::Ligands,
        ),
        (AppMode::CompetingReceptors, XAxis::Standard) => competing_ligands(
            x,
            params.total_competitor,
            params.total_ligand,
            params.kd,
            params.kd2,
            CompetingShape::Receptors,
        ),
        // Alternative axis sweeps the free ligand concentration directly.
        (AppMode::CompetingReceptors, XAxis::Alternative) => Ok(competing_ligands_free(
            x,
            params.total_competitor,
            params.total_ligand,
            params.kd,
            params.kd2,
            CompetingShape::Receptors,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs())
    }

    #[test]
    fn ligand_total_conserves_mass() {
        for &(e0, s0, kd) in &[
            (1e-6, 1e-7, 1e-7),
            (1e-6, 1e-6, 1e-9),
            (1e-9, 1e-3, 1e-5),
            (1e-3, 1e-3, 1e-3),
        ] {
            let species = ligand_total(e0, s0, kd).unwrap();
            let (pl, p, l) = (
                species.concentrations[0],
                species.concentrations[1],
                species.concentrations[2],
            );
            assert!(pl >= 0.0);
            assert!(rel_close(pl + p, e0, 1e-9), "protein balance at E0={e0}");
            assert!(rel_close(pl + l, s0, 1e-9), "ligand balance at S0={s0}");
        }
    }

    #[test]
    fn ligand_total_is_stable_at_vanishing_ligand() {
        // As S0 -> 0 the bound complex tends to S0*E0/(E0 + K_D). The stable
        // quadratic must track that limit; the rejected formula (free ligand
        // first) funnels its free-ligand cancellation through the e0 - P
        // subtraction and drifts by orders of magnitude more.
        let (e0, kd) = (1e-6, 1e-9);

        let mut max_stable = 0.0_f64;
        let mut max_naive = 0.0_f64;

        for &s0 in &[1e-13, 3e-14, 1e-14, 3e-15, 1e-15] {
            let reference = s0 * e0 / (e0 + kd);

            let pl = ligand_total(e0, s0, kd).unwrap().concentrations[0];
            max_stable = max_stable.max((pl - reference).abs() / reference);

            // The naive alternative from the supporting information.
            let b = (e0 - s0 + kd) / 2.0;
            let l = -b + (b * b + s0 * kd).sqrt();
            let p = e0 * kd / (l + kd);
            let pl_naive = e0 - p;
            max_naive = max_naive.max((pl_naive - reference).abs() / reference);
        }

        assert!(max_stable < 1e-6, "stable form drifted: rel err {max_stable:e}");
        assert!(
            max_naive > max_stable * 10.0,
            "expected the naive form to lose precision (naive {max_naive:e}, stable {max_stable:e})"
        );
    }

    #[test]
    fn ligand_binding_saturates_monotonically() {
        let (e0, kd) = (1e-6, 1e-7);
        let mut prev = 0.0;
        let mut s0 = 1e-10;
        while s0 <= 1e-6 {
            let pl = ligand_total(e0, s0, kd).unwrap().concentrations[0];
            assert!(pl >= prev, "[PL] must increase with total ligand");
            prev = pl;
            s0 *= 10.0;
        }
        let pl = ligand_total(e0, 1e-3, kd).unwrap().concentrations[0];
        assert!(pl / e0 > 0.99, "saturation: [PL]/E0 = {}", pl / e0);
    }

    #[test]
    fn homodimer_total_conserves_monomer() {
        for &(e0, kd) in &[(1e-6, 1e-7), (1e-8, 1e-4), (1e-3, 1e-9)] {
            let species = homodimer_total(e0, kd);
            let total = 2.0 * species.concentrations[0] + species.concentrations[1];
            assert!(rel_close(total, e0, 1e-9), "2[P2]+[P] != E0 at E0={e0}");
        }
    }

    #[test]
    fn homodimer_free_satisfies_mass_action() {
        let species = homodimer_free(2e-6, 1e-7);
        assert!(rel_close(
            species.concentrations[0],
            2e-6_f64.powi(2) / 1e-7,
            1e-12
        ));
        assert_eq!(species.stoich, vec![2, 1]);
    }

    #[test]
    fn competing_ligands_conserves_all_species() {
        let (ca, cb, cc, kdb, kdc) = (2e-6, 1e-6, 5e-7, 1e-7, 3e-8);
        let species = competing_ligands(ca, cb, cc, kdb, kdc, CompetingShape::Ligands).unwrap();
        let (ab, ac, a, b, c) = (
            species.concentrations[0],
            species.concentrations[1],
            species.concentrations[2],
            species.concentrations[3],
            species.concentrations[4],
        );

        assert!(a >= 0.0 && a < ca);
        // B and C balances are exact by construction; the A balance carries
        // the cubic solver's relative tolerance.
        assert!(rel_close(ab + b, cb, 1e-12));
        assert!(rel_close(ac + c, cc, 1e-12));
        assert!(rel_close(ab + ac + a, ca, 5e-3));
    }

    #[test]
    fn competing_ligands_symmetric_inputs_give_equal_complexes() {
        for &ca in &[1e-8, 1e-7, 1e-6, 1e-5] {
            let species =
                competing_ligands(ca, 1e-6, 1e-6, 1e-7, 1e-7, CompetingShape::Ligands).unwrap();
            assert_eq!(
                species.concentrations[0], species.concentrations[1],
                "AB == AC under symmetric K_D and totals"
            );
        }
    }

    #[test]
    fn competing_ligands_falls_back_to_bisection() {
        // With B and C in massive excess over a large total A, Newton's
        // first-step ratio at the guess c_A exceeds the abort threshold
        // (val/der ~ 15 here), forcing the bisection path.
        let (ca, cb, cc, kdb, kdc) = (30.0, 500.0, 500.0, 1e-7, 1e-7);
        let species = competing_ligands(ca, cb, cc, kdb, kdc, CompetingShape::Ligands).unwrap();
        let (ab, ac, a) = (
            species.concentrations[0],
            species.concentrations[1],
            species.concentrations[2],
        );

        // Nearly all A is bound: the free-A root is ~3e-9.
        assert!(a > 0.0 && a < 1e-8, "free A out of expected range: {a:e}");
        let total = ab + ac + a;
        assert!(
            (total - ca).abs() / ca < 5e-3,
            "A conservation within the bisection tolerance, got {total}"
        );
    }

    #[test]
    fn receptors_shape_reports_specificity() {
        let species =
            competing_ligands_free(1e-7, 1e-6, 1e-6, 1e-8, 1e-6, CompetingShape::Receptors);
        let spec = species.specificity.unwrap();
        let expected = species.concentrations[0] / species.concentrations[1];
        assert_eq!(spec, expected);
        assert!(spec > 1.0, "tighter receptor must win specificity");
        assert_eq!(species.stoich, vec![1, 1, 1, 1, 0]);
    }

    #[test]
    fn ligands_shape_has_no_specificity() {
        let species =
            competing_ligands_free(1e-7, 1e-6, 1e-6, 1e-8, 1e-6, CompetingShape::Ligands);
        assert!(species.specificity.is_none());
    }

    #[test]
    fn evaluate_dispatch_matches_direct_calls() {
        let params = Params::default();

        let via_dispatch = evaluate(AppMode::Ligand, XAxis::Standard, &params, 1e-6).unwrap();
        let direct = ligand_total(params.total_protein, 1e-6, params.kd).unwrap();
        assert_eq!(via_dispatch, direct);

        let via_dispatch = evaluate(AppMode::Homodimer, XAxis::Alternative, &params, 1e-6).unwrap();
        let direct = homodimer_free(1e-6, params.kd);
        assert_eq!(via_dispatch, direct);
    }
}
