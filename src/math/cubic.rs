//! Root solvers for the cubic polynomial arising from three-species
//! mass-action balance.
//!
//! The solvers implement a two-tier policy:
//!
//! - Newton's method is the fast default, but it can diverge or land on an
//!   unphysical root depending on the initial guess. It reports failure via
//!   `None` instead of guessing.
//! - Bisection is the guaranteed-convergence fallback. The physical setup
//!   always brackets the wanted root in `[0, total_concentration)`, so a sign
//!   change exists on the interval.
//!
//! Callers are expected to try Newton first and fall back to bisection when
//! Newton fails or steps outside the valid interval; neither solver is meant
//! to be used in isolation.

/// Relative convergence tolerance shared by both solvers.
const REL_TOL: f64 = 1e-3;

/// Newton iteration cap. Past this the search is assumed non-convergent.
const NEWTON_MAX_ITERS: u32 = 20;

/// First-step abort threshold for Newton's method.
///
/// If the very first ratio `f(a0)/f'(a0)` exceeds this, the derivative is too
/// small relative to the step and the iteration is unlikely to converge. The
/// threshold is empirical; the supported parameter ranges were tuned against
/// it, so it is kept as-is rather than re-derived.
const NEWTON_ABORT_RATIO: f64 = 10.0;

/// The cubic `q1*a^3 + q2*a^2 + q3*a + q4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
}

impl Cubic {
    pub fn new(q1: f64, q2: f64, q3: f64, q4: f64) -> Self {
        Self { q1, q2, q3, q4 }
    }

    /// Evaluate the polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.q1 * x * x * x + self.q2 * x * x + self.q3 * x + self.q4
    }

    /// Evaluate the derivative at `x`.
    pub fn deriv(&self, x: f64) -> f64 {
        3.0 * self.q1 * x * x + 2.0 * self.q2 * x + self.q3
    }

    /// Find a root with Newton's method starting from `a0`.
    ///
    /// Returns `None` when the iteration is judged non-convergent (first-step
    /// ratio too large, or the iteration cap is hit). A returned root is not
    /// guaranteed to lie in any particular interval; callers must validate it
    /// against the physically meaningful range.
    pub fn solve_newton(&self, a0: f64) -> Option<f64> {
        let mut a1 = a0;

        if self.eval(a1) / self.deriv(a1) > NEWTON_ABORT_RATIO {
            return None;
        }

        for _ in 0..NEWTON_MAX_ITERS {
            let a2 = a1 - self.eval(a1) / self.deriv(a1);

            if (a2 / a1 - 1.0).abs() < REL_TOL {
                return Some(a2);
            }
            a1 = a2;
        }

        None
    }

    /// Find a root with bisection on `[amin, amax]`.
    ///
    /// Assumes the interval brackets a sign change (guaranteed by the mass
    /// balance when `amax` is the total concentration). Either bound being an
    /// exact root is returned immediately. Converges once the relative
    /// interval width `|xmax/xmin - 1|` drops below the shared tolerance.
    pub fn solve_bisection(&self, amin: f64, amax: f64) -> f64 {
        let mut xmin = amin;
        let mut xmax = amax;
        let mut ymin = self.eval(xmin);
        let ymax = self.eval(xmax);

        if ymin == 0.0 {
            return xmin;
        }
        if ymax == 0.0 {
            return xmax;
        }

        loop {
            let xmid = 0.5 * (xmin + xmax);
            let ymid = self.eval(xmid);

            if ymid == 0.0 {
                return xmid;
            } else if ymin * ymid > 0.0 {
                xmin = xmid;
                ymin = ymid;
            } else {
                xmax = xmid;
            }

            if (xmax / xmin - 1.0).abs() < REL_TOL {
                return xmid;
            }
        }
    }
}
