//! Sum-of-squared-residuals metric.

use crate::domain::DataPoint;

/// Sum of squared residuals between two equal-length point sequences.
///
/// In logarithmic mode the per-point residual is `ln(observed.y /
/// predicted.y)`, which requires both y-values to be strictly positive; in
/// linear mode it is the plain difference.
///
/// Returns `None` for a degenerate metric: mismatched lengths, a non-positive
/// y in logarithmic mode, or a non-finite sum. A degenerate metric must never
/// be minimized over, so the sentinel is explicit rather than a quiet NaN.
pub fn sum_squared_residuals(
    observed: &[DataPoint],
    predicted: &[DataPoint],
    logarithmic: bool,
) -> Option<f64> {
    if observed.len() != predicted.len() {
        return None;
    }

    let mut sum = 0.0;

    if logarithmic {
        for (o, p) in observed.iter().zip(predicted.iter()) {
            if !(o.y > 0.0 && p.y > 0.0) {
                return None;
            }
            let r = (o.y / p.y).ln();
            sum += r * r;
        }
    } else {
        for (o, p) in observed.iter().zip(predicted.iter()) {
            let r = o.y - p.y;
            sum += r * r;
        }
    }

    sum.is_finite().then_some(sum)
}
