//! Slider-index grid construction and enumeration.
//!
//! The search space is the Cartesian product of per-parameter index ranges.
//! Candidates are addressed by a linear index with dimension 0 varying
//! fastest, which fixes a deterministic enumeration order: when two
//! candidates tie on the residual sum, the lower linear index wins, exactly
//! as a sequential scan that keeps the first minimum would decide.

use crate::domain::{FreeParam, GridMode};

/// Coarse-mode first-pass step, in slider-index units.
pub const COARSE_STEP: u32 = 10;

/// Half-width of the coarse refinement window around the first-pass best.
pub const REFINE_HALF_WIDTH: u32 = 20;

/// Half-width of the local-mode window around the current value.
pub const LOCAL_HALF_WIDTH: u32 = 5;

/// Inclusive index range with a step, for one free parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl GridRange {
    /// Number of grid points on this range (always at least 1).
    pub fn count(&self) -> u64 {
        ((self.max - self.min) / self.step + 1) as u64
    }

    /// The i-th index on this range.
    pub fn at(&self, i: u64) -> u32 {
        self.min + i as u32 * self.step
    }
}

/// The multi-dimensional candidate grid for one search pass.
#[derive(Debug, Clone)]
pub struct SliderGrid {
    pub ranges: Vec<GridRange>,
}

impl SliderGrid {
    /// Total number of candidate points (product over dimensions).
    pub fn total(&self) -> u64 {
        self.ranges.iter().map(GridRange::count).product()
    }

    /// Decode a linear candidate index into per-parameter slider indices.
    pub fn decode(&self, mut linear: u64, out: &mut [u32]) {
        debug_assert_eq!(out.len(), self.ranges.len());
        for (range, slot) in self.ranges.iter().zip(out.iter_mut()) {
            let n = range.count();
            *slot = range.at(linear % n);
            linear /= n;
        }
    }
}

/// Ranges for the first (or only) pass of a search round.
pub fn first_pass(mode: GridMode, free: &[FreeParam], current: &[u32]) -> SliderGrid {
    let ranges = free
        .iter()
        .zip(current.iter())
        .map(|(f, &cur)| match mode {
            GridMode::Coarse => GridRange {
                min: f.min,
                max: f.max,
                step: COARSE_STEP,
            },
            GridMode::Medium => GridRange {
                min: f.min,
                max: f.max,
                step: 1,
            },
            GridMode::Local => GridRange {
                min: cur.saturating_sub(LOCAL_HALF_WIDTH).max(f.min),
                max: (cur + LOCAL_HALF_WIDTH).min(f.max),
                step: 1,
            },
        })
        .collect();
    SliderGrid { ranges }
}

/// Coarse-mode refinement pass: step 1 around the first-pass best, clipped
/// to the slider bounds.
pub fn refine_pass(free: &[FreeParam], best: &[u32]) -> SliderGrid {
    let ranges = free
        .iter()
        .zip(best.iter())
        .map(|(f, &b)| GridRange {
            min: b.saturating_sub(REFINE_HALF_WIDTH).max(f.min),
            max: (b + REFINE_HALF_WIDTH).min(f.max),
            step: 1,
        })
        .collect();
    SliderGrid { ranges }
}
