//! Grid-search fitting: residual metric, slider grids, and the search loop.

pub mod fitter;
pub mod grid;
pub mod residual;

pub use fitter::*;
pub use grid::*;
pub use residual::*;
