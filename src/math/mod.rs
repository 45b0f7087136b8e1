//! Mathematical utilities: scalar root solvers for the mass-action cubic.

pub mod cubic;

pub use cubic::*;
