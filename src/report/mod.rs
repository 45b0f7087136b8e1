//! Reporting: derived thermodynamic quantities and formatted terminal output.

pub mod format;

pub use format::*;
