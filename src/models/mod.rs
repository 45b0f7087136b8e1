//! Equilibrium models for the four binding topologies.

pub mod equilibrium;

pub use equilibrium::*;
