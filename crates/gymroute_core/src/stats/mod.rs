//! Point-in-time statistics over a gym's route population.
//!
//! # Responsibility
//! - Resolve the active population for an observation date.
//! - Build figures, distributions and the opening series from it.
//!
//! # Invariants
//! - Every builder is a pure function of its inputs.
//! - An empty population yields zero/empty values, never an error.

pub mod distribution;
pub mod figures;
pub mod frequency;
pub mod population;
