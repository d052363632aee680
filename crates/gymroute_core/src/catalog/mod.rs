//! Classification and grouping engine.
//!
//! # Responsibility
//! - Hold an immutable snapshot of routes plus the sectors, grades and
//!   grade lines they reference.
//! - Turn a snapshot and a grouping request into a flat or bucketed listing.
//!
//! # Invariants
//! - Pure over the snapshot: no store access, no errors.

pub mod grouping;
pub mod snapshot;
