//! Domain model of the route catalog.
//!
//! # Responsibility
//! - Define the entities the engines read (routes, sectors, grades, ascents).
//! - Own the validation rules the store enforces before writing.
//!
//! # Invariants
//! - Every entity is identified by a stable `Uuid`.
//! - Routes are hard-deleted; dismounting is a state, not a deletion.

pub mod ascent;
pub mod catalog;
pub mod route;
