//! Route catalog store: contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the read/write contract the engines consume.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate domain rules before SQL mutations.
//! - Missing entities surface as `RepoError::NotFound`, not as `None`, on
//!   mutations.

pub mod ascent_repo;
pub mod catalog_repo;
pub mod route_repo;
