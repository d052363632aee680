//! Derived per-route summaries and their explicit cache.
//!
//! # Invariants
//! - Entries are keyed by (route id, `updated_at`); a stale version is never
//!   served for a newer route.
//! - Invalidation is an explicit call made by route-mutating services.

pub mod summary_cache;
