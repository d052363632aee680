//! Use-case services over the catalog store.
//!
//! # Responsibility
//! - Orchestrate repository calls into lifecycle, listing and statistics APIs.
//! - Keep callers decoupled from storage details.

pub mod catalog_service;
pub mod lifecycle_service;
pub mod statistics_service;
