//! Core of the gym route catalog: route lifecycle, listing and statistics.
//! This crate is the single source of truth for catalog invariants.

pub mod cache;
pub mod catalog;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use cache::summary_cache::{InMemorySummaryCache, RouteSummary, SummaryCache};
pub use catalog::grouping::{
    group_routes, BucketKey, Direction, GroupBy, GroupedRoutes, GroupingRequest, OrderBy,
    RouteBucket,
};
pub use catalog::snapshot::CatalogSnapshot;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::ascent::{Ascent, AscentId, AscentStatus};
pub use model::catalog::{
    CatalogValidationError, Grade, GradeId, GradeLine, GradeLineId, GradeMode, Gym, GymId,
    Opener, OpenerId, Sector, SectorId, Space, SpaceId,
};
pub use model::route::{Route, RouteId, RouteState, RouteValidationError};
pub use repo::ascent_repo::{AscentRepository, SqliteAscentRepository};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::route_repo::{
    RepoError, RepoResult, RouteRepository, RouteScope, SqliteRouteRepository,
};
pub use service::catalog_service::{CatalogService, CatalogServiceError};
pub use service::lifecycle_service::{
    BatchItemOutcome, BatchOutcome, LifecycleError, LifecycleService, Transition,
};
pub use service::statistics_service::{
    GymStatistics, StatisticsBundle, StatisticsError, StatisticsService,
};
pub use stats::distribution::{DefaultGradePalette, GradePalette};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
