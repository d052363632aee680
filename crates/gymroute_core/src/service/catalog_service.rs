//! Route listing use-cases.
//!
//! # Responsibility
//! - Build a `CatalogSnapshot` for a route scope from the store.
//! - Hand the snapshot to the grouping engine.
//! - Serve route summaries through the summary cache.
//!
//! # Invariants
//! - A listing is anchored on a gym, a space or a sector that exists.
//! - The snapshot carries every sector, grade and grade line of the gym.

use crate::cache::summary_cache::{RouteSummary, SummaryCache};
use crate::catalog::grouping::{group_routes, GroupedRoutes, GroupingRequest};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::model::catalog::{GymId, Sector, SectorId, SpaceId};
use crate::model::route::RouteId;
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::route_repo::{RepoError, RouteRepository, RouteScope};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CatalogServiceError {
    GymNotFound(GymId),
    SpaceNotFound(SpaceId),
    SectorNotFound(SectorId),
    RouteNotFound(RouteId),
    /// The scope names no gym, space or sector.
    UnanchoredScope,
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GymNotFound(id) => write!(f, "gym not found: {id}"),
            Self::SpaceNotFound(id) => write!(f, "space not found: {id}"),
            Self::SectorNotFound(id) => write!(f, "sector not found: {id}"),
            Self::RouteNotFound(id) => write!(f, "route not found: {id}"),
            Self::UnanchoredScope => write!(f, "route scope needs a gym, space or sector"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct CatalogService<R: RouteRepository, K: CatalogRepository, C: SummaryCache> {
    routes: R,
    catalog: K,
    cache: C,
}

impl<R, K, C> CatalogService<R, K, C>
where
    R: RouteRepository,
    K: CatalogRepository,
    C: SummaryCache,
{
    pub fn new(routes: R, catalog: K, cache: C) -> Self {
        Self {
            routes,
            catalog,
            cache,
        }
    }

    /// Loads the routes of `scope` with the gym references they point at.
    pub fn snapshot(&self, scope: &RouteScope) -> Result<CatalogSnapshot, CatalogServiceError> {
        let gym_id = self.resolve_gym(scope)?;
        let routes = self.routes.fetch_routes(scope)?;
        let snapshot = CatalogSnapshot::new(
            routes,
            self.catalog.list_sectors(gym_id)?,
            self.catalog.list_grades(gym_id)?,
            self.catalog.list_gym_grade_lines(gym_id)?,
        );
        debug!(
            "event=catalog_snapshot module=catalog status=ok gym_id={} route_count={}",
            gym_id,
            snapshot.routes().len()
        );
        Ok(snapshot)
    }

    pub fn list_routes(
        &self,
        scope: &RouteScope,
        request: &GroupingRequest,
    ) -> Result<GroupedRoutes, CatalogServiceError> {
        let snapshot = self.snapshot(scope)?;
        Ok(group_routes(&snapshot, request))
    }

    /// Same listing as `list_routes`, flattened to cached summaries.
    pub fn list_route_summaries(
        &self,
        scope: &RouteScope,
        request: &GroupingRequest,
    ) -> Result<Vec<RouteSummary>, CatalogServiceError> {
        let snapshot = self.snapshot(scope)?;
        let grouped = group_routes(&snapshot, request);
        Ok(grouped
            .routes()
            .into_iter()
            .map(|route| self.cache.summary_for(route, &snapshot))
            .collect())
    }

    pub fn route_summary(&self, route_id: RouteId) -> Result<RouteSummary, CatalogServiceError> {
        let route = self
            .routes
            .get_route(route_id)?
            .ok_or(CatalogServiceError::RouteNotFound(route_id))?;
        let snapshot = self.snapshot(&RouteScope::sector(route.sector_id))?;
        Ok(self.cache.summary_for(&route, &snapshot))
    }

    /// Sectors of the route's space sharing its sector's grade, the route's
    /// own sector included.
    pub fn similar_sectors(&self, route_id: RouteId) -> Result<Vec<Sector>, CatalogServiceError> {
        let route = self
            .routes
            .get_route(route_id)?
            .ok_or(CatalogServiceError::RouteNotFound(route_id))?;
        let sector = self
            .catalog
            .get_sector(route.sector_id)?
            .ok_or(CatalogServiceError::SectorNotFound(route.sector_id))?;
        let space = self
            .catalog
            .get_space(sector.space_id)?
            .ok_or(CatalogServiceError::SpaceNotFound(sector.space_id))?;

        Ok(self
            .catalog
            .list_sectors(space.gym_id)?
            .into_iter()
            .filter(|other| other.space_id == sector.space_id && other.grade_id == sector.grade_id)
            .collect())
    }

    fn resolve_gym(&self, scope: &RouteScope) -> Result<GymId, CatalogServiceError> {
        if let Some(gym_id) = scope.gym_id {
            return match self.catalog.get_gym(gym_id)? {
                Some(gym) => Ok(gym.id),
                None => Err(CatalogServiceError::GymNotFound(gym_id)),
            };
        }

        let space_id = match (scope.space_id, scope.sector_id) {
            (Some(space_id), _) => space_id,
            (None, Some(sector_id)) => {
                self.catalog
                    .get_sector(sector_id)?
                    .ok_or(CatalogServiceError::SectorNotFound(sector_id))?
                    .space_id
            }
            (None, None) => return Err(CatalogServiceError::UnanchoredScope),
        };
        let space = self
            .catalog
            .get_space(space_id)?
            .ok_or(CatalogServiceError::SpaceNotFound(space_id))?;
        Ok(space.gym_id)
    }
}
