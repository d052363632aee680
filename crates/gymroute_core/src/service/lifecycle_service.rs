//! Route lifecycle use-cases (mount / dismount).
//!
//! # Responsibility
//! - Transition routes between mounted and dismounted.
//! - Keep the summary cache coherent with every successful write.
//!
//! # Invariants
//! - Transitions are idempotent: a route already in the target state is not
//!   written again.
//! - A route's cached summary is invalidated before a write is reported.
//! - Batch items succeed or fail independently.

use crate::cache::summary_cache::SummaryCache;
use crate::model::catalog::{GymId, SectorId};
use crate::model::route::{Route, RouteId, RouteState, RouteValidationError};
use crate::repo::route_repo::{RepoError, RouteRepository, RouteScope};
use chrono::Utc;
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Largest number of ids accepted by one batch request.
pub const DEFAULT_BATCH_LIMIT: usize = 500;

#[derive(Debug)]
pub enum LifecycleError {
    RouteNotFound(RouteId),
    Validation(RouteValidationError),
    BatchTooLarge { requested: usize, limit: usize },
    Repo(RepoError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RouteNotFound(id) => write!(f, "route not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::BatchTooLarge { requested, limit } => write!(
                f,
                "batch of {requested} routes exceeds the limit of {limit}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::RouteNotFound(_) | Self::BatchTooLarge { .. } => None,
        }
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "route",
                id,
            } => Self::RouteNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Result of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The route was already in the requested state.
    Unchanged,
}

#[derive(Debug)]
pub struct BatchItemOutcome {
    pub route_id: RouteId,
    pub result: Result<Transition, LifecycleError>,
}

/// Per-route outcomes in request order, one per distinct id.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<BatchItemOutcome>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn outcome_for(&self, route_id: RouteId) -> Option<&BatchItemOutcome> {
        self.items.iter().find(|item| item.route_id == route_id)
    }
}

pub struct LifecycleService<R: RouteRepository, C: SummaryCache> {
    repo: R,
    cache: C,
    batch_limit: usize,
}

impl<R: RouteRepository, C: SummaryCache> LifecycleService<R, C> {
    pub fn new(repo: R, cache: C) -> Self {
        Self {
            repo,
            cache,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    /// Marks the route as taken down now.
    pub fn dismount(&self, route_id: RouteId) -> Result<Transition, LifecycleError> {
        let route = self.load(route_id)?;
        self.transition(route, RouteState::Dismounted)
    }

    /// Puts the route back on the wall.
    pub fn mount(&self, route_id: RouteId) -> Result<Transition, LifecycleError> {
        let route = self.load(route_id)?;
        self.transition(route, RouteState::Mounted)
    }

    pub fn dismount_batch(
        &self,
        gym_id: GymId,
        route_ids: &[RouteId],
    ) -> Result<BatchOutcome, LifecycleError> {
        self.transition_batch(gym_id, route_ids, RouteState::Dismounted)
    }

    pub fn mount_batch(
        &self,
        gym_id: GymId,
        route_ids: &[RouteId],
    ) -> Result<BatchOutcome, LifecycleError> {
        self.transition_batch(gym_id, route_ids, RouteState::Mounted)
    }

    /// Dismounts every mounted route of a sector.
    pub fn dismount_sector(&self, sector_id: SectorId) -> Result<BatchOutcome, LifecycleError> {
        let mounted = self
            .repo
            .fetch_routes(&RouteScope::sector(sector_id).with_state(RouteState::Mounted))?;
        info!(
            "event=sector_dismount module=lifecycle status=start sector_id={} route_count={}",
            sector_id,
            mounted.len()
        );
        let items = mounted
            .into_iter()
            .map(|route| BatchItemOutcome {
                route_id: route.id,
                result: self.transition(route, RouteState::Dismounted),
            })
            .collect();
        Ok(self.finish_batch("sector_dismount", BatchOutcome { items }))
    }

    /// Saves editor fields and drops the stale summary.
    pub fn update_route(&self, route: &Route) -> Result<Route, LifecycleError> {
        let stored = self.repo.update_route(route)?;
        self.cache.invalidate_route(stored.id);
        info!(
            "event=route_update module=lifecycle status=ok route_id={}",
            stored.id
        );
        Ok(stored)
    }

    pub fn delete_route(&self, route_id: RouteId) -> Result<(), LifecycleError> {
        self.repo.delete_route(route_id)?;
        self.cache.invalidate_route(route_id);
        info!(
            "event=route_delete module=lifecycle status=ok route_id={}",
            route_id
        );
        Ok(())
    }

    fn load(&self, route_id: RouteId) -> Result<Route, LifecycleError> {
        self.repo
            .get_route(route_id)?
            .ok_or(LifecycleError::RouteNotFound(route_id))
    }

    fn transition(&self, route: Route, target: RouteState) -> Result<Transition, LifecycleError> {
        let event = match target {
            RouteState::Mounted => "route_mount",
            RouteState::Dismounted => "route_dismount",
        };
        if route.state() == target {
            info!(
                "event={} module=lifecycle status=noop route_id={}",
                event, route.id
            );
            return Ok(Transition::Unchanged);
        }

        let dismounted_at = match target {
            RouteState::Mounted => None,
            RouteState::Dismounted => Some(Utc::now()),
        };
        match self.repo.update_route_state(route.id, dismounted_at) {
            Ok(stored) => {
                self.cache.invalidate_route(stored.id);
                info!(
                    "event={} module=lifecycle status=ok route_id={} version={}",
                    event, stored.id, stored.updated_at
                );
                Ok(Transition::Applied)
            }
            Err(err) => {
                let err = LifecycleError::from(err);
                warn!(
                    "event={} module=lifecycle status=error route_id={} error={}",
                    event, route.id, err
                );
                Err(err)
            }
        }
    }

    fn transition_batch(
        &self,
        gym_id: GymId,
        route_ids: &[RouteId],
        target: RouteState,
    ) -> Result<BatchOutcome, LifecycleError> {
        let mut seen = BTreeSet::new();
        let distinct: Vec<RouteId> = route_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if distinct.len() > self.batch_limit {
            return Err(LifecycleError::BatchTooLarge {
                requested: distinct.len(),
                limit: self.batch_limit,
            });
        }

        let event = match target {
            RouteState::Mounted => "batch_mount",
            RouteState::Dismounted => "batch_dismount",
        };
        info!(
            "event={} module=lifecycle status=start gym_id={} route_count={}",
            event,
            gym_id,
            distinct.len()
        );

        let mut gym_routes = self.repo.fetch_routes(&RouteScope::gym(gym_id))?;
        let items = distinct
            .into_iter()
            .map(|route_id| {
                let result = match gym_routes.iter().position(|route| route.id == route_id) {
                    Some(index) => self.transition(gym_routes.swap_remove(index), target),
                    None => Err(LifecycleError::RouteNotFound(route_id)),
                };
                BatchItemOutcome { route_id, result }
            })
            .collect();
        Ok(self.finish_batch(event, BatchOutcome { items }))
    }

    fn finish_batch(&self, event: &str, outcome: BatchOutcome) -> BatchOutcome {
        info!(
            "event={} module=lifecycle status=ok succeeded={} failed={}",
            event,
            outcome.succeeded(),
            outcome.failed()
        );
        outcome
    }
}
