//! Route summary projection and in-memory cache.

use crate::catalog::snapshot::CatalogSnapshot;
use crate::model::catalog::SectorId;
use crate::model::route::{grade_value_label, Route, RouteId, RouteState};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Public listing shape of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub id: RouteId,
    pub name: Option<String>,
    pub sector_id: SectorId,
    pub sector_name: Option<String>,
    pub opened_at: NaiveDate,
    pub state: RouteState,
    /// Line name under level grades, `min~max` grade text otherwise.
    pub grade_label: Option<String>,
    pub colors: Vec<String>,
    pub point: Option<i64>,
    /// `updated_at` of the route this summary was built from.
    pub version: i64,
}

/// Builds the summary of `route` from snapshot references.
pub fn summarize(route: &Route, snapshot: &CatalogSnapshot) -> RouteSummary {
    let line = snapshot.line_of(route);
    let grade_label = match line {
        Some(line) => Some(line.name.clone()),
        None => numeric_grade_label(route.min_grade_value, route.max_grade_value),
    };

    RouteSummary {
        id: route.id,
        name: route.name.clone(),
        sector_id: route.sector_id,
        sector_name: snapshot
            .sector(route.sector_id)
            .map(|sector| sector.name.clone()),
        opened_at: route.opened_at,
        state: route.state(),
        grade_label,
        colors: line.map(|line| line.colors.clone()).unwrap_or_default(),
        point: route.point,
        version: route.updated_at,
    }
}

fn numeric_grade_label(min: Option<i32>, max: Option<i32>) -> Option<String> {
    let min_label = min.and_then(grade_value_label);
    let max_label = max.and_then(grade_value_label);
    match (min_label, max_label) {
        (Some(min), Some(max)) if min != max => Some(format!("{min}~{max}")),
        (Some(label), _) | (None, Some(label)) => Some(label),
        (None, None) => None,
    }
}

/// Cache capability for route summaries.
pub trait SummaryCache {
    /// Cached summary for the route's current version, built on miss.
    fn summary_for(&self, route: &Route, snapshot: &CatalogSnapshot) -> RouteSummary;
    /// Drops every cached version of the route.
    fn invalidate_route(&self, route_id: RouteId);
}

impl<C: SummaryCache + ?Sized> SummaryCache for &C {
    fn summary_for(&self, route: &Route, snapshot: &CatalogSnapshot) -> RouteSummary {
        (**self).summary_for(route, snapshot)
    }

    fn invalidate_route(&self, route_id: RouteId) {
        (**self).invalidate_route(route_id)
    }
}

/// Process-local summary cache.
#[derive(Debug, Default)]
pub struct InMemorySummaryCache {
    entries: Mutex<BTreeMap<(RouteId, i64), RouteSummary>>,
}

impl InMemorySummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether any version of the route is cached.
    pub fn contains_route(&self, route_id: RouteId) -> bool {
        self.lock().keys().any(|(id, _)| *id == route_id)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(RouteId, i64), RouteSummary>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SummaryCache for InMemorySummaryCache {
    fn summary_for(&self, route: &Route, snapshot: &CatalogSnapshot) -> RouteSummary {
        let key = (route.id, route.updated_at);
        let mut entries = self.lock();
        if let Some(summary) = entries.get(&key) {
            return summary.clone();
        }
        // Older versions of this route are unreachable from now on.
        entries.retain(|(id, _), _| *id != route.id);
        let summary = summarize(route, snapshot);
        entries.insert(key, summary.clone());
        summary
    }

    fn invalidate_route(&self, route_id: RouteId) {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(id, _), _| *id != route_id);
        debug!(
            "event=summary_invalidate module=cache status=ok route_id={} dropped={}",
            route_id,
            before - entries.len()
        );
    }
}
