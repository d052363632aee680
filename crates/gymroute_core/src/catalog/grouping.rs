//! Route grouping and ordering.
//!
//! # Responsibility
//! - Partition a route snapshot into ordered buckets, or order it flat.
//! - Apply the secondary `OrderBy` key inside every result.
//!
//! # Invariants
//! - All sorts are stable; equal keys keep snapshot order.
//! - `Direction::Desc` flips the comparison, not the output afterwards.
//! - Unknown grouping/ordering input degrades to the natural order.
//! - By-level buckets list every line of each represented grade, even empty
//!   ones.

use crate::catalog::snapshot::CatalogSnapshot;
use crate::model::catalog::{GradeId, GradeMode, SectorId};
use crate::model::route::Route;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const OPENED_AT_LABEL_FORMAT: &str = "%Y-%m-%d";

/// Grouping axis of a route listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    BySector,
    ByOpenedAt,
    ByGrade,
    ByLevel,
    ByPoint,
}

impl GroupBy {
    /// Parses request input; anything unknown is `None`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "sector" => Self::BySector,
            "opened_at" => Self::ByOpenedAt,
            "grade" => Self::ByGrade,
            "level" => Self::ByLevel,
            "point" => Self::ByPoint,
            _ => Self::None,
        }
    }

    /// Bucket of `route` under this grouping, `None` when excluded.
    fn bucket_key(self, snapshot: &CatalogSnapshot, route: &Route) -> Option<BucketKey> {
        match self {
            Self::None | Self::ByPoint => None,
            Self::BySector => Some(BucketKey::Sector(route.sector_id)),
            Self::ByOpenedAt => Some(BucketKey::OpenedAt(route.opened_at)),
            Self::ByGrade => {
                if snapshot.grade_mode(route) != GradeMode::ByGrade {
                    return None;
                }
                route.max_grade_value.map(BucketKey::Grade)
            }
            Self::ByLevel => {
                let line = snapshot.line_of(route)?;
                let grade = snapshot.grade(line.grade_id)?;
                if !grade.is_by_level() {
                    return None;
                }
                Some(BucketKey::Level {
                    grade_id: grade.id,
                    rank: line.rank,
                })
            }
        }
    }
}

/// Secondary order applied before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    Natural,
    OpenedAt,
    Grade,
    Level,
    Sector,
}

impl OrderBy {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "opened_at" => Self::OpenedAt,
            "grade" => Self::Grade,
            "level" => Self::Level,
            "sector" => Self::Sector,
            _ => Self::Natural,
        }
    }

    fn compare(
        self,
        snapshot: &CatalogSnapshot,
        direction: Direction,
        a: &Route,
        b: &Route,
    ) -> Ordering {
        match self {
            Self::Natural => Ordering::Equal,
            Self::OpenedAt => direction.apply(a.opened_at.cmp(&b.opened_at)),
            Self::Grade => direction.apply(a.max_grade_value.cmp(&b.max_grade_value)),
            Self::Level => {
                let rank = |route: &Route| snapshot.line_of(route).map(|line| line.rank);
                let grade_name = |route: &Route| {
                    snapshot
                        .effective_grade(route)
                        .map(|grade| grade.name.as_str())
                };
                // Grade name stays ascending whatever the direction.
                direction
                    .apply(rank(a).cmp(&rank(b)))
                    .then_with(|| grade_name(a).cmp(&grade_name(b)))
            }
            Self::Sector => {
                let name =
                    |route: &Route| snapshot.sector(route.sector_id).map(|s| s.name.as_str());
                direction.apply(name(a).cmp(&name(b)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// `desc` is descending; everything else is ascending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// One listing request: grouping axis, secondary order, direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupingRequest {
    pub group_by: GroupBy,
    pub order_by: OrderBy,
    pub direction: Direction,
}

impl GroupingRequest {
    pub fn new(group_by: GroupBy, order_by: OrderBy, direction: Direction) -> Self {
        Self {
            group_by,
            order_by,
            direction,
        }
    }

    /// Builds a request from raw, optional query values.
    pub fn parse(group_by: Option<&str>, order_by: Option<&str>, direction: Option<&str>) -> Self {
        Self {
            group_by: group_by.map_or(GroupBy::None, GroupBy::parse),
            order_by: order_by.map_or(OrderBy::Natural, OrderBy::parse),
            direction: direction.map_or(Direction::Asc, Direction::parse),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    Sector(SectorId),
    OpenedAt(NaiveDate),
    Grade(i32),
    /// Grade id disambiguates same-named lines of different grades.
    Level { grade_id: GradeId, rank: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBucket {
    pub key: BucketKey,
    pub label: String,
    /// Line colors for level buckets, empty otherwise.
    pub colors: Vec<String>,
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupedRoutes {
    Flat(Vec<Route>),
    Buckets(Vec<RouteBucket>),
}

impl GroupedRoutes {
    /// Routes in output order, bucket by bucket.
    pub fn routes(&self) -> Vec<&Route> {
        match self {
            Self::Flat(routes) => routes.iter().collect(),
            Self::Buckets(buckets) => buckets.iter().flat_map(|b| b.routes.iter()).collect(),
        }
    }
}

/// Orders and groups the snapshot's routes according to `request`.
pub fn group_routes(snapshot: &CatalogSnapshot, request: &GroupingRequest) -> GroupedRoutes {
    let mut ordered = snapshot.routes().to_vec();
    ordered.sort_by(|a, b| {
        request
            .order_by
            .compare(snapshot, request.direction, a, b)
    });

    match request.group_by {
        GroupBy::None => GroupedRoutes::Flat(ordered),
        GroupBy::ByPoint => {
            ordered.sort_by(|a, b| {
                request
                    .direction
                    .apply(a.point.unwrap_or(0).cmp(&b.point.unwrap_or(0)))
            });
            GroupedRoutes::Flat(ordered)
        }
        group_by => GroupedRoutes::Buckets(bucketize(snapshot, ordered, group_by, request.direction)),
    }
}

fn bucketize(
    snapshot: &CatalogSnapshot,
    ordered: Vec<Route>,
    group_by: GroupBy,
    direction: Direction,
) -> Vec<RouteBucket> {
    let seeded = if group_by == GroupBy::ByLevel {
        level_seed(snapshot, &ordered)
    } else {
        BTreeMap::new()
    };

    let grouped = ordered.into_iter().fold(seeded, |mut acc, route| {
        if let Some(key) = group_by.bucket_key(snapshot, &route) {
            acc.entry(key).or_insert_with(Vec::new).push(route);
        }
        acc
    });

    let mut buckets: Vec<RouteBucket> = grouped
        .into_iter()
        .map(|(key, routes)| RouteBucket {
            label: bucket_label(snapshot, key),
            colors: bucket_colors(snapshot, key),
            key,
            routes,
        })
        .collect();
    buckets.sort_by(|a, b| compare_keys(snapshot, direction, a.key, b.key));
    buckets
}

/// Empty buckets for every line of each grade the level routes reference.
fn level_seed(snapshot: &CatalogSnapshot, routes: &[Route]) -> BTreeMap<BucketKey, Vec<Route>> {
    routes
        .iter()
        .filter_map(|route| match GroupBy::ByLevel.bucket_key(snapshot, route) {
            Some(BucketKey::Level { grade_id, .. }) => Some(grade_id),
            _ => None,
        })
        .flat_map(|grade_id| snapshot.lines_of_grade(grade_id))
        .map(|line| {
            (
                BucketKey::Level {
                    grade_id: line.grade_id,
                    rank: line.rank,
                },
                Vec::new(),
            )
        })
        .collect()
}

/// Direction flips the bucket key itself; ties on it keep snapshot order.
fn compare_keys(
    snapshot: &CatalogSnapshot,
    direction: Direction,
    a: BucketKey,
    b: BucketKey,
) -> Ordering {
    match (a, b) {
        (BucketKey::Sector(a), BucketKey::Sector(b)) => {
            let order = |id: SectorId| snapshot.sector(id).map(|sector| sector.order);
            let position = |id: SectorId| snapshot.sector_position(id);
            direction
                .apply(order(a).cmp(&order(b)))
                .then_with(|| position(a).cmp(&position(b)))
        }
        (BucketKey::OpenedAt(a), BucketKey::OpenedAt(b)) => direction.apply(a.cmp(&b)),
        (BucketKey::Grade(a), BucketKey::Grade(b)) => direction.apply(a.cmp(&b)),
        (
            BucketKey::Level {
                grade_id: grade_a,
                rank: rank_a,
            },
            BucketKey::Level {
                grade_id: grade_b,
                rank: rank_b,
            },
        ) => {
            let grade_name = |id: GradeId| snapshot.grade(id).map(|grade| grade.name.as_str());
            let position = |id: GradeId| snapshot.grade_position(id);
            direction
                .apply(grade_name(grade_a).cmp(&grade_name(grade_b)))
                .then_with(|| position(grade_a).cmp(&position(grade_b)))
                .then_with(|| direction.apply(rank_a.cmp(&rank_b)))
        }
        _ => direction.apply(a.cmp(&b)),
    }
}

fn bucket_label(snapshot: &CatalogSnapshot, key: BucketKey) -> String {
    match key {
        BucketKey::Sector(id) => snapshot
            .sector(id)
            .map_or_else(|| id.to_string(), |sector| sector.name.clone()),
        BucketKey::OpenedAt(date) => date.format(OPENED_AT_LABEL_FORMAT).to_string(),
        BucketKey::Grade(value) => value.to_string(),
        BucketKey::Level { grade_id, rank } => snapshot
            .lines_of_grade(grade_id)
            .into_iter()
            .find(|line| line.rank == rank)
            .map_or_else(|| rank.to_string(), |line| line.name.clone()),
    }
}

fn bucket_colors(snapshot: &CatalogSnapshot, key: BucketKey) -> Vec<String> {
    match key {
        BucketKey::Level { grade_id, rank } => snapshot
            .lines_of_grade(grade_id)
            .into_iter()
            .find(|line| line.rank == rank)
            .map(|line| line.colors.clone())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, GroupBy, GroupingRequest, OrderBy};
    use std::cmp::Ordering;

    #[test]
    fn unknown_grouping_degrades_to_none() {
        assert_eq!(GroupBy::parse("colour"), GroupBy::None);
        assert_eq!(GroupBy::parse(""), GroupBy::None);
        assert_eq!(GroupBy::parse("level"), GroupBy::ByLevel);
        assert_eq!(OrderBy::parse("height"), OrderBy::Natural);
    }

    #[test]
    fn direction_parse_defaults_to_ascending() {
        assert_eq!(Direction::parse("DESC"), Direction::Desc);
        assert_eq!(Direction::parse("down"), Direction::Asc);
        assert_eq!(Direction::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Direction::Asc.reversed(), Direction::Desc);
    }

    #[test]
    fn request_parse_handles_missing_values() {
        let request = GroupingRequest::parse(None, Some("grade"), Some("desc"));
        assert_eq!(request.group_by, GroupBy::None);
        assert_eq!(request.order_by, OrderBy::Grade);
        assert_eq!(request.direction, Direction::Desc);
    }
}
