//! Active population resolution.

use crate::model::catalog::{GymId, OpenerId, SpaceId};
use crate::model::route::Route;
use crate::repo::route_repo::RouteScope;
use chrono::NaiveDate;

/// Store scope of a gym's candidate routes, regardless of current state.
pub fn population_scope(
    gym_id: GymId,
    space_ids: &[SpaceId],
    opener_ids: &[OpenerId],
) -> RouteScope {
    RouteScope::gym(gym_id)
        .in_spaces(space_ids.to_vec())
        .opened_by(opener_ids.to_vec())
}

/// Keeps the routes that stood on the wall on `date`.
pub fn active_population(candidates: Vec<Route>, date: NaiveDate) -> Vec<Route> {
    candidates
        .into_iter()
        .filter(|route| route.was_mounted_on(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::active_population;
    use crate::model::route::Route;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn population_reconstructs_past_state() {
        let sector_id = Uuid::new_v4();
        let standing = Route::new(sector_id, day(1, 1));
        let mut gone = Route::new(sector_id, day(1, 1));
        gone.dismounted_at = Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
        let future = Route::new(sector_id, day(1, 8));
        let all = vec![standing.clone(), gone.clone(), future.clone()];

        let on_first = active_population(all.clone(), day(1, 1));
        assert_eq!(on_first.len(), 2);
        assert!(on_first.iter().any(|r| r.id == gone.id));

        let on_fifth = active_population(all.clone(), day(1, 5));
        assert_eq!(on_fifth.len(), 1);
        assert_eq!(on_fifth[0].id, standing.id);

        let on_tenth = active_population(all, day(1, 10));
        assert!(on_tenth.iter().any(|r| r.id == future.id));
        assert!(!on_tenth.iter().any(|r| r.id == gone.id));
    }
}
