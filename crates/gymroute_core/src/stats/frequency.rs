//! Daily opening frequency series.

use crate::model::route::Route;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENING_SERIES_COLOR: &str = "#31994e";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningFrequency {
    /// Every calendar day from the oldest opening through the observation
    /// date; empty for an empty population.
    pub days: Vec<NaiveDate>,
    pub counts: Vec<u32>,
    pub color: String,
}

impl OpeningFrequency {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub fn opening_frequency(population: &[Route], date: NaiveDate) -> OpeningFrequency {
    let per_day = population
        .iter()
        .fold(BTreeMap::<NaiveDate, u32>::new(), |mut acc, route| {
            *acc.entry(route.opened_at).or_insert(0) += 1;
            acc
        });

    let days: Vec<NaiveDate> = match per_day.keys().next() {
        Some(oldest) => oldest.iter_days().take_while(|day| *day <= date).collect(),
        None => Vec::new(),
    };

    OpeningFrequency {
        counts: days
            .iter()
            .map(|day| per_day.get(day).copied().unwrap_or(0))
            .collect(),
        days,
        color: OPENING_SERIES_COLOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::opening_frequency;
    use crate::model::route::Route;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn series_is_zero_filled_through_observation_date() {
        let sector = Uuid::new_v4();
        let population = vec![
            Route::new(sector, day(1)),
            Route::new(sector, day(3)),
            Route::new(sector, day(3)),
        ];
        let series = opening_frequency(&population, day(10));

        assert_eq!(series.days.len(), 10);
        assert_eq!(series.days.first(), Some(&day(1)));
        assert_eq!(series.days.last(), Some(&day(10)));
        assert_eq!(series.counts, vec![1, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_population_gives_empty_series() {
        let series = opening_frequency(&[], day(10));
        assert!(series.is_empty());
        assert!(series.counts.is_empty());
    }
}
