//! Headline figures of a route population.

use crate::model::route::Route;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figures {
    pub route_count: usize,
    /// Made ascents only; logged projects are not counted.
    pub ascent_count: usize,
    pub opening: OpeningFigures,
    pub grade: GradeFigures,
}

/// Ages are whole days relative to the observation date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningFigures {
    pub youngest_opening_date: Option<NaiveDate>,
    pub oldest_opening_date: Option<NaiveDate>,
    pub oldest_route_age: Option<i64>,
    pub youngest_route_age: Option<i64>,
    pub average_route_age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeFigures {
    /// Highest `max_grade_value`.
    pub max_value: Option<i32>,
    /// Lowest `min_grade_value`.
    pub min_value: Option<i32>,
    /// Mean `max_grade_value`, rounded half up.
    pub average_value: Option<i32>,
}

pub fn compute_figures(population: &[Route], made_ascent_count: usize, date: NaiveDate) -> Figures {
    let oldest = population.iter().map(|route| route.opened_at).min();
    let youngest = population.iter().map(|route| route.opened_at).max();
    let age_in_days = |opened_at: NaiveDate| (date - opened_at).num_days();

    let age_sum: i64 = population
        .iter()
        .map(|route| age_in_days(route.opened_at))
        .sum();
    let average_route_age = match population.len() {
        0 => None,
        count => Some(age_sum / count as i64),
    };

    let max_values: Vec<i64> = population
        .iter()
        .filter_map(|route| route.max_grade_value)
        .map(i64::from)
        .collect();
    let average_value = match max_values.len() {
        0 => None,
        count => {
            let count = count as i64;
            let sum: i64 = max_values.iter().sum();
            Some(((2 * sum + count) / (2 * count)) as i32)
        }
    };

    Figures {
        route_count: population.len(),
        ascent_count: made_ascent_count,
        opening: OpeningFigures {
            youngest_opening_date: youngest,
            oldest_opening_date: oldest,
            oldest_route_age: oldest.map(age_in_days),
            youngest_route_age: youngest.map(age_in_days),
            average_route_age,
        },
        grade: GradeFigures {
            max_value: population.iter().filter_map(|r| r.max_grade_value).max(),
            min_value: population.iter().filter_map(|r| r.min_grade_value).min(),
            average_value,
        },
    }
}
