//! Grade, level and note histograms.
//!
//! # Invariants
//! - Grade buckets cover the whole scale (1, 3, ..., 53), empty ones included.
//! - Level charts list every line of a grade, empty ones included.
//! - Note buckets cover `0..=MAX_NOTE`, empty ones included.

use crate::catalog::snapshot::CatalogSnapshot;
use crate::model::ascent::{Ascent, MAX_NOTE};
use crate::model::catalog::{GradeId, GradeLineId};
use crate::model::route::{Route, MAX_GRADE_VALUE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WHOLE_GRADE_COLORS: [&str; 9] = [
    "#ffffff", "#f4e04d", "#f49d37", "#8ac926", "#1982c4", "#d62828", "#6a4c93", "#3d3d3d",
    "#000000",
];

/// Color of a grade bucket, keyed by raw scale value.
pub trait GradePalette {
    fn color_for(&self, grade_value: i32) -> String;
}

impl<F> GradePalette for F
where
    F: Fn(i32) -> String,
{
    fn color_for(&self, grade_value: i32) -> String {
        self(grade_value)
    }
}

/// One color per whole grade (1 to 9), six scale units each.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGradePalette;

impl GradePalette for DefaultGradePalette {
    fn color_for(&self, grade_value: i32) -> String {
        let whole_grade = (grade_value.max(0) / 6) as usize;
        WHOLE_GRADE_COLORS[whole_grade.min(WHOLE_GRADE_COLORS.len() - 1)].to_string()
    }
}

/// Parallel arrays ready for charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDistribution {
    pub labels: Vec<i32>,
    pub counts: Vec<u32>,
    pub colors: Vec<String>,
}

/// Histogram of `min_grade_value` over odd whole-grade buckets.
///
/// Even values (the `+` of a grade) fall into the bucket below. Routes
/// without a value, or with zero, are skipped.
pub fn grade_distribution(population: &[Route], palette: &dyn GradePalette) -> GradeDistribution {
    let labels: Vec<i32> = (1..=MAX_GRADE_VALUE).step_by(2).collect();
    let tally = population
        .iter()
        .filter_map(|route| route.min_grade_value)
        .filter(|value| (1..=MAX_GRADE_VALUE).contains(value))
        .map(|value| if value % 2 == 0 { value - 1 } else { value })
        .fold(BTreeMap::<i32, u32>::new(), |mut acc, bucket| {
            *acc.entry(bucket).or_insert(0) += 1;
            acc
        });

    GradeDistribution {
        counts: labels
            .iter()
            .map(|label| tally.get(label).copied().unwrap_or(0))
            .collect(),
        colors: labels
            .iter()
            .map(|label| palette.color_for(label - 1))
            .collect(),
        labels,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChart {
    pub grade_id: GradeId,
    pub grade_name: String,
    pub labels: Vec<String>,
    pub counts: Vec<u32>,
    pub colors: Vec<String>,
}

/// One chart per grade referenced through a grade line, in order of first
/// appearance in the population.
pub fn level_distribution(population: &[Route], snapshot: &CatalogSnapshot) -> Vec<LevelChart> {
    let lined: Vec<(GradeId, GradeLineId)> = population
        .iter()
        .filter_map(|route| snapshot.line_of(route))
        .map(|line| (line.grade_id, line.id))
        .collect();

    let grade_order = lined.iter().fold(Vec::<GradeId>::new(), |mut acc, (grade_id, _)| {
        if !acc.contains(grade_id) {
            acc.push(*grade_id);
        }
        acc
    });
    let per_line = lined
        .iter()
        .fold(BTreeMap::<GradeLineId, u32>::new(), |mut acc, (_, line_id)| {
            *acc.entry(*line_id).or_insert(0) += 1;
            acc
        });

    grade_order
        .into_iter()
        .filter_map(|grade_id| {
            let grade = snapshot.grade(grade_id)?;
            let lines = snapshot.lines_of_grade(grade_id);
            Some(LevelChart {
                grade_id,
                grade_name: grade.name.clone(),
                labels: lines.iter().map(|line| line.name.clone()).collect(),
                counts: lines
                    .iter()
                    .map(|line| per_line.get(&line.id).copied().unwrap_or(0))
                    .collect(),
                colors: lines
                    .iter()
                    .map(|line| line.primary_color().unwrap_or_default().to_string())
                    .collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDistribution {
    pub counts: BTreeMap<u8, u32>,
}

impl NoteDistribution {
    pub fn count(&self, note: u8) -> u32 {
        self.counts.get(&note).copied().unwrap_or(0)
    }
}

/// Histogram of satisfaction notes over made ascents.
pub fn note_distribution(ascents: &[Ascent]) -> NoteDistribution {
    let empty: BTreeMap<u8, u32> = (0..=MAX_NOTE).map(|note| (note, 0)).collect();
    let counts = ascents
        .iter()
        .filter(|ascent| ascent.is_made())
        .filter_map(|ascent| ascent.note)
        .fold(empty, |mut acc, note| {
            if let Some(count) = acc.get_mut(&note) {
                *count += 1;
            }
            acc
        });
    NoteDistribution { counts }
}

#[cfg(test)]
mod tests {
    use super::{
        grade_distribution, level_distribution, note_distribution, DefaultGradePalette,
        GradePalette,
    };
    use crate::catalog::snapshot::CatalogSnapshot;
    use crate::model::ascent::{Ascent, AscentStatus};
    use crate::model::catalog::{Grade, GradeLine, GradeMode, Sector};
    use crate::model::route::Route;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn route_with_min(sector: Uuid, min: Option<i32>) -> Route {
        let mut route = Route::new(sector, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        route.min_grade_value = min;
        route.max_grade_value = min;
        route
    }

    #[test]
    fn grade_buckets_fold_plus_grades_down() {
        let sector = Uuid::new_v4();
        let population = vec![
            route_with_min(sector, Some(31)),
            route_with_min(sector, Some(32)),
            route_with_min(sector, Some(1)),
            route_with_min(sector, Some(0)),
            route_with_min(sector, None),
        ];
        let palette = |value: i32| format!("c{value}");
        let distribution = grade_distribution(&population, &palette);

        assert_eq!(distribution.labels.len(), 27);
        assert_eq!(distribution.labels.first(), Some(&1));
        assert_eq!(distribution.labels.last(), Some(&53));
        assert_eq!(distribution.counts[0], 1);
        assert_eq!(distribution.counts[15], 2);
        assert_eq!(distribution.counts.iter().sum::<u32>(), 3);
        assert_eq!(distribution.colors[15], "c30");
    }

    #[test]
    fn default_palette_colors_whole_grades() {
        let palette = DefaultGradePalette;
        assert_eq!(palette.color_for(30), palette.color_for(35));
        assert_ne!(palette.color_for(30), palette.color_for(36));
        assert_eq!(palette.color_for(120), palette.color_for(53));
    }

    #[test]
    fn level_chart_keeps_empty_lines() {
        let grade = Grade::new(Uuid::new_v4(), "Colors", GradeMode::ByLevel);
        let green = GradeLine::new(grade.id, "Green", 1, vec!["#00ff00".to_string()]);
        let blue = GradeLine::new(grade.id, "Blue", 2, vec!["#0000ff".to_string()]);
        let red = GradeLine::new(grade.id, "Red", 3, vec!["#ff0000".to_string()]);
        let sector = Sector::new(Uuid::new_v4(), "Wall", 1);
        let mut route = Route::new(sector.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        route.grade_line_id = Some(red.id);
        let snapshot = CatalogSnapshot::new(
            vec![route.clone()],
            vec![sector],
            vec![grade.clone()],
            vec![red, green, blue],
        );

        let charts = level_distribution(&[route], &snapshot);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].grade_id, grade.id);
        assert_eq!(charts[0].labels, vec!["Green", "Blue", "Red"]);
        assert_eq!(charts[0].counts, vec![0, 0, 1]);
        assert_eq!(charts[0].colors[1], "#0000ff");
    }

    #[test]
    fn notes_cover_full_domain_even_without_ascents() {
        let distribution = note_distribution(&[]);
        assert_eq!(distribution.counts.len(), 7);
        assert!(distribution.counts.values().all(|count| *count == 0));

        let route = Uuid::new_v4();
        let ascents = vec![
            Ascent::new(route, AscentStatus::Made, Some(4)),
            Ascent::new(route, AscentStatus::Made, Some(4)),
            Ascent::new(route, AscentStatus::Project, Some(2)),
            Ascent::new(route, AscentStatus::Made, None),
            Ascent::new(route, AscentStatus::Made, Some(9)),
        ];
        let distribution = note_distribution(&ascents);
        assert_eq!(distribution.count(4), 2);
        assert_eq!(distribution.count(2), 0);
        assert_eq!(distribution.counts.values().sum::<u32>(), 2);
    }
}
