//! Immutable in-memory view of a route collection and its references.
//!
//! # Invariants
//! - `routes` keep the store's natural retrieval order.
//! - Lookups never touch the store; the snapshot is self-contained.

use crate::model::catalog::{Grade, GradeId, GradeLine, GradeLineId, GradeMode, Sector, SectorId};
use crate::model::route::Route;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    routes: Vec<Route>,
    sectors: Vec<Sector>,
    sector_index: BTreeMap<SectorId, usize>,
    grades: BTreeMap<GradeId, Grade>,
    grade_index: BTreeMap<GradeId, usize>,
    grade_lines: BTreeMap<GradeLineId, GradeLine>,
}

impl CatalogSnapshot {
    pub fn new(
        routes: Vec<Route>,
        sectors: Vec<Sector>,
        grades: Vec<Grade>,
        grade_lines: Vec<GradeLine>,
    ) -> Self {
        let sector_index = sectors
            .iter()
            .enumerate()
            .map(|(index, sector)| (sector.id, index))
            .collect();
        let grade_index = grades
            .iter()
            .enumerate()
            .map(|(index, grade)| (grade.id, index))
            .collect();
        Self {
            routes,
            sectors,
            sector_index,
            grade_index,
            grades: grades.into_iter().map(|grade| (grade.id, grade)).collect(),
            grade_lines: grade_lines
                .into_iter()
                .map(|line| (line.id, line))
                .collect(),
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn sector(&self, id: SectorId) -> Option<&Sector> {
        self.sector_index.get(&id).map(|&index| &self.sectors[index])
    }

    /// Position of the sector in snapshot order.
    pub fn sector_position(&self, id: SectorId) -> Option<usize> {
        self.sector_index.get(&id).copied()
    }

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.get(&id)
    }

    /// Position of the grade in snapshot order.
    pub fn grade_position(&self, id: GradeId) -> Option<usize> {
        self.grade_index.get(&id).copied()
    }

    pub fn grade_line(&self, id: GradeLineId) -> Option<&GradeLine> {
        self.grade_lines.get(&id)
    }

    /// Grade line of `route`, when set and known.
    pub fn line_of(&self, route: &Route) -> Option<&GradeLine> {
        route.grade_line_id.and_then(|id| self.grade_line(id))
    }

    /// The grade of the route's line, else the grade of its sector.
    pub fn effective_grade(&self, route: &Route) -> Option<&Grade> {
        match self.line_of(route) {
            Some(line) => self.grade(line.grade_id),
            None => self
                .sector(route.sector_id)
                .and_then(|sector| sector.grade_id)
                .and_then(|grade_id| self.grade(grade_id)),
        }
    }

    /// Ungraded routes fall back to the numeric scale.
    pub fn grade_mode(&self, route: &Route) -> GradeMode {
        self.effective_grade(route)
            .map_or(GradeMode::ByGrade, |grade| grade.mode)
    }

    /// Every line of `grade_id`, easiest first.
    pub fn lines_of_grade(&self, grade_id: GradeId) -> Vec<&GradeLine> {
        let mut lines: Vec<&GradeLine> = self
            .grade_lines
            .values()
            .filter(|line| line.grade_id == grade_id)
            .collect();
        lines.sort_by_key(|line| line.rank);
        lines
    }
}
