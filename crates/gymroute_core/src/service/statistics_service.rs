//! Gym statistics use-cases.
//!
//! # Responsibility
//! - Resolve the active route population of a gym on a given day.
//! - Feed the population to the pure aggregators in `crate::stats`.
//!
//! # Invariants
//! - A `GymStatistics` session resolves its population and made ascents at
//!   most once; every aggregate of the session reads the same data.
//! - An empty population is not an error.

use crate::catalog::snapshot::CatalogSnapshot;
use crate::model::ascent::Ascent;
use crate::model::catalog::{GymId, OpenerId, SpaceId};
use crate::model::route::RouteId;
use crate::repo::ascent_repo::AscentRepository;
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::route_repo::{RepoError, RouteRepository};
use crate::stats::distribution::{
    grade_distribution, level_distribution, note_distribution, DefaultGradePalette,
    GradeDistribution, GradePalette, LevelChart, NoteDistribution,
};
use crate::stats::figures::{compute_figures, Figures};
use crate::stats::frequency::{opening_frequency, OpeningFrequency};
use crate::stats::population::{active_population, population_scope};
use chrono::{NaiveDate, Utc};
use log::{error, info};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum StatisticsError {
    GymNotFound(GymId),
    Repo(RepoError),
}

impl Display for StatisticsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GymNotFound(id) => write!(f, "gym not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StatisticsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::GymNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StatisticsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Every aggregate of one gym on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsBundle {
    pub gym_id: GymId,
    pub date: NaiveDate,
    pub figures: Figures,
    pub grade_distribution: GradeDistribution,
    pub level_distribution: Vec<LevelChart>,
    pub note_distribution: NoteDistribution,
    pub opening_frequency: OpeningFrequency,
}

pub struct StatisticsService<R: RouteRepository, A: AscentRepository, K: CatalogRepository> {
    routes: R,
    ascents: A,
    catalog: K,
    palette: Box<dyn GradePalette>,
}

impl<R, A, K> StatisticsService<R, A, K>
where
    R: RouteRepository,
    A: AscentRepository,
    K: CatalogRepository,
{
    pub fn new(routes: R, ascents: A, catalog: K) -> Self {
        Self {
            routes,
            ascents,
            catalog,
            palette: Box::new(DefaultGradePalette),
        }
    }

    pub fn with_palette(mut self, palette: impl GradePalette + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    /// Opens a statistics session; `date` defaults to today.
    ///
    /// Empty `space_ids` / `opener_ids` do not narrow the population.
    pub fn session(
        &self,
        gym_id: GymId,
        date: Option<NaiveDate>,
        space_ids: &[SpaceId],
        opener_ids: &[OpenerId],
    ) -> Result<GymStatistics<'_, R, A, K>, StatisticsError> {
        if self.catalog.get_gym(gym_id)?.is_none() {
            return Err(StatisticsError::GymNotFound(gym_id));
        }
        Ok(GymStatistics {
            service: self,
            gym_id,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            space_ids: space_ids.to_vec(),
            opener_ids: opener_ids.to_vec(),
            population: OnceCell::new(),
            made_ascents: OnceCell::new(),
        })
    }

    pub fn compute_statistics(
        &self,
        gym_id: GymId,
        date: Option<NaiveDate>,
        space_ids: &[SpaceId],
        opener_ids: &[OpenerId],
    ) -> Result<StatisticsBundle, StatisticsError> {
        let started_at = Instant::now();
        info!(
            "event=gym_statistics module=stats status=start gym_id={} spaces={} openers={}",
            gym_id,
            space_ids.len(),
            opener_ids.len()
        );
        let bundle = self
            .session(gym_id, date, space_ids, opener_ids)
            .and_then(|session| session.bundle());
        match &bundle {
            Ok(bundle) => info!(
                "event=gym_statistics module=stats status=ok gym_id={} route_count={} duration_ms={}",
                gym_id,
                bundle.figures.route_count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=gym_statistics module=stats status=error gym_id={} duration_ms={} error={}",
                gym_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        bundle
    }
}

/// Lazily resolved statistics of one gym on one day.
pub struct GymStatistics<'s, R, A, K>
where
    R: RouteRepository,
    A: AscentRepository,
    K: CatalogRepository,
{
    service: &'s StatisticsService<R, A, K>,
    gym_id: GymId,
    date: NaiveDate,
    space_ids: Vec<SpaceId>,
    opener_ids: Vec<OpenerId>,
    population: OnceCell<CatalogSnapshot>,
    made_ascents: OnceCell<Vec<Ascent>>,
}

impl<R, A, K> GymStatistics<'_, R, A, K>
where
    R: RouteRepository,
    A: AscentRepository,
    K: CatalogRepository,
{
    pub fn gym_id(&self) -> GymId {
        self.gym_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Routes standing on the wall on the session date, with their gym
    /// references.
    pub fn population(&self) -> Result<&CatalogSnapshot, StatisticsError> {
        self.population
            .get_or_try_init(|| -> Result<CatalogSnapshot, StatisticsError> {
                let service = self.service;
                let scope = population_scope(self.gym_id, &self.space_ids, &self.opener_ids);
                let routes = active_population(service.routes.fetch_routes(&scope)?, self.date);
                Ok(CatalogSnapshot::new(
                    routes,
                    service.catalog.list_sectors(self.gym_id)?,
                    service.catalog.list_grades(self.gym_id)?,
                    service.catalog.list_gym_grade_lines(self.gym_id)?,
                ))
            })
    }

    pub fn made_ascents(&self) -> Result<&[Ascent], StatisticsError> {
        let population = self.population()?;
        let ascents = self.made_ascents.get_or_try_init(|| {
            let route_ids: Vec<RouteId> = population.routes().iter().map(|r| r.id).collect();
            self.service
                .ascents
                .fetch_ascents(&route_ids, true)
                .map_err(StatisticsError::from)
        })?;
        Ok(ascents.as_slice())
    }

    pub fn figures(&self) -> Result<Figures, StatisticsError> {
        let population = self.population()?;
        let ascent_count = self.made_ascents()?.len();
        Ok(compute_figures(population.routes(), ascent_count, self.date))
    }

    pub fn grade_distribution(&self) -> Result<GradeDistribution, StatisticsError> {
        let population = self.population()?;
        Ok(grade_distribution(
            population.routes(),
            self.service.palette.as_ref(),
        ))
    }

    pub fn level_distribution(&self) -> Result<Vec<LevelChart>, StatisticsError> {
        let population = self.population()?;
        Ok(level_distribution(population.routes(), population))
    }

    pub fn note_distribution(&self) -> Result<NoteDistribution, StatisticsError> {
        Ok(note_distribution(self.made_ascents()?))
    }

    pub fn opening_frequency(&self) -> Result<OpeningFrequency, StatisticsError> {
        let population = self.population()?;
        Ok(opening_frequency(population.routes(), self.date))
    }

    pub fn bundle(&self) -> Result<StatisticsBundle, StatisticsError> {
        Ok(StatisticsBundle {
            gym_id: self.gym_id,
            date: self.date,
            figures: self.figures()?,
            grade_distribution: self.grade_distribution()?,
            level_distribution: self.level_distribution()?,
            note_distribution: self.note_distribution()?,
            opening_frequency: self.opening_frequency()?,
        })
    }
}
