//! Route domain model and lifecycle state.
//!
//! # Responsibility
//! - Define the canonical route record shared by every engine.
//! - Derive mounted/dismounted state from `dismounted_at`.
//!
//! # Invariants
//! - `dismounted_at` is `None` or falls on/after `opened_at`.
//! - `min_grade_value <= max_grade_value` when both are set.
//! - Grade values stay on the `0..=MAX_GRADE_VALUE` scale.

use crate::model::catalog::{GradeLineId, SectorId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a route.
pub type RouteId = Uuid;

/// Upper bound of the numeric grade scale (two units per sub-grade).
pub const MAX_GRADE_VALUE: i32 = 54;

/// Sub-grade letters of one whole grade, two scale units each.
const SUB_GRADES: [char; 3] = ['a', 'b', 'c'];

/// Renders a scale value as a climbing grade: odd values are whole
/// sub-grades (`31` is `6a`), even values their `+` (`32` is `6a+`).
pub fn grade_value_label(value: i32) -> Option<String> {
    if !(1..=MAX_GRADE_VALUE).contains(&value) {
        return None;
    }
    let offset = value - 1;
    let level = offset / 6 + 1;
    let letter = SUB_GRADES[((offset % 6) / 2) as usize];
    let plus = if offset % 2 == 1 { "+" } else { "" };
    Some(format!("{level}{letter}{plus}"))
}

/// Whether the route is physically on the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    Mounted,
    Dismounted,
}

/// A single climbing route of a gym sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub sector_id: SectorId,
    /// Optional display name; many gym routes are only known by color.
    pub name: Option<String>,
    /// Calendar day the route was opened.
    pub opened_at: NaiveDate,
    /// `None` while mounted.
    pub dismounted_at: Option<DateTime<Utc>>,
    pub min_grade_value: Option<i32>,
    pub max_grade_value: Option<i32>,
    /// Set only under level-based grades.
    pub grade_line_id: Option<GradeLineId>,
    /// Computed score; absent scores rank as zero.
    pub point: Option<i64>,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Epoch milliseconds, bumped by every store write. Doubles as the
    /// cache version of the route.
    pub updated_at: i64,
}

impl Route {
    /// Creates a mounted route opened on `opened_at`.
    pub fn new(sector_id: SectorId, opened_at: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), sector_id, opened_at)
    }

    /// Creates a mounted route with a caller-provided id.
    pub fn with_id(id: RouteId, sector_id: SectorId, opened_at: NaiveDate) -> Self {
        Self {
            id,
            sector_id,
            name: None,
            opened_at,
            dismounted_at: None,
            min_grade_value: None,
            max_grade_value: None,
            grade_line_id: None,
            point: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn state(&self) -> RouteState {
        if self.dismounted_at.is_some() {
            RouteState::Dismounted
        } else {
            RouteState::Mounted
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.state() == RouteState::Mounted
    }

    /// Returns whether the route stood on the wall during `date`.
    ///
    /// A route dismounted on `date` itself still counts for that day.
    pub fn was_mounted_on(&self, date: NaiveDate) -> bool {
        self.opened_at <= date
            && self
                .dismounted_at
                .map_or(true, |dismounted_at| dismounted_at.date_naive() >= date)
    }

    /// Checks domain invariants before persistence.
    pub fn validate(&self) -> Result<(), RouteValidationError> {
        if let Some(dismounted_at) = self.dismounted_at {
            if dismounted_at.date_naive() < self.opened_at {
                return Err(RouteValidationError::DismountedBeforeOpening {
                    opened_at: self.opened_at,
                    dismounted_at,
                });
            }
        }

        for value in [self.min_grade_value, self.max_grade_value].into_iter().flatten() {
            if !(0..=MAX_GRADE_VALUE).contains(&value) {
                return Err(RouteValidationError::GradeValueOutOfScale(value));
            }
        }

        if let (Some(min), Some(max)) = (self.min_grade_value, self.max_grade_value) {
            if min > max {
                return Err(RouteValidationError::GradeRangeInverted { min, max });
            }
        }

        if let Some(point) = self.point {
            if point < 0 {
                return Err(RouteValidationError::NegativePoint(point));
            }
        }

        Ok(())
    }
}

/// Route invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteValidationError {
    DismountedBeforeOpening {
        opened_at: NaiveDate,
        dismounted_at: DateTime<Utc>,
    },
    GradeValueOutOfScale(i32),
    GradeRangeInverted {
        min: i32,
        max: i32,
    },
    NegativePoint(i64),
}

impl Display for RouteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DismountedBeforeOpening {
                opened_at,
                dismounted_at,
            } => write!(
                f,
                "dismounted_at ({dismounted_at}) must not be before opened_at ({opened_at})"
            ),
            Self::GradeValueOutOfScale(value) => write!(
                f,
                "grade value {value} is outside 0..={MAX_GRADE_VALUE}"
            ),
            Self::GradeRangeInverted { min, max } => write!(
                f,
                "min_grade_value ({min}) must not exceed max_grade_value ({max})"
            ),
            Self::NegativePoint(point) => write!(f, "point must not be negative, got {point}"),
        }
    }
}

impl Error for RouteValidationError {}

#[cfg(test)]
mod tests {
    use super::{grade_value_label, Route, RouteState, RouteValidationError};
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_route_starts_mounted() {
        let route = Route::new(Uuid::new_v4(), day(2024, 1, 1));
        assert_eq!(route.state(), RouteState::Mounted);
        assert!(route.validate().is_ok());
    }

    #[test]
    fn dismount_before_opening_is_rejected() {
        let mut route = Route::new(Uuid::new_v4(), day(2024, 1, 10));
        route.dismounted_at = Some(Utc.with_ymd_and_hms(2024, 1, 9, 18, 0, 0).unwrap());
        assert!(matches!(
            route.validate(),
            Err(RouteValidationError::DismountedBeforeOpening { .. })
        ));

        route.dismounted_at = Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap());
        assert!(route.validate().is_ok());
        assert_eq!(route.state(), RouteState::Dismounted);
    }

    #[test]
    fn grade_rules_are_enforced() {
        let mut route = Route::new(Uuid::new_v4(), day(2024, 1, 1));
        route.min_grade_value = Some(21);
        route.max_grade_value = Some(15);
        assert_eq!(
            route.validate(),
            Err(RouteValidationError::GradeRangeInverted { min: 21, max: 15 })
        );

        route.min_grade_value = Some(15);
        route.max_grade_value = Some(60);
        assert_eq!(
            route.validate(),
            Err(RouteValidationError::GradeValueOutOfScale(60))
        );
    }

    #[test]
    fn was_mounted_on_includes_the_dismount_day() {
        let mut route = Route::new(Uuid::new_v4(), day(2024, 1, 1));
        route.dismounted_at = Some(Utc.with_ymd_and_hms(2024, 1, 2, 17, 30, 0).unwrap());

        assert!(!route.was_mounted_on(day(2023, 12, 31)));
        assert!(route.was_mounted_on(day(2024, 1, 1)));
        assert!(route.was_mounted_on(day(2024, 1, 2)));
        assert!(!route.was_mounted_on(day(2024, 1, 5)));
    }

    #[test]
    fn grade_value_label_maps_scale_to_grades() {
        assert_eq!(grade_value_label(1).as_deref(), Some("1a"));
        assert_eq!(grade_value_label(31).as_deref(), Some("6a"));
        assert_eq!(grade_value_label(32).as_deref(), Some("6a+"));
        assert_eq!(grade_value_label(36).as_deref(), Some("6c+"));
        assert_eq!(grade_value_label(54).as_deref(), Some("9c+"));
        assert_eq!(grade_value_label(0), None);
    }
}
