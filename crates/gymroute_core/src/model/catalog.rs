//! Gym structure entities: spaces, sectors, grading schemes, openers.
//!
//! # Responsibility
//! - Describe where routes live (gym > space > sector).
//! - Describe how routes are graded (numeric scale or named levels).
//!
//! # Invariants
//! - A grade is either by-grade or by-level, never both.
//! - Grade lines carry at least one `#rrggbb` color.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type GymId = Uuid;
pub type SpaceId = Uuid;
pub type SectorId = Uuid;
pub type GradeId = Uuid;
pub type GradeLineId = Uuid;
pub type OpenerId = Uuid;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gym {
    pub id: GymId,
    pub name: String,
}

impl Gym {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A room or wall area of a gym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub gym_id: GymId,
    pub name: String,
    pub order: i64,
}

impl Space {
    pub fn new(gym_id: GymId, name: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            gym_id,
            name: name.into(),
            order,
        }
    }
}

/// A wall section grouping routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub space_id: SpaceId,
    pub name: String,
    /// Explicit display order inside the gym.
    pub order: i64,
    /// Shared grading scheme of the sector's routes, when there is one.
    pub grade_id: Option<GradeId>,
}

impl Sector {
    pub fn new(space_id: SpaceId, name: impl Into<String>, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            space_id,
            name: name.into(),
            order,
            grade_id: None,
        }
    }
}

/// How a grading scheme expresses difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeMode {
    /// Continuous numeric scale (`min/max_grade_value`).
    ByGrade,
    /// Discrete ordered tiers (`GradeLine`).
    ByLevel,
}

impl GradeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByGrade => "by_grade",
            Self::ByLevel => "by_level",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "by_grade" => Some(Self::ByGrade),
            "by_level" => Some(Self::ByLevel),
            _ => None,
        }
    }
}

/// A named grading scheme of a gym.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub gym_id: GymId,
    pub name: String,
    pub mode: GradeMode,
    /// Level shown with tags on the wall.
    pub tag_color: bool,
    /// Level shown with hold colors.
    pub hold_color: bool,
}

impl Grade {
    pub fn new(gym_id: GymId, name: impl Into<String>, mode: GradeMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            gym_id,
            name: name.into(),
            mode,
            tag_color: false,
            hold_color: false,
        }
    }

    pub fn is_by_level(&self) -> bool {
        self.mode == GradeMode::ByLevel
    }
}

/// One tier of a level-based grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeLine {
    pub id: GradeLineId,
    pub grade_id: GradeId,
    pub name: String,
    /// Position within the grade, easiest first.
    pub rank: i64,
    pub colors: Vec<String>,
}

impl GradeLine {
    pub fn new(
        grade_id: GradeId,
        name: impl Into<String>,
        rank: i64,
        colors: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            grade_id,
            name: name.into(),
            rank,
            colors,
        }
    }

    /// First color, used to paint charts and buckets.
    pub fn primary_color(&self) -> Option<&str> {
        self.colors.first().map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        if self.name.trim().is_empty() {
            return Err(CatalogValidationError::BlankName("grade line"));
        }
        if self.colors.is_empty() {
            return Err(CatalogValidationError::MissingColor);
        }
        if let Some(bad) = self.colors.iter().find(|c| !HEX_COLOR_RE.is_match(c)) {
            return Err(CatalogValidationError::InvalidColor(bad.clone()));
        }
        Ok(())
    }
}

/// A person credited with opening routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opener {
    pub id: OpenerId,
    pub gym_id: GymId,
    pub name: String,
}

impl Opener {
    pub fn new(gym_id: GymId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            gym_id,
            name: name.into(),
        }
    }
}

/// Rejects blank names on any named catalog entity.
pub fn validate_name(entity: &'static str, name: &str) -> Result<(), CatalogValidationError> {
    if name.trim().is_empty() {
        Err(CatalogValidationError::BlankName(entity))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogValidationError {
    BlankName(&'static str),
    MissingColor,
    InvalidColor(String),
    NoteOutOfRange(u8),
}

impl Display for CatalogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(entity) => write!(f, "{entity} name must not be blank"),
            Self::MissingColor => write!(f, "grade line needs at least one color"),
            Self::InvalidColor(value) => write!(f, "invalid color `{value}`, expected #rrggbb"),
            Self::NoteOutOfRange(note) => write!(f, "ascent note {note} is outside 0..=6"),
        }
    }
}

impl Error for CatalogValidationError {}

#[cfg(test)]
mod tests {
    use super::{CatalogValidationError, GradeLine, GradeMode};
    use uuid::Uuid;

    #[test]
    fn grade_mode_parses_its_own_db_values() {
        for mode in [GradeMode::ByGrade, GradeMode::ByLevel] {
            assert_eq!(GradeMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(GradeMode::parse("by_color"), None);
    }

    #[test]
    fn grade_line_colors_must_be_hex() {
        let mut line = GradeLine::new(Uuid::new_v4(), "Green", 1, vec!["#00ff00".to_string()]);
        assert!(line.validate().is_ok());
        assert_eq!(line.primary_color(), Some("#00ff00"));

        line.colors = vec!["green".to_string()];
        assert_eq!(
            line.validate(),
            Err(CatalogValidationError::InvalidColor("green".to_string()))
        );

        line.colors.clear();
        assert_eq!(line.validate(), Err(CatalogValidationError::MissingColor));
    }
}
