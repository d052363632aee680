//! Ascent records logged by climbers on routes.

use crate::model::catalog::CatalogValidationError;
use crate::model::route::RouteId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AscentId = Uuid;

/// Highest satisfaction note a climber can give.
pub const MAX_NOTE: u8 = 6;

/// Completed climb or logged attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AscentStatus {
    Made,
    Project,
}

impl AscentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Made => "made",
            Self::Project => "project",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "made" => Some(Self::Made),
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ascent {
    pub id: AscentId,
    pub route_id: RouteId,
    pub status: AscentStatus,
    /// Satisfaction note in `0..=MAX_NOTE`.
    pub note: Option<u8>,
    pub created_at: i64,
}

impl Ascent {
    pub fn new(route_id: RouteId, status: AscentStatus, note: Option<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            route_id,
            status,
            note,
            created_at: 0,
        }
    }

    pub fn is_made(&self) -> bool {
        self.status == AscentStatus::Made
    }

    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        match self.note {
            Some(note) if note > MAX_NOTE => Err(CatalogValidationError::NoteOutOfRange(note)),
            _ => Ok(()),
        }
    }
}
