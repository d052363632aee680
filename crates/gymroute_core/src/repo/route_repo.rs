//! Route store contract and SQLite implementation.
//!
//! # Responsibility
//! - Read route snapshots narrowed by gym/space/sector/opener/state scope.
//! - Persist route creation, editor updates, lifecycle state and deletion.
//!
//! # Invariants
//! - Write paths call `Route::validate()` before SQL mutations.
//! - Every successful write bumps `updated_at` strictly.
//! - Reads return routes in insertion order (the natural retrieval order).

use crate::db::DbError;
use crate::model::catalog::{
    CatalogValidationError, GymId, OpenerId, SectorId, SpaceId,
};
use crate::model::route::{Route, RouteId, RouteState, RouteValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ROUTE_SELECT_SQL: &str = "SELECT
    r.uuid AS uuid,
    r.sector_uuid AS sector_uuid,
    r.name AS name,
    r.opened_at AS opened_at,
    r.dismounted_at AS dismounted_at,
    r.min_grade_value AS min_grade_value,
    r.max_grade_value AS max_grade_value,
    r.grade_line_uuid AS grade_line_uuid,
    r.point AS point,
    r.created_at AS created_at,
    r.updated_at AS updated_at
FROM gym_routes r
INNER JOIN gym_sectors s ON s.uuid = r.sector_uuid
INNER JOIN gym_spaces sp ON sp.uuid = s.space_uuid";

/// Strictly increasing `updated_at` even for writes within one second.
pub(crate) const BUMP_UPDATED_AT_SQL: &str =
    "updated_at = MAX(updated_at + 1, (strftime('%s', 'now') * 1000))";

const OPENED_AT_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error shared by every catalog repository.
#[derive(Debug)]
pub enum RepoError {
    Validation(RouteValidationError),
    CatalogValidation(CatalogValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn route_not_found(id: RouteId) -> Self {
        Self::NotFound { entity: "route", id }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CatalogValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CatalogValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<RouteValidationError> for RepoError {
    fn from(value: RouteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CatalogValidationError> for RepoError {
    fn from(value: CatalogValidationError) -> Self {
        Self::CatalogValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Narrowing filter for route reads. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteScope {
    pub gym_id: Option<GymId>,
    pub space_id: Option<SpaceId>,
    pub sector_id: Option<SectorId>,
    /// Keeps routes whose space is one of these.
    pub space_ids: Vec<SpaceId>,
    /// Keeps routes credited to at least one of these openers.
    pub opener_ids: Vec<OpenerId>,
    pub state: Option<RouteState>,
}

impl RouteScope {
    pub fn gym(gym_id: GymId) -> Self {
        Self {
            gym_id: Some(gym_id),
            ..Self::default()
        }
    }

    pub fn sector(sector_id: SectorId) -> Self {
        Self {
            sector_id: Some(sector_id),
            ..Self::default()
        }
    }

    pub fn in_space(mut self, space_id: SpaceId) -> Self {
        self.space_id = Some(space_id);
        self
    }

    pub fn in_spaces(mut self, space_ids: Vec<SpaceId>) -> Self {
        self.space_ids = space_ids;
        self
    }

    pub fn opened_by(mut self, opener_ids: Vec<OpenerId>) -> Self {
        self.opener_ids = opener_ids;
        self
    }

    pub fn with_state(mut self, state: RouteState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Route persistence contract consumed by the engines.
pub trait RouteRepository {
    fn create_route(&self, route: &Route) -> RepoResult<RouteId>;
    fn get_route(&self, id: RouteId) -> RepoResult<Option<Route>>;
    /// Returns routes matching `scope` in natural retrieval order.
    fn fetch_routes(&self, scope: &RouteScope) -> RepoResult<Vec<Route>>;
    /// Saves editor-owned fields (name, sector, grades, grade line, point,
    /// opening date). Lifecycle state is left untouched.
    fn update_route(&self, route: &Route) -> RepoResult<Route>;
    /// Sets or clears `dismounted_at` and returns the stored route.
    fn update_route_state(
        &self,
        id: RouteId,
        dismounted_at: Option<DateTime<Utc>>,
    ) -> RepoResult<Route>;
    /// Hard delete; ascents and opener links cascade.
    fn delete_route(&self, id: RouteId) -> RepoResult<()>;
    /// Replaces the full opener set of a route.
    fn set_route_openers(&self, id: RouteId, opener_ids: &[OpenerId]) -> RepoResult<()>;
    fn list_route_openers(&self, id: RouteId) -> RepoResult<Vec<OpenerId>>;
}

/// SQLite-backed route repository.
pub struct SqliteRouteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRouteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RouteRepository for SqliteRouteRepository<'_> {
    fn create_route(&self, route: &Route) -> RepoResult<RouteId> {
        route.validate()?;

        self.conn.execute(
            "INSERT INTO gym_routes (
                uuid,
                sector_uuid,
                name,
                opened_at,
                dismounted_at,
                min_grade_value,
                max_grade_value,
                grade_line_uuid,
                point
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                route.id.to_string(),
                route.sector_id.to_string(),
                route.name.as_deref(),
                opened_at_to_db(route.opened_at),
                route.dismounted_at.map(|at| at.timestamp_millis()),
                route.min_grade_value,
                route.max_grade_value,
                route.grade_line_id.map(|id| id.to_string()),
                route.point,
            ],
        )?;

        Ok(route.id)
    }

    fn get_route(&self, id: RouteId) -> RepoResult<Option<Route>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ROUTE_SELECT_SQL} WHERE r.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_route_row(row)?));
        }
        Ok(None)
    }

    fn fetch_routes(&self, scope: &RouteScope) -> RepoResult<Vec<Route>> {
        let mut sql = format!("{ROUTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(gym_id) = scope.gym_id {
            sql.push_str(" AND sp.gym_uuid = ?");
            bind_values.push(Value::Text(gym_id.to_string()));
        }
        if let Some(space_id) = scope.space_id {
            sql.push_str(" AND sp.uuid = ?");
            bind_values.push(Value::Text(space_id.to_string()));
        }
        if let Some(sector_id) = scope.sector_id {
            sql.push_str(" AND r.sector_uuid = ?");
            bind_values.push(Value::Text(sector_id.to_string()));
        }
        if !scope.space_ids.is_empty() {
            sql.push_str(&format!(
                " AND sp.uuid IN ({})",
                placeholders(scope.space_ids.len())
            ));
            bind_values.extend(scope.space_ids.iter().map(|id| Value::Text(id.to_string())));
        }
        if !scope.opener_ids.is_empty() {
            sql.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM gym_route_openers ro
                    WHERE ro.route_uuid = r.uuid
                      AND ro.opener_uuid IN ({})
                )",
                placeholders(scope.opener_ids.len())
            ));
            bind_values.extend(scope.opener_ids.iter().map(|id| Value::Text(id.to_string())));
        }
        match scope.state {
            Some(RouteState::Mounted) => sql.push_str(" AND r.dismounted_at IS NULL"),
            Some(RouteState::Dismounted) => sql.push_str(" AND r.dismounted_at IS NOT NULL"),
            None => {}
        }

        sql.push_str(" ORDER BY r.rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut routes = Vec::new();
        while let Some(row) = rows.next()? {
            routes.push(parse_route_row(row)?);
        }
        Ok(routes)
    }

    fn update_route(&self, route: &Route) -> RepoResult<Route> {
        let stored = self
            .get_route(route.id)?
            .ok_or_else(|| RepoError::route_not_found(route.id))?;
        let mut candidate = route.clone();
        candidate.dismounted_at = stored.dismounted_at;
        candidate.validate()?;

        self.conn.execute(
            &format!(
                "UPDATE gym_routes
                 SET
                    sector_uuid = ?2,
                    name = ?3,
                    opened_at = ?4,
                    min_grade_value = ?5,
                    max_grade_value = ?6,
                    grade_line_uuid = ?7,
                    point = ?8,
                    {BUMP_UPDATED_AT_SQL}
                 WHERE uuid = ?1;"
            ),
            params![
                candidate.id.to_string(),
                candidate.sector_id.to_string(),
                candidate.name.as_deref(),
                opened_at_to_db(candidate.opened_at),
                candidate.min_grade_value,
                candidate.max_grade_value,
                candidate.grade_line_id.map(|id| id.to_string()),
                candidate.point,
            ],
        )?;

        self.get_route(route.id)?
            .ok_or_else(|| RepoError::route_not_found(route.id))
    }

    fn update_route_state(
        &self,
        id: RouteId,
        dismounted_at: Option<DateTime<Utc>>,
    ) -> RepoResult<Route> {
        let mut route = self
            .get_route(id)?
            .ok_or_else(|| RepoError::route_not_found(id))?;
        route.dismounted_at = dismounted_at;
        route.validate()?;

        self.conn.execute(
            &format!(
                "UPDATE gym_routes
                 SET
                    dismounted_at = ?2,
                    {BUMP_UPDATED_AT_SQL}
                 WHERE uuid = ?1;"
            ),
            params![id.to_string(), dismounted_at.map(|at| at.timestamp_millis())],
        )?;

        self.get_route(id)?
            .ok_or_else(|| RepoError::route_not_found(id))
    }

    fn delete_route(&self, id: RouteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM gym_routes WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::route_not_found(id));
        }
        Ok(())
    }

    fn set_route_openers(&self, id: RouteId, opener_ids: &[OpenerId]) -> RepoResult<()> {
        let route_uuid = id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM gym_routes WHERE uuid = ?1);",
            [route_uuid.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::route_not_found(id));
        }

        tx.execute(
            "DELETE FROM gym_route_openers WHERE route_uuid = ?1;",
            [route_uuid.as_str()],
        )?;
        for opener_id in opener_ids {
            tx.execute(
                "INSERT OR IGNORE INTO gym_route_openers (route_uuid, opener_uuid)
                 VALUES (?1, ?2);",
                params![route_uuid.as_str(), opener_id.to_string()],
            )?;
        }
        tx.execute(
            &format!("UPDATE gym_routes SET {BUMP_UPDATED_AT_SQL} WHERE uuid = ?1;"),
            [route_uuid.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_route_openers(&self, id: RouteId) -> RepoResult<Vec<OpenerId>> {
        let mut stmt = self.conn.prepare(
            "SELECT opener_uuid
             FROM gym_route_openers
             WHERE route_uuid = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut openers = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            openers.push(parse_uuid(&value, "gym_route_openers.opener_uuid")?);
        }
        Ok(openers)
    }
}

/// `?, ?, ?` for an `IN (...)` clause of `count` values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(value: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

fn parse_route_row(row: &Row<'_>) -> RepoResult<Route> {
    let uuid_text: String = row.get("uuid")?;
    let sector_text: String = row.get("sector_uuid")?;

    let opened_text: String = row.get("opened_at")?;
    let opened_at = NaiveDate::parse_from_str(&opened_text, OPENED_AT_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{opened_text}` in gym_routes.opened_at"
        ))
    })?;

    let dismounted_at = match row.get::<_, Option<i64>>("dismounted_at")? {
        Some(millis) => Some(DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(
            || {
                RepoError::InvalidData(format!(
                    "invalid timestamp `{millis}` in gym_routes.dismounted_at"
                ))
            },
        )?),
        None => None,
    };

    let route = Route {
        id: parse_uuid(&uuid_text, "gym_routes.uuid")?,
        sector_id: parse_uuid(&sector_text, "gym_routes.sector_uuid")?,
        name: row.get("name")?,
        opened_at,
        dismounted_at,
        min_grade_value: row.get("min_grade_value")?,
        max_grade_value: row.get("max_grade_value")?,
        grade_line_id: parse_optional_uuid(
            row.get("grade_line_uuid")?,
            "gym_routes.grade_line_uuid",
        )?,
        point: row.get("point")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    route.validate().map_err(|err| {
        RepoError::InvalidData(format!("gym_routes row {}: {err}", route.id))
    })?;
    Ok(route)
}

fn opened_at_to_db(date: NaiveDate) -> String {
    date.format(OPENED_AT_FORMAT).to_string()
}
