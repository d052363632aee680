//! Ascent store contract and SQLite implementation.

use crate::model::ascent::{Ascent, AscentId, AscentStatus};
use crate::model::route::RouteId;
use crate::repo::route_repo::{parse_uuid, placeholders, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

// Keeps each `IN (...)` well under SQLite's bound-parameter limit.
const ROUTE_ID_CHUNK: usize = 500;

const ASCENT_SELECT_SQL: &str = "SELECT
    uuid,
    route_uuid,
    ascent_status,
    note,
    created_at
FROM ascents";

pub trait AscentRepository {
    fn create_ascent(&self, ascent: &Ascent) -> RepoResult<AscentId>;
    /// Ascents logged on any of `route_ids`; `made_only` drops projects.
    fn fetch_ascents(&self, route_ids: &[RouteId], made_only: bool) -> RepoResult<Vec<Ascent>>;
    fn list_route_ascents(&self, route_id: RouteId) -> RepoResult<Vec<Ascent>>;
}

pub struct SqliteAscentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAscentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AscentRepository for SqliteAscentRepository<'_> {
    fn create_ascent(&self, ascent: &Ascent) -> RepoResult<AscentId> {
        ascent.validate()?;

        self.conn.execute(
            "INSERT INTO ascents (uuid, route_uuid, ascent_status, note)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                ascent.id.to_string(),
                ascent.route_id.to_string(),
                ascent.status.as_str(),
                ascent.note,
            ],
        )?;
        Ok(ascent.id)
    }

    fn fetch_ascents(&self, route_ids: &[RouteId], made_only: bool) -> RepoResult<Vec<Ascent>> {
        let mut ascents = Vec::new();
        for chunk in route_ids.chunks(ROUTE_ID_CHUNK) {
            let mut sql = format!(
                "{ASCENT_SELECT_SQL} WHERE route_uuid IN ({})",
                placeholders(chunk.len())
            );
            if made_only {
                sql.push_str(" AND ascent_status = 'made'");
            }
            sql.push_str(" ORDER BY rowid ASC;");

            let bind_values = chunk.iter().map(|id| Value::Text(id.to_string()));
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            while let Some(row) = rows.next()? {
                ascents.push(parse_ascent_row(row)?);
            }
        }
        Ok(ascents)
    }

    fn list_route_ascents(&self, route_id: RouteId) -> RepoResult<Vec<Ascent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASCENT_SELECT_SQL} WHERE route_uuid = ?1 ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([route_id.to_string()])?;
        let mut ascents = Vec::new();
        while let Some(row) = rows.next()? {
            ascents.push(parse_ascent_row(row)?);
        }
        Ok(ascents)
    }
}

fn parse_ascent_row(row: &Row<'_>) -> RepoResult<Ascent> {
    let uuid_text: String = row.get("uuid")?;
    let route_text: String = row.get("route_uuid")?;
    let status_text: String = row.get("ascent_status")?;
    let status = AscentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid ascent status `{status_text}` in ascents.ascent_status"
        ))
    })?;

    let note = match row.get::<_, Option<i64>>("note")? {
        Some(value) => Some(u8::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid note `{value}` in ascents.note"))
        })?),
        None => None,
    };

    Ok(Ascent {
        id: parse_uuid(&uuid_text, "ascents.uuid")?,
        route_id: parse_uuid(&route_text, "ascents.route_uuid")?,
        status,
        note,
        created_at: row.get("created_at")?,
    })
}
