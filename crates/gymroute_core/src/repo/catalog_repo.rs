//! Gym structure store: gyms, spaces, sectors, grades, grade lines, openers.
//!
//! # Responsibility
//! - Persist and read the entities routes hang off.
//! - Provide the lookups the grouping and statistics engines snapshot.
//!
//! # Invariants
//! - Names are validated non-blank before insert.
//! - Grade lines are always returned in rank order.

use crate::model::catalog::{
    validate_name, Grade, GradeId, GradeLine, GradeLineId, GradeMode, Gym, GymId, Opener,
    OpenerId, Sector, SectorId, Space, SpaceId,
};
use crate::repo::route_repo::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const SECTOR_SELECT_SQL: &str = "SELECT
    s.uuid AS uuid,
    s.space_uuid AS space_uuid,
    s.name AS name,
    s.sort_order AS sort_order,
    s.grade_uuid AS grade_uuid
FROM gym_sectors s
INNER JOIN gym_spaces sp ON sp.uuid = s.space_uuid";

const GRADE_SELECT_SQL: &str = "SELECT
    uuid,
    gym_uuid,
    name,
    difficulty_mode,
    tag_color,
    hold_color
FROM gym_grades";

const GRADE_LINE_SELECT_SQL: &str = "SELECT
    gl.uuid AS uuid,
    gl.grade_uuid AS grade_uuid,
    gl.name AS name,
    gl.line_rank AS line_rank,
    gl.colors AS colors
FROM gym_grade_lines gl
INNER JOIN gym_grades g ON g.uuid = gl.grade_uuid";

const COLOR_SEPARATOR: &str = ",";

pub trait CatalogRepository {
    fn create_gym(&self, gym: &Gym) -> RepoResult<GymId>;
    fn get_gym(&self, id: GymId) -> RepoResult<Option<Gym>>;

    fn create_space(&self, space: &Space) -> RepoResult<SpaceId>;
    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>>;

    fn create_sector(&self, sector: &Sector) -> RepoResult<SectorId>;
    fn get_sector(&self, id: SectorId) -> RepoResult<Option<Sector>>;
    /// Sectors of every space of the gym, in insertion order.
    fn list_sectors(&self, gym_id: GymId) -> RepoResult<Vec<Sector>>;

    fn create_grade(&self, grade: &Grade) -> RepoResult<GradeId>;
    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>>;
    fn list_grades(&self, gym_id: GymId) -> RepoResult<Vec<Grade>>;

    fn create_grade_line(&self, line: &GradeLine) -> RepoResult<GradeLineId>;
    /// Lines of one grade, by ascending rank.
    fn list_grade_lines(&self, grade_id: GradeId) -> RepoResult<Vec<GradeLine>>;
    /// Lines of every grade of the gym, by grade then ascending rank.
    fn list_gym_grade_lines(&self, gym_id: GymId) -> RepoResult<Vec<GradeLine>>;

    fn create_opener(&self, opener: &Opener) -> RepoResult<OpenerId>;
    fn list_openers(&self, gym_id: GymId) -> RepoResult<Vec<Opener>>;
}

pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_gym(&self, gym: &Gym) -> RepoResult<GymId> {
        validate_name("gym", &gym.name)?;
        self.conn.execute(
            "INSERT INTO gyms (uuid, name) VALUES (?1, ?2);",
            params![gym.id.to_string(), gym.name.as_str()],
        )?;
        Ok(gym.id)
    }

    fn get_gym(&self, id: GymId) -> RepoResult<Option<Gym>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM gyms WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            return Ok(Some(Gym {
                id: parse_uuid(&uuid_text, "gyms.uuid")?,
                name: row.get("name")?,
            }));
        }
        Ok(None)
    }

    fn create_space(&self, space: &Space) -> RepoResult<SpaceId> {
        validate_name("space", &space.name)?;
        self.conn.execute(
            "INSERT INTO gym_spaces (uuid, gym_uuid, name, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                space.id.to_string(),
                space.gym_id.to_string(),
                space.name.as_str(),
                space.order,
            ],
        )?;
        Ok(space.id)
    }

    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, gym_uuid, name, sort_order FROM gym_spaces WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let gym_text: String = row.get("gym_uuid")?;
            return Ok(Some(Space {
                id: parse_uuid(&uuid_text, "gym_spaces.uuid")?,
                gym_id: parse_uuid(&gym_text, "gym_spaces.gym_uuid")?,
                name: row.get("name")?,
                order: row.get("sort_order")?,
            }));
        }
        Ok(None)
    }

    fn create_sector(&self, sector: &Sector) -> RepoResult<SectorId> {
        validate_name("sector", &sector.name)?;
        self.conn.execute(
            "INSERT INTO gym_sectors (uuid, space_uuid, name, sort_order, grade_uuid)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                sector.id.to_string(),
                sector.space_id.to_string(),
                sector.name.as_str(),
                sector.order,
                sector.grade_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(sector.id)
    }

    fn get_sector(&self, id: SectorId) -> RepoResult<Option<Sector>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SECTOR_SELECT_SQL} WHERE s.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_sector_row(row)?));
        }
        Ok(None)
    }

    fn list_sectors(&self, gym_id: GymId) -> RepoResult<Vec<Sector>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SECTOR_SELECT_SQL} WHERE sp.gym_uuid = ?1 ORDER BY s.rowid ASC;"
        ))?;
        let mut rows = stmt.query([gym_id.to_string()])?;
        let mut sectors = Vec::new();
        while let Some(row) = rows.next()? {
            sectors.push(parse_sector_row(row)?);
        }
        Ok(sectors)
    }

    fn create_grade(&self, grade: &Grade) -> RepoResult<GradeId> {
        validate_name("grade", &grade.name)?;
        self.conn.execute(
            "INSERT INTO gym_grades (uuid, gym_uuid, name, difficulty_mode, tag_color, hold_color)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                grade.id.to_string(),
                grade.gym_id.to_string(),
                grade.name.as_str(),
                grade.mode.as_str(),
                grade.tag_color,
                grade.hold_color,
            ],
        )?;
        Ok(grade.id)
    }

    fn get_grade(&self, id: GradeId) -> RepoResult<Option<Grade>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GRADE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_grade_row(row)?));
        }
        Ok(None)
    }

    fn list_grades(&self, gym_id: GymId) -> RepoResult<Vec<Grade>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_SELECT_SQL} WHERE gym_uuid = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([gym_id.to_string()])?;
        let mut grades = Vec::new();
        while let Some(row) = rows.next()? {
            grades.push(parse_grade_row(row)?);
        }
        Ok(grades)
    }

    fn create_grade_line(&self, line: &GradeLine) -> RepoResult<GradeLineId> {
        line.validate()?;
        self.conn.execute(
            "INSERT INTO gym_grade_lines (uuid, grade_uuid, name, line_rank, colors)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                line.id.to_string(),
                line.grade_id.to_string(),
                line.name.as_str(),
                line.rank,
                line.colors.join(COLOR_SEPARATOR),
            ],
        )?;
        Ok(line.id)
    }

    fn list_grade_lines(&self, grade_id: GradeId) -> RepoResult<Vec<GradeLine>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_LINE_SELECT_SQL} WHERE gl.grade_uuid = ?1 ORDER BY gl.line_rank ASC;"
        ))?;
        let mut rows = stmt.query([grade_id.to_string()])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(parse_grade_line_row(row)?);
        }
        Ok(lines)
    }

    fn list_gym_grade_lines(&self, gym_id: GymId) -> RepoResult<Vec<GradeLine>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GRADE_LINE_SELECT_SQL} WHERE g.gym_uuid = ?1 ORDER BY g.rowid ASC, gl.line_rank ASC;"
        ))?;
        let mut rows = stmt.query([gym_id.to_string()])?;
        let mut lines = Vec::new();
        while let Some(row) = rows.next()? {
            lines.push(parse_grade_line_row(row)?);
        }
        Ok(lines)
    }

    fn create_opener(&self, opener: &Opener) -> RepoResult<OpenerId> {
        validate_name("opener", &opener.name)?;
        self.conn.execute(
            "INSERT INTO gym_openers (uuid, gym_uuid, name) VALUES (?1, ?2, ?3);",
            params![
                opener.id.to_string(),
                opener.gym_id.to_string(),
                opener.name.as_str()
            ],
        )?;
        Ok(opener.id)
    }

    fn list_openers(&self, gym_id: GymId) -> RepoResult<Vec<Opener>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, gym_uuid, name
             FROM gym_openers
             WHERE gym_uuid = ?1
             ORDER BY name COLLATE NOCASE ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([gym_id.to_string()])?;
        let mut openers = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let gym_text: String = row.get("gym_uuid")?;
            openers.push(Opener {
                id: parse_uuid(&uuid_text, "gym_openers.uuid")?,
                gym_id: parse_uuid(&gym_text, "gym_openers.gym_uuid")?,
                name: row.get("name")?,
            });
        }
        Ok(openers)
    }
}

fn parse_sector_row(row: &Row<'_>) -> RepoResult<Sector> {
    let uuid_text: String = row.get("uuid")?;
    let space_text: String = row.get("space_uuid")?;
    Ok(Sector {
        id: parse_uuid(&uuid_text, "gym_sectors.uuid")?,
        space_id: parse_uuid(&space_text, "gym_sectors.space_uuid")?,
        name: row.get("name")?,
        order: row.get("sort_order")?,
        grade_id: parse_optional_uuid(row.get("grade_uuid")?, "gym_sectors.grade_uuid")?,
    })
}

fn parse_grade_row(row: &Row<'_>) -> RepoResult<Grade> {
    let uuid_text: String = row.get("uuid")?;
    let gym_text: String = row.get("gym_uuid")?;
    let mode_text: String = row.get("difficulty_mode")?;
    let mode = GradeMode::parse(&mode_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid difficulty mode `{mode_text}` in gym_grades.difficulty_mode"
        ))
    })?;
    Ok(Grade {
        id: parse_uuid(&uuid_text, "gym_grades.uuid")?,
        gym_id: parse_uuid(&gym_text, "gym_grades.gym_uuid")?,
        name: row.get("name")?,
        mode,
        tag_color: row.get("tag_color")?,
        hold_color: row.get("hold_color")?,
    })
}

fn parse_grade_line_row(row: &Row<'_>) -> RepoResult<GradeLine> {
    let uuid_text: String = row.get("uuid")?;
    let grade_text: String = row.get("grade_uuid")?;
    let colors_text: String = row.get("colors")?;
    let line = GradeLine {
        id: parse_uuid(&uuid_text, "gym_grade_lines.uuid")?,
        grade_id: parse_uuid(&grade_text, "gym_grade_lines.grade_uuid")?,
        name: row.get("name")?,
        rank: row.get("line_rank")?,
        colors: colors_text
            .split(COLOR_SEPARATOR)
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .map(str::to_string)
            .collect(),
    };
    line.validate().map_err(|err| {
        RepoError::InvalidData(format!("gym_grade_lines row {}: {err}", line.id))
    })?;
    Ok(line)
}
