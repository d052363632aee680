use chrono::{NaiveDate, TimeZone, Utc};
use gymroute_core::db::open_db_in_memory;
use gymroute_core::{
    Ascent, AscentRepository, AscentStatus, CatalogRepository, CatalogValidationError, Grade,
    GradeLine, GradeMode, Gym, Opener, RepoError, Route, RouteRepository, RouteScope,
    RouteState, RouteValidationError, Sector, Space, SqliteAscentRepository,
    SqliteCatalogRepository, SqliteRouteRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Wall {
    gym: Gym,
    space: Space,
    sector: Sector,
}

fn wall(conn: &Connection) -> Wall {
    let catalog = SqliteCatalogRepository::new(conn);
    let gym = Gym::new("Block Out");
    catalog.create_gym(&gym).unwrap();
    let space = Space::new(gym.id, "Main hall", 1);
    catalog.create_space(&space).unwrap();
    let sector = Sector::new(space.id, "Slab", 1);
    catalog.create_sector(&sector).unwrap();
    Wall { gym, space, sector }
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let mut route = Route::new(wall.sector.id, day(1, 3));
    route.name = Some("Crimpy".to_string());
    route.min_grade_value = Some(29);
    route.max_grade_value = Some(31);
    route.point = Some(120);
    let id = repo.create_route(&route).unwrap();

    let loaded = repo.get_route(id).unwrap().unwrap();
    assert_eq!(loaded.id, route.id);
    assert_eq!(loaded.sector_id, wall.sector.id);
    assert_eq!(loaded.name.as_deref(), Some("Crimpy"));
    assert_eq!(loaded.opened_at, day(1, 3));
    assert_eq!(loaded.state(), RouteState::Mounted);
    assert_eq!(loaded.min_grade_value, Some(29));
    assert_eq!(loaded.max_grade_value, Some(31));
    assert_eq!(loaded.point, Some(120));
    assert!(loaded.created_at > 0);
}

#[test]
fn create_rejects_invalid_route() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let mut route = Route::new(wall.sector.id, day(1, 3));
    route.min_grade_value = Some(40);
    route.max_grade_value = Some(20);

    let err = repo.create_route(&route).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RouteValidationError::GradeRangeInverted { min: 40, max: 20 })
    ));
    assert!(repo.get_route(route.id).unwrap().is_none());
}

#[test]
fn state_update_bumps_version_and_round_trips_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(1, 1));
    repo.create_route(&route).unwrap();
    let before = repo.get_route(route.id).unwrap().unwrap();

    let taken_down = Utc.with_ymd_and_hms(2024, 1, 5, 18, 30, 0).unwrap();
    let dismounted = repo
        .update_route_state(route.id, Some(taken_down))
        .unwrap();
    assert_eq!(dismounted.dismounted_at, Some(taken_down));
    assert!(dismounted.updated_at > before.updated_at);

    let remounted = repo.update_route_state(route.id, None).unwrap();
    assert_eq!(remounted.state(), RouteState::Mounted);
    assert!(remounted.updated_at > dismounted.updated_at);
}

#[test]
fn state_update_rejects_dismount_before_opening() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(3, 1));
    repo.create_route(&route).unwrap();

    let err = repo
        .update_route_state(
            route.id,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(RouteValidationError::DismountedBeforeOpening { .. })
    ));
    assert!(repo.get_route(route.id).unwrap().unwrap().is_mounted());
}

#[test]
fn editor_update_keeps_lifecycle_state() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(1, 1));
    repo.create_route(&route).unwrap();
    let taken_down = Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap();
    repo.update_route_state(route.id, Some(taken_down)).unwrap();

    let mut edited = route.clone();
    edited.name = Some("Renamed".to_string());
    let stored = repo.update_route(&edited).unwrap();

    assert_eq!(stored.name.as_deref(), Some("Renamed"));
    assert_eq!(stored.dismounted_at, Some(taken_down));
}

#[test]
fn missing_route_is_not_found_on_mutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRouteRepository::new(&conn);
    let id = Uuid::new_v4();

    assert!(matches!(
        repo.update_route_state(id, None),
        Err(RepoError::NotFound { entity: "route", .. })
    ));
    assert!(matches!(
        repo.delete_route(id),
        Err(RepoError::NotFound { entity: "route", .. })
    ));
}

#[test]
fn fetch_routes_narrows_by_scope_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let catalog = SqliteCatalogRepository::new(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let cave_space = Space::new(wall.gym.id, "Cave", 2);
    catalog.create_space(&cave_space).unwrap();
    let cave = Sector::new(cave_space.id, "Roof", 1);
    catalog.create_sector(&cave).unwrap();

    let other_gym = Gym::new("Elsewhere");
    catalog.create_gym(&other_gym).unwrap();
    let other_space = Space::new(other_gym.id, "Hall", 1);
    catalog.create_space(&other_space).unwrap();
    let other_sector = Sector::new(other_space.id, "Wall", 1);
    catalog.create_sector(&other_sector).unwrap();

    let first = Route::new(wall.sector.id, day(1, 4));
    let second = Route::new(cave.id, day(1, 2));
    let third = Route::new(wall.sector.id, day(1, 1));
    let foreign = Route::new(other_sector.id, day(1, 1));
    for route in [&first, &second, &third, &foreign] {
        repo.create_route(route).unwrap();
    }
    repo.update_route_state(
        third.id,
        Some(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()),
    )
    .unwrap();

    let ids = |scope: RouteScope| -> Vec<Uuid> {
        repo.fetch_routes(&scope)
            .unwrap()
            .into_iter()
            .map(|route| route.id)
            .collect()
    };

    assert_eq!(
        ids(RouteScope::gym(wall.gym.id)),
        vec![first.id, second.id, third.id]
    );
    assert_eq!(
        ids(RouteScope::gym(wall.gym.id).in_space(cave_space.id)),
        vec![second.id]
    );
    assert_eq!(
        ids(RouteScope::sector(wall.sector.id)),
        vec![first.id, third.id]
    );
    assert_eq!(
        ids(RouteScope::gym(wall.gym.id).with_state(RouteState::Dismounted)),
        vec![third.id]
    );
    assert_eq!(
        ids(RouteScope::gym(wall.gym.id).in_spaces(vec![wall.space.id])),
        vec![first.id, third.id]
    );
}

#[test]
fn fetch_routes_narrows_by_opener() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let catalog = SqliteCatalogRepository::new(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let alex = Opener::new(wall.gym.id, "Alex");
    let sam = Opener::new(wall.gym.id, "Sam");
    catalog.create_opener(&sam).unwrap();
    catalog.create_opener(&alex).unwrap();
    let names: Vec<String> = catalog
        .list_openers(wall.gym.id)
        .unwrap()
        .into_iter()
        .map(|opener| opener.name)
        .collect();
    assert_eq!(names, vec!["Alex", "Sam"]);

    let by_alex = Route::new(wall.sector.id, day(1, 1));
    let by_both = Route::new(wall.sector.id, day(1, 2));
    let unknown = Route::new(wall.sector.id, day(1, 3));
    for route in [&by_alex, &by_both, &unknown] {
        repo.create_route(route).unwrap();
    }
    repo.set_route_openers(by_alex.id, &[alex.id]).unwrap();
    repo.set_route_openers(by_both.id, &[alex.id, sam.id]).unwrap();

    let scope = RouteScope::gym(wall.gym.id).opened_by(vec![sam.id]);
    let routes = repo.fetch_routes(&scope).unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].id, by_both.id);

    let scope = RouteScope::gym(wall.gym.id).opened_by(vec![alex.id, sam.id]);
    assert_eq!(repo.fetch_routes(&scope).unwrap().len(), 2);

    assert_eq!(
        repo.list_route_openers(by_both.id).unwrap(),
        vec![alex.id, sam.id]
    );
    repo.set_route_openers(by_both.id, &[]).unwrap();
    assert!(repo.list_route_openers(by_both.id).unwrap().is_empty());
}

#[test]
fn delete_cascades_to_ascents() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);
    let ascents = SqliteAscentRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(1, 1));
    repo.create_route(&route).unwrap();
    ascents
        .create_ascent(&Ascent::new(route.id, AscentStatus::Made, Some(5)))
        .unwrap();
    ascents
        .create_ascent(&Ascent::new(route.id, AscentStatus::Project, None))
        .unwrap();
    assert_eq!(ascents.list_route_ascents(route.id).unwrap().len(), 2);
    assert_eq!(ascents.fetch_ascents(&[route.id], true).unwrap().len(), 1);

    repo.delete_route(route.id).unwrap();
    assert!(repo.get_route(route.id).unwrap().is_none());
    assert!(ascents.list_route_ascents(route.id).unwrap().is_empty());
}

#[test]
fn ascent_note_outside_domain_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);
    let ascents = SqliteAscentRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(1, 1));
    repo.create_route(&route).unwrap();
    let err = ascents
        .create_ascent(&Ascent::new(route.id, AscentStatus::Made, Some(7)))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::CatalogValidation(CatalogValidationError::NoteOutOfRange(7))
    ));
}

#[test]
fn catalog_entities_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let catalog = SqliteCatalogRepository::new(&conn);

    let grade = Grade::new(wall.gym.id, "Colors", GradeMode::ByLevel);
    catalog.create_grade(&grade).unwrap();
    let hard = GradeLine::new(grade.id, "Black", 2, vec!["#000000".to_string()]);
    let easy = GradeLine::new(
        grade.id,
        "Yellow",
        1,
        vec!["#ffff00".to_string(), "#ffffff".to_string()],
    );
    catalog.create_grade_line(&hard).unwrap();
    catalog.create_grade_line(&easy).unwrap();

    let mut graded = Sector::new(wall.space.id, "Arete", 2);
    graded.grade_id = Some(grade.id);
    catalog.create_sector(&graded).unwrap();

    assert_eq!(catalog.get_gym(wall.gym.id).unwrap(), Some(wall.gym.clone()));
    assert_eq!(catalog.get_space(wall.space.id).unwrap(), Some(wall.space.clone()));
    assert_eq!(catalog.get_sector(graded.id).unwrap(), Some(graded.clone()));
    assert_eq!(catalog.get_grade(grade.id).unwrap(), Some(grade.clone()));
    assert_eq!(catalog.list_grades(wall.gym.id).unwrap(), vec![grade.clone()]);
    assert_eq!(
        catalog.list_grade_lines(grade.id).unwrap(),
        vec![easy.clone(), hard.clone()]
    );
    assert_eq!(
        catalog.list_gym_grade_lines(wall.gym.id).unwrap(),
        vec![easy, hard]
    );
    assert_eq!(
        catalog.list_sectors(wall.gym.id).unwrap(),
        vec![wall.sector, graded]
    );
}

#[test]
fn catalog_rejects_blank_names_and_bad_colors() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::new(&conn);

    assert!(matches!(
        catalog.create_gym(&Gym::new("  ")),
        Err(RepoError::CatalogValidation(CatalogValidationError::BlankName("gym")))
    ));

    let gym = Gym::new("Block Out");
    catalog.create_gym(&gym).unwrap();
    let grade = Grade::new(gym.id, "Colors", GradeMode::ByLevel);
    catalog.create_grade(&grade).unwrap();
    let line = GradeLine::new(grade.id, "Pink", 1, vec!["pink".to_string()]);
    assert!(matches!(
        catalog.create_grade_line(&line),
        Err(RepoError::CatalogValidation(CatalogValidationError::InvalidColor(_)))
    ));
}

#[test]
fn corrupt_persisted_route_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let repo = SqliteRouteRepository::new(&conn);

    let route = Route::new(wall.sector.id, day(1, 1));
    repo.create_route(&route).unwrap();
    conn.execute(
        "UPDATE gym_routes SET max_grade_value = 99 WHERE uuid = ?1;",
        [route.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        repo.get_route(route.id),
        Err(RepoError::InvalidData(_))
    ));
    assert!(matches!(
        repo.fetch_routes(&RouteScope::gym(wall.gym.id)),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn corrupt_persisted_grade_line_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let wall = wall(&conn);
    let catalog = SqliteCatalogRepository::new(&conn);

    let grade = Grade::new(wall.gym.id, "Colors", GradeMode::ByLevel);
    catalog.create_grade(&grade).unwrap();
    let line = GradeLine::new(grade.id, "Green", 1, vec!["#00ff00".to_string()]);
    catalog.create_grade_line(&line).unwrap();
    conn.execute(
        "UPDATE gym_grade_lines SET colors = 'green' WHERE uuid = ?1;",
        [line.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        catalog.list_grade_lines(grade.id),
        Err(RepoError::InvalidData(_))
    ));
}
