#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use fieldcheck::core::context::{FieldContext, WorkflowSettings};
use fieldcheck::core::notify::Notifier;
use fieldcheck::core::zones::parse_zones;
use fieldcheck::db::initialize::init_db;
use fieldcheck::db::pool::DbPool;
use fieldcheck::errors::{AppError, AppResult};
use fieldcheck::models::notification::Notification;
use fieldcheck::models::position::Position;
use fieldcheck::models::zone::Zone;
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;

/// Meters per degree of latitude on the haversine sphere.
pub const M_PER_DEG: f64 = 6_371_000.0 * PI / 180.0;

pub const DEPOT_LAT: f64 = 31.9;
pub const DEPOT_LNG: f64 = 35.2;

pub const ZONES_YAML: &str = r#"
zones:
  - id: 1
    name: Depot
    reference: {lat: 31.9, lng: 35.2}
  - id: 2
    name: Old Town
    boundary:
      - {lat: 31.89, lng: 35.19}
      - {lat: 31.89, lng: 35.21}
      - {lat: 31.91, lng: 35.21}
      - {lat: 31.91, lng: 35.19}
  - id: 3
    name: Unsurveyed
    boundary:
      - {lat: 31.89, lng: 35.19}
      - {lat: 31.89, lng: 35.21}
"#;

/// Private HOME so the binary never touches the real configuration.
fn test_home() -> PathBuf {
    let mut path = env::temp_dir();
    path.push("fieldcheck_test_home");
    fs::create_dir_all(&path).ok();
    path
}

pub fn rti() -> Command {
    let mut cmd = cargo_bin_cmd!("fieldcheck");
    cmd.env("HOME", test_home());
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_fieldcheck.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Write the shared zones file for CLI tests and return its path.
pub fn setup_zones_file(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_zones.yaml", name));
    fs::write(&path, ZONES_YAML).expect("write zones file");
    path.to_string_lossy().to_string()
}

/// Latitude `meters` north of the depot, formatted for the command line.
pub fn lat_north_of_depot(meters: f64) -> String {
    format!("{:.7}", DEPOT_LAT + meters / M_PER_DEG)
}

pub fn north_of_depot(meters: f64, accuracy: f64) -> Position {
    Position::new(DEPOT_LAT + meters / M_PER_DEG, DEPOT_LNG, accuracy)
}

pub fn zones() -> HashMap<i64, Zone> {
    parse_zones(ZONES_YAML).expect("parse zones")
}

/// A migrated database plus the collaborators a workflow call needs.
pub struct Harness {
    pub db_path: String,
    pub pool: DbPool,
    pub zones: HashMap<i64, Zone>,
    pub settings: WorkflowSettings,
}

impl Harness {
    pub fn new(name: &str) -> Self {
        let db_path = setup_test_db(name);
        Self::open(&db_path)
    }

    /// Another handle on an existing database.
    pub fn open(db_path: &str) -> Self {
        let pool = DbPool::new(db_path).expect("open db");
        init_db(&pool.conn).expect("init db");
        Self {
            db_path: db_path.to_string(),
            pool,
            zones: zones(),
            settings: WorkflowSettings::default(),
        }
    }

    pub fn ctx<'a>(&'a mut self, notifier: &'a dyn Notifier) -> FieldContext<'a> {
        FieldContext::new(&mut self.pool, &self.zones, self.settings, notifier)
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.pool
            .conn
            .query_row(sql, [], |row| row.get(0))
            .expect("count query")
    }
}

/// Keeps every notification in memory.
#[derive(Default)]
pub struct Recorder {
    pub sent: RefCell<Vec<Notification>>,
}

impl Notifier for Recorder {
    fn notify(&self, n: &Notification) -> AppResult<()> {
        self.sent.borrow_mut().push(n.clone());
        Ok(())
    }
}

/// Always fails, like a mail relay that is down.
pub struct Broken;

impl Notifier for Broken {
    fn notify(&self, _n: &Notification) -> AppResult<()> {
        Err(AppError::Other("relay unavailable".into()))
    }
}
